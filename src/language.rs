//! Language detection for incoming questions.
//!
//! Detectors return ISO 639-1 codes; [`language_name`] turns a code into the
//! French language name used in translation prompts.

use tracing::debug;

/// Name used when the language is unknown or undetected.
pub const DEFAULT_LANGUAGE: &str = "français";

/// Codes understood by the chatbot and their French names.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("af", "afrikaans"),
    ("ar", "arabe"),
    ("bg", "bulgare"),
    ("bn", "bengali"),
    ("ca", "catalan"),
    ("cs", "tchèque"),
    ("da", "danois"),
    ("de", "allemand"),
    ("el", "grec"),
    ("en", "anglais"),
    ("es", "espagnol"),
    ("et", "estonien"),
    ("fa", "persan"),
    ("fi", "finnois"),
    ("fr", "français"),
    ("he", "hébreu"),
    ("hi", "hindi"),
    ("hr", "croate"),
    ("hu", "hongrois"),
    ("id", "indonésien"),
    ("it", "italien"),
    ("ja", "japonais"),
    ("ka", "géorgien"),
    ("ko", "coréen"),
    ("lt", "lituanien"),
    ("lv", "letton"),
    ("mk", "macédonien"),
    ("ms", "malais"),
    ("nb", "norvégien"),
    ("nl", "néerlandais"),
    ("pl", "polonais"),
    ("pt", "portugais"),
    ("ro", "roumain"),
    ("ru", "russe"),
    ("sk", "slovaque"),
    ("sl", "slovène"),
    ("sv", "suédois"),
    ("sw", "swahili"),
    ("ta", "tamoul"),
    ("th", "thaï"),
    ("tr", "turc"),
    ("uk", "ukrainien"),
    ("ur", "ourdou"),
    ("vi", "vietnamien"),
    ("zh", "chinois"),
];

/// French name of the language with ISO 639-1 `code`, or [`DEFAULT_LANGUAGE`].
pub fn language_name(code: Option<&str>) -> &'static str {
    code.and_then(|c| {
        let c = c.trim().to_ascii_lowercase();
        LANGUAGE_NAMES
            .iter()
            .find(|(k, _)| *k == c)
            .map(|(_, name)| *name)
    })
    .unwrap_or(DEFAULT_LANGUAGE)
}

pub trait LanguageDetector: Send + Sync {
    /// ISO 639-1 code of `text`, if it can be told.
    fn detect(&self, text: &str) -> Option<String>;
}

/// Detections below this confidence are discarded.
///
/// whatlang's confidence grows with text length, so one-word greetings and
/// short questions in close Latin-script languages fall under it and are
/// treated as the default language.
pub const MIN_CONFIDENCE: f64 = 0.5;

/// Statistical detector backed by `whatlang`.
///
/// Detection runs over every language whatlang knows; languages without a
/// name here come back as `None` rather than as their closest named neighbour.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        let info = whatlang::detect(text)?;
        if info.confidence() < MIN_CONFIDENCE {
            debug!(
                "Ignoring {} detection with confidence {:.2}",
                info.lang().code(),
                info.confidence()
            );
            return None;
        }
        iso_639_1(info.lang().code()).map(str::to_string)
    }
}

/// A detector that always answers the same thing.
#[derive(Debug, Default, Clone)]
pub struct FixedDetector(pub Option<String>);

impl FixedDetector {
    pub fn new(code: &str) -> Self {
        Self(Some(code.to_string()))
    }
}

impl LanguageDetector for FixedDetector {
    fn detect(&self, _text: &str) -> Option<String> {
        self.0.clone()
    }
}

/// Maps whatlang's ISO 639-3 codes to ISO 639-1.
fn iso_639_1(code: &str) -> Option<&'static str> {
    let short = match code {
        "afr" => "af",
        "ara" | "arb" => "ar",
        "bul" => "bg",
        "ben" => "bn",
        "cat" => "ca",
        "ces" => "cs",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "spa" => "es",
        "est" => "et",
        "pes" | "fas" => "fa",
        "fin" => "fi",
        "fra" => "fr",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "ind" => "id",
        "ita" => "it",
        "jpn" => "ja",
        "kat" => "ka",
        "kor" => "ko",
        "lit" => "lt",
        "lav" => "lv",
        "mkd" => "mk",
        "msa" | "zsm" => "ms",
        "nob" => "nb",
        "nld" => "nl",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "slk" => "sk",
        "slv" => "sl",
        "swe" => "sv",
        "swa" | "swh" => "sw",
        "tam" => "ta",
        "tha" => "th",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "vie" => "vi",
        "cmn" | "zho" => "zh",
        _ => return None,
    };
    Some(short)
}
