//! LLM-backed translation that leaves a protected name untouched.
use crate::llm::{Generator, LlmError};

/// Token that stands in for `name` while the text goes through the LLM.
///
/// `"Issalmou Adaaiche"` becomes `<<ISSALMOU_ADAAICHE>>`.
pub fn placeholder_for(name: &str) -> String {
    let token: String = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase();
    format!("<<{token}>>")
}

/// Instruction sent to the LLM for translating `text` into `target_lang`.
pub fn translation_prompt(text: &str, target_lang: &str) -> String {
    format!("Traduire le texte suivant en {target_lang} sans rien modifier sauf traduire le reste :\n{text}")
}

/// Translates `text` into `target_lang` (a French language name such as
/// `"français"`), keeping every occurrence of `protected_name` as is.
pub async fn translate_text(
    generator: &dyn Generator,
    text: &str,
    target_lang: &str,
    protected_name: &str,
) -> Result<String, LlmError> {
    let name = protected_name.trim();
    if name.is_empty() {
        let out = generator.generate(&translation_prompt(text, target_lang)).await?;
        return Ok(out.trim().to_string());
    }

    let placeholder = placeholder_for(name);
    let protected = text.replace(name, &placeholder);

    let out = generator
        .generate(&translation_prompt(&protected, target_lang))
        .await?;

    Ok(out.replace(&placeholder, name).trim().to_string())
}
