/// Splits document text into passages of at most `chunk_size` characters.
///
/// Text that already fits is kept whole (trimmed). Longer text is packed
/// paragraph by paragraph; a paragraph that is itself too long is cut at the
/// last sentence end found in the second half of the window, or hard-cut at
/// `chunk_size` characters when there is none.
pub fn split_into_passages(text: &str, chunk_size: usize) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || chunk_size == 0 {
        return Vec::new();
    }
    if trimmed.chars().count() <= chunk_size {
        return vec![trimmed.to_string()];
    }

    let mut passages = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for para in trimmed.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let para_len = para.chars().count();

        // +2 for the "\n\n" separator
        if current_len > 0 && current_len + para_len + 2 > chunk_size {
            passages.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if para_len > chunk_size {
            if current_len > 0 {
                passages.push(std::mem::take(&mut current));
                current_len = 0;
            }
            passages.extend(split_long_paragraph(para, chunk_size));
            continue;
        }

        if current_len > 0 {
            current.push_str("\n\n");
            current_len += 2;
        }
        current.push_str(para);
        current_len += para_len;
    }

    if !current.is_empty() {
        passages.push(current);
    }

    passages
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\n' | '。' | '؟' | '！' | '？')
}

fn split_long_paragraph(para: &str, chunk_size: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = para;

    while rest.chars().count() > chunk_size {
        // Byte offsets of the first chunk_size + 1 chars
        let offsets: Vec<(usize, char)> = rest.char_indices().take(chunk_size + 1).collect();

        let cut = offsets[chunk_size / 2..chunk_size]
            .iter()
            .rev()
            .find(|(_, c)| is_sentence_end(*c))
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(offsets[chunk_size].0);

        let (head, tail) = rest.split_at(cut);
        let head = head.trim();
        if !head.is_empty() {
            out.push(head.to_string());
        }
        rest = tail.trim_start();
    }

    let rest = rest.trim();
    if !rest.is_empty() {
        out.push(rest.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_passage() {
        let text = "  Paragraphe 1\n\nParagraphe 2\n\nParagraphe 3\n";
        let passages = split_into_passages(text, 500);
        assert_eq!(passages, vec!["Paragraphe 1\n\nParagraphe 2\n\nParagraphe 3"]);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(split_into_passages("", 500).is_empty());
        assert!(split_into_passages("   \n\n   \n\n   ", 500).is_empty());
    }

    #[test]
    fn test_paragraphs_are_packed() {
        let para = "Phrase de test. ".repeat(10);
        let text = vec![para.trim(); 10].join("\n\n");
        let passages = split_into_passages(&text, 400);

        assert!(passages.len() >= 2);
        for p in &passages {
            assert!(!p.is_empty());
            assert!(p.chars().count() <= 400, "passage too long: {}", p.chars().count());
        }
        // Nothing lost except separators
        let total: usize = passages.iter().map(|p| p.matches("Phrase").count()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_long_paragraph_cut_on_sentence() {
        let long_para = "Ceci est une longue phrase. ".repeat(40);
        let passages = split_into_passages(&long_para, 200);

        assert!(passages.len() >= 2);
        for p in &passages[..passages.len() - 1] {
            assert!(p.ends_with('.'), "expected sentence boundary: {p:?}");
            assert!(p.chars().count() <= 200);
        }
    }

    #[test]
    fn test_multibyte_without_boundaries() {
        let long_para = "日本語".repeat(100);
        let passages = split_into_passages(&long_para, 50);

        assert_eq!(passages.len(), 6);
        assert!(passages.iter().all(|p| p.chars().count() <= 50));
        assert_eq!(passages.concat(), long_para);
    }

    #[test]
    fn test_arabic_question_mark_is_boundary() {
        let long_para = "ما هي مهاراتك؟ ".repeat(20);
        let passages = split_into_passages(&long_para, 60);
        assert!(passages.len() >= 2);
        assert!(passages[0].ends_with('؟'));
    }
}
