//! Keyword extraction for overlap scoring

/// Common English stop words to remove from natural language text
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from",
    "has", "have", "he", "in", "is", "it", "its", "of", "on", "that",
    "the", "to", "was", "will", "with", "does", "do", "did", "can",
    "could", "should", "would", "what", "where", "when", "why", "how",
    "who", "which", "this", "these", "those", "there", "here", "about",
    "into", "not", "but", "or", "my", "your", "our",
];

const MAX_KEYWORDS: usize = 20;

/// Extract lowercase keywords, preserving first-seen order.
///
/// Short words and stop words are dropped; duplicates are removed.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut keywords = Vec::new();

    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
    {
        if seen.insert(word.to_string()) {
            keywords.push(word.to_string());
            if keywords.len() == MAX_KEYWORDS {
                break;
            }
        }
    }

    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_stop_words_and_short_words() {
        let kw = extract_keywords("What is the AI track about?");
        assert_eq!(kw, vec!["track"]);
    }

    #[test]
    fn test_dedupes_preserving_order() {
        let kw = extract_keywords("product management, product strategy");
        assert_eq!(kw, vec!["product", "management", "strategy"]);
    }

    #[test]
    fn test_caps_keyword_count() {
        let text = (0..50)
            .map(|i| format!("keyword{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(extract_keywords(&text).len(), MAX_KEYWORDS);
    }
}
