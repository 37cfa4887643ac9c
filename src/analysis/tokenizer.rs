use unicode_segmentation::UnicodeSegmentation;

/// Standard Unicode word tokenizer shared by indexing and query compilation,
/// so analyzed field values and query terms agree
#[derive(Debug, Clone)]
pub struct StandardTokenizer {
    pub lowercase: bool,
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            lowercase: true,
            max_token_length: 255,
        }
    }
}

impl StandardTokenizer {
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .filter(|word| word.len() <= self.max_token_length)
            .map(|word| if self.lowercase { word.to_lowercase() } else { word.to_string() })
            .collect()
    }

    /// Normalize a single term without splitting it.
    pub fn normalize(&self, term: &str) -> String {
        if self.lowercase { term.to_lowercase() } else { term.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_lowercases_words() {
        let tokenizer = StandardTokenizer::default();
        assert_eq!(tokenizer.tokenize("Hello, Big World!"), vec!["hello", "big", "world"]);
        assert!(tokenizer.tokenize(" -- ").is_empty());
    }

    #[test]
    fn drops_overlong_tokens() {
        let tokenizer = StandardTokenizer { lowercase: false, max_token_length: 3 };
        assert_eq!(tokenizer.tokenize("abc abcd Ab"), vec!["abc", "Ab"]);
    }
}
