//! Token estimation.

/// Characters per token for CJK scripts.
const CJK_CHARS_PER_TOKEN: f64 = 1.2;

/// Characters per token for everything else.
const OTHER_CHARS_PER_TOKEN: f64 = 4.0;

/// Token counter trait for estimating the cost of text.
pub trait TokenCounter: Send + Sync {
    /// Estimate the number of tokens in the given text.
    fn count_tokens(&self, text: &str) -> usize;
}

/// Script-aware character heuristic.
///
/// CJK text tokenizes far denser than Latin text, so the two classes are
/// weighted separately and the sum is rounded up. Never negative, zero for
/// empty input, and never decreasing when text is appended.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl HeuristicTokenCounter {
    pub fn new() -> Self {
        Self
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        let (cjk, other) = text.chars().fold((0usize, 0usize), |(cjk, other), c| {
            if is_cjk(c) {
                (cjk + 1, other)
            } else {
                (cjk, other + 1)
            }
        });
        let estimate = cjk as f64 / CJK_CHARS_PER_TOKEN + other as f64 / OTHER_CHARS_PER_TOKEN;
        estimate.ceil() as usize
    }
}

/// Helper function to estimate tokens with the default counter.
pub fn estimate_tokens(text: &str) -> usize {
    HeuristicTokenCounter.count_tokens(text)
}

/// Han, Hangul and Kana ranges plus CJK punctuation and full-width forms.
fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x11FF     // Hangul Jamo
        | 0x3000..=0x303F   // CJK symbols and punctuation
        | 0x3040..=0x309F   // Hiragana
        | 0x30A0..=0x30FF   // Katakana
        | 0x3130..=0x318F   // Hangul compatibility jamo
        | 0x3400..=0x4DBF   // CJK extension A
        | 0x4E00..=0x9FFF   // CJK unified ideographs
        | 0xAC00..=0xD7AF   // Hangul syllables
        | 0xF900..=0xFAFF   // CJK compatibility ideographs
        | 0xFF00..=0xFFEF   // Half-width and full-width forms
        | 0x20000..=0x2FA1F // CJK extensions B-F and supplement
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_latin() {
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens(&"a".repeat(4000)), 1000);
    }

    #[test]
    fn test_cjk_is_denser() {
        // 12 Hangul syllables -> 10 tokens
        assert_eq!(estimate_tokens("안녕하세요반갑습니다여러"), 10);
        // 6 kanji -> 5 tokens
        assert_eq!(estimate_tokens("日本語の文章"), 5);
        assert!(estimate_tokens("翻訳") > estimate_tokens("ab"));
    }

    #[test]
    fn test_mixed() {
        // 6 CJK chars (5.0) + 4 latin chars (1.0)
        assert_eq!(estimate_tokens("日本語の文章abcd"), 6);
    }

    #[test]
    fn test_monotonic_under_concatenation() {
        let parts = ["Hello ", "世界", "", "x", "こんにちは", " more text"];
        let mut text = String::new();
        let mut last = 0;
        for part in parts {
            text.push_str(part);
            let now = estimate_tokens(&text);
            assert!(now >= last);
            last = now;
        }
    }
}
