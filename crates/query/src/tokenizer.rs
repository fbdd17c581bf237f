use jieba_rs::Jieba;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;

/// Scripts written without spaces between words.
static CJK_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Han}\p{Hiragana}\p{Katakana}ー]+").expect("valid CJK pattern")
});

/// Dictionary segmenter, loaded once.
static JIEBA: LazyLock<Jieba> = LazyLock::new(Jieba::new);

/// Split a question into lowercase search tokens.
///
/// Runs of CJK characters go through jieba's search-mode segmentation, which
/// emits each dictionary word plus the shorter dictionary words inside it.
/// Everything else is split on Unicode word boundaries. Duplicates are
/// removed, first occurrence kept.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |token: &str| {
        let token = token.trim();
        if !token.is_empty() && seen.insert(token.to_string()) {
            tokens.push(token.to_string());
        }
    };

    let mut last = 0;
    for run in CJK_RUN.find_iter(&lowered) {
        for word in lowered[last..run.start()].unicode_words() {
            push(word);
        }
        for word in JIEBA.cut_for_search(run.as_str(), true) {
            push(word);
        }
        last = run.end();
    }
    for word in lowered[last..].unicode_words() {
        push(word);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_words() {
        assert_eq!(
            tokenize("Who founded  OpenAI, and when?"),
            vec!["who", "founded", "openai", "and", "when"]
        );
    }

    #[test]
    fn test_duplicates_removed() {
        assert_eq!(tokenize("rust Rust RUST"), vec!["rust"]);
    }

    #[test]
    fn test_cjk_search_mode_words() {
        let tokens = tokenize("北京大学");
        for expected in ["北京", "大学", "北京大学"] {
            assert!(tokens.contains(&expected.to_string()), "missing {}", expected);
        }
        assert!(!tokens.contains(&"京大学".to_string()));
    }

    #[test]
    fn test_single_cjk_word_inside_sentence() {
        let tokens = tokenize("我们喜欢猫");
        assert!(tokens.contains(&"猫".to_string()));
        assert!(tokens.contains(&"喜欢".to_string()));
    }

    #[test]
    fn test_single_cjk_char_kept() {
        assert_eq!(tokenize("猫"), vec!["猫"]);
    }

    #[test]
    fn test_mixed_scripts() {
        let tokens = tokenize("GraphRAG是什么");
        assert_eq!(tokens[0], "graphrag");
        assert!(tokens.contains(&"什么".to_string()));
    }

    #[test]
    fn test_empty_and_punctuation() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("?!  ...").is_empty());
    }
}
