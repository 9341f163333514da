use regex::Regex;
use std::sync::LazyLock;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static ANSWER_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<answer>\s*").unwrap());

static ANSWER_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*</answer>").unwrap());

/// Language the upstream model is asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Arabic,
}

impl Language {
    pub fn directive(self) -> &'static str {
        match self {
            Language::English => " (Please respond in English)",
            Language::Arabic => " (يرجى الرد باللغة العربية)",
        }
    }
}

pub fn strip_tags(input: &str) -> String {
    TAG_PATTERN.replace_all(input, "").into_owned()
}

pub fn collapse_whitespace(input: &str) -> String {
    WHITESPACE_RUN.replace_all(input, " ").trim().to_string()
}

/// Idempotent: `sanitize(&sanitize(s)) == sanitize(s)` for every `s`.
pub fn sanitize(input: &str) -> String {
    collapse_whitespace(&strip_tags(input))
}

pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => input[..idx].to_string(),
        None => input.to_string(),
    }
}

/// Drops `<answer>` / `</answer>` delimiters together with the whitespace
/// hugging them.
pub fn strip_answer_wrapper(input: &str) -> String {
    let opened = ANSWER_OPEN.replace_all(input, "");
    ANSWER_CLOSE.replace_all(&opened, "").into_owned()
}

/// Any ASCII letter wins over Arabic characters, matching how mixed
/// messages were answered before.
pub fn detect_language(message: &str) -> Option<Language> {
    if message.chars().any(|c| c.is_ascii_alphabetic()) {
        Some(Language::English)
    } else if message.chars().any(is_arabic) {
        Some(Language::Arabic)
    } else {
        None
    }
}

fn is_arabic(c: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let cleaned = sanitize("  <p>Drink   water</p>\n\n<b>often</b> ");
        assert_eq!(cleaned, "Drink water often");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let samples = [
            "<think>hmm</think>  Rest \t well ",
            "a < b and c > d",
            "<<nested>> tags",
            "",
            "   ",
            "plain",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "input: {sample:?}");
        }
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("مرحبا", 3), "مرح");
        assert_eq!(truncate_chars("short", 300), "short");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn removes_answer_wrapper() {
        assert_eq!(
            strip_answer_wrapper("<answer> Take rest. </answer>"),
            "Take rest."
        );
        assert_eq!(strip_answer_wrapper("no wrapper"), "no wrapper");
    }

    #[test]
    fn detects_language_from_script() {
        assert_eq!(detect_language("I have a headache"), Some(Language::English));
        assert_eq!(detect_language("عندي صداع"), Some(Language::Arabic));
        assert_eq!(detect_language("عندي headache"), Some(Language::English));
        assert_eq!(detect_language("12345 ?!"), None);
    }
}
