use std::sync::LazyLock;

use regex::Regex;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid filename pattern"));

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The last `limit` characters of `text`, never splitting a UTF-8 sequence.
pub fn tail_chars(text: &str, limit: usize) -> &str {
    if limit == 0 {
        return "";
    }
    match text.char_indices().rev().nth(limit - 1) {
        Some((index, _)) => &text[index..],
        None => text,
    }
}

/// Drop `<` and `>`, which models tend to echo from the outline template.
pub fn strip_brackets(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '<' | '>')).collect()
}

/// Reflow text into lines of at most `width` characters, breaking on word
/// boundaries. Words longer than `width` get a line of their own.
pub fn wrap_words(text: &str, width: usize) -> String {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();
        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

/// Filesystem-safe file stem derived from a book title.
pub fn output_stem(title: &str) -> String {
    let stem = UNSAFE_FILENAME_CHARS.replace_all(title.trim(), "_");
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        format!("book_{}", uuid::Uuid::new_v4().simple())
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_respects_char_boundaries() {
        assert_eq!(tail_chars("hello", 3), "llo");
        assert_eq!(tail_chars("hello", 10), "hello");
        assert_eq!(tail_chars("héllo wörld", 5), "wörld");
        assert_eq!(tail_chars("第一章开始", 2), "开始");
        assert_eq!(tail_chars("abc", 0), "");
    }

    #[test]
    fn strip_brackets_is_idempotent() {
        let once = strip_brackets("<\nChapter: 1: <Intro>\n>");
        assert_eq!(once, "\nChapter: 1: Intro\n");
        assert_eq!(strip_brackets(&once), once);
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(wrap_words("aa bb cc dd", 5), "aa bb\ncc dd");
        assert_eq!(wrap_words("tiny enormousword x", 6), "tiny\nenormousword\nx");
        assert_eq!(wrap_words("", 10), "");
    }

    #[test]
    fn output_stem_replaces_unsafe_characters() {
        assert_eq!(output_stem("The Salt Road: Part 1"), "The_Salt_Road_Part_1");
        assert!(output_stem("???").starts_with("book_"));
    }

    #[test]
    fn word_count_splits_on_any_whitespace() {
        assert_eq!(word_count("  one\ttwo\n\nthree  "), 3);
        assert_eq!(word_count(""), 0);
    }
}
