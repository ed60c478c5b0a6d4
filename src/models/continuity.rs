use crate::utils::tail_chars;

/// Trailing text of the most recently accepted units, fed into the next prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Continuity {
    limit: usize,
    chapter: String,
    subchapter: String,
}

impl Continuity {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            chapter: String::new(),
            subchapter: String::new(),
        }
    }

    pub fn chapter_tail(&self) -> &str {
        &self.chapter
    }

    pub fn subchapter_tail(&self) -> &str {
        &self.subchapter
    }

    /// Clears the sub-chapter tail; the chapter tail carries over.
    pub fn begin_chapter(&mut self) {
        self.subchapter.clear();
    }

    pub fn accept_chapter(&mut self, text: &str) {
        self.chapter = tail_chars(text, self.limit).to_string();
    }

    pub fn accept_subchapter(&mut self, text: &str) {
        self.subchapter = tail_chars(text, self.limit).to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tails_are_bounded() {
        let mut continuity = Continuity::new(5);
        continuity.accept_chapter("abcdefghij");
        assert_eq!(continuity.chapter_tail(), "fghij");
        continuity.accept_subchapter("xyz");
        assert_eq!(continuity.subchapter_tail(), "xyz");
    }

    #[test]
    fn new_chapter_only_resets_subchapter_tail() {
        let mut continuity = Continuity::new(2000);
        continuity.accept_chapter("the end of chapter one");
        continuity.accept_subchapter("the end of sub-chapter 1-3");
        continuity.begin_chapter();
        assert_eq!(continuity.subchapter_tail(), "");
        assert_eq!(continuity.chapter_tail(), "the end of chapter one");
    }
}
