use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use crate::MAX_SLOT_LENGTH;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// A struct representing a word that can be chosen for a given slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    fn new(string: String) -> Word {
        let glyphs = string.chars().collect();
        Word { string, glyphs }
    }

    /// Length in characters, which is what gets compared against slot lengths.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// The candidate vocabulary. Words are deduplicated on construction and keep the order in which they
/// were first seen, so a `WordId` is stable for the lifetime of the list.
#[derive(Clone, Default)]
pub struct WordList {
    pub words: Vec<Word>,
    word_ids_by_string: HashMap<String, WordId>,
}

impl Debug for WordList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("words", &format!("({} entries)", self.words.len()))
            .finish()
    }
}

impl WordList {
    /// Build a word list from strings exactly as given. No case folding or trimming happens here.
    pub fn new<I, S>(words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut word_list = WordList::default();

        for word in words {
            let word: String = word.into();
            if word_list.word_ids_by_string.contains_key(&word) {
                continue;
            }
            word_list
                .word_ids_by_string
                .insert(word.clone(), word_list.words.len());
            word_list.words.push(Word::new(word));
        }

        word_list
    }

    /// Parse a word list file with one entry per line. Blank lines are skipped and entries are
    /// upper-cased.
    pub fn parse(contents: &str) -> WordList {
        WordList::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_uppercase),
        )
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.word_ids_by_string.get(word).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::WordList;

    #[test]
    fn test_new_deduplicates_and_keeps_first_position() {
        let word_list = WordList::new(["cat", "dog", "cat", "emu"]);

        assert_eq!(word_list.len(), 3);
        assert_eq!(word_list.word_id("cat"), Some(0));
        assert_eq!(word_list.word_id("dog"), Some(1));
        assert_eq!(word_list.word_id("emu"), Some(2));
        assert_eq!(word_list.word_id("CAT"), None);
    }

    #[test]
    fn test_parse_normalizes_lines() {
        let word_list = WordList::parse("  cat\n\nDog \r\ncat\n   \nbird\n");

        let strings: Vec<&str> = word_list.words.iter().map(|w| w.string.as_str()).collect();
        assert_eq!(strings, vec!["CAT", "DOG", "BIRD"]);
    }

    #[test]
    fn test_word_length_counts_chars() {
        let word_list = WordList::new(["año", "bob"]);

        assert_eq!(word_list.word(0).len(), 3);
        assert_eq!(word_list.word(0).glyphs[1], 'ñ');
        assert_eq!(word_list.word(1).len(), 3);
    }
}
