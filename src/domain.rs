use bit_set::BitSet;
use std::fmt::{Debug, Formatter};

use crate::error::FillError;
use crate::grid_config::{GridConfig, Slot, SlotId};
use crate::word_list::WordId;

/// The set of words still viable for each slot, stored as a bit set of `WordId`s per slot so that
/// iteration follows word list order. Cloning a store is how search takes a private snapshot.
#[derive(Clone)]
pub struct DomainStore<'a> {
    config: &'a GridConfig,
    domains: Vec<BitSet>,
}

impl Debug for DomainStore<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sizes: Vec<usize> = self.domains.iter().map(BitSet::len).collect();
        f.debug_struct("DomainStore")
            .field("domain_sizes", &sizes)
            .finish()
    }
}

impl PartialEq for DomainStore<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.config, other.config) && self.domains == other.domains
    }
}

impl<'a> DomainStore<'a> {
    /// Seed every slot's domain with the entire word list.
    pub fn new(config: &'a GridConfig) -> DomainStore<'a> {
        let full: BitSet = (0..config.word_list.len()).collect();
        DomainStore {
            config,
            domains: config.slot_configs.iter().map(|_| full.clone()).collect(),
        }
    }

    pub fn config(&self) -> &'a GridConfig {
        self.config
    }

    /// Remove a word from a slot's domain. Removing a word that isn't there (or isn't in the word
    /// list at all) is a no-op; addressing a slot outside the grid is an error.
    pub fn remove(&mut self, slot: &Slot, word: &str) -> Result<bool, FillError> {
        let slot_id = self.config.slot_id(slot)?;
        Ok(match self.config.word_list.word_id(word) {
            Some(word_id) => self.remove_id(slot_id, word_id),
            None => false,
        })
    }

    pub fn contains(&self, slot: &Slot, word: &str) -> Result<bool, FillError> {
        let slot_id = self.config.slot_id(slot)?;
        Ok(self
            .config
            .word_list
            .word_id(word)
            .map_or(false, |word_id| self.contains_id(slot_id, word_id)))
    }

    pub fn is_empty(&self, slot: &Slot) -> Result<bool, FillError> {
        Ok(self.domain(self.config.slot_id(slot)?).is_empty())
    }

    pub fn len(&self, slot: &Slot) -> Result<usize, FillError> {
        Ok(self.domain(self.config.slot_id(slot)?).len())
    }

    /// The words currently in a slot's domain, in word list order.
    pub fn words(&self, slot: &Slot) -> Result<Vec<&'a str>, FillError> {
        let slot_id = self.config.slot_id(slot)?;
        let config = self.config;
        Ok(self.domains[slot_id]
            .iter()
            .map(|word_id| config.word(word_id))
            .collect())
    }

    pub fn domain(&self, slot_id: SlotId) -> &BitSet {
        &self.domains[slot_id]
    }

    pub(crate) fn domain_mut(&mut self, slot_id: SlotId) -> &mut BitSet {
        &mut self.domains[slot_id]
    }

    pub(crate) fn remove_id(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.domains[slot_id].remove(word_id)
    }

    pub(crate) fn contains_id(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.domains[slot_id].contains(word_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::DomainStore;
    use crate::error::FillError;
    use crate::grid_config::{generate_grid_config, Direction, Slot};
    use crate::word_list::WordList;

    #[test]
    fn test_new_store_holds_full_word_list() {
        let a = Slot::new(0, 0, 3, Direction::Across);
        let b = Slot::new(0, 0, 2, Direction::Down);
        let config =
            generate_grid_config(WordList::new(["cat", "dog", "ox"]), &[a, b]).unwrap();
        let domains = DomainStore::new(&config);

        assert_eq!(domains.words(&a).unwrap(), vec!["cat", "dog", "ox"]);
        assert_eq!(domains.len(&b).unwrap(), 3);
        assert!(!domains.is_empty(&b).unwrap());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let a = Slot::new(0, 0, 3, Direction::Across);
        let config = generate_grid_config(WordList::new(["cat", "dog"]), &[a]).unwrap();
        let mut domains = DomainStore::new(&config);

        assert_eq!(domains.remove(&a, "cat"), Ok(true));
        assert_eq!(domains.remove(&a, "cat"), Ok(false));
        assert_eq!(domains.remove(&a, "emu"), Ok(false));
        assert_eq!(domains.contains(&a, "cat"), Ok(false));
        assert_eq!(domains.contains(&a, "dog"), Ok(true));

        assert_eq!(domains.remove(&a, "dog"), Ok(true));
        assert_eq!(domains.is_empty(&a), Ok(true));
    }

    #[test]
    fn test_unknown_slot_is_rejected() {
        let a = Slot::new(0, 0, 3, Direction::Across);
        let config = generate_grid_config(WordList::new(["cat"]), &[a]).unwrap();
        let mut domains = DomainStore::new(&config);

        let stranger = Slot::new(4, 4, 3, Direction::Down);
        assert_eq!(
            domains.remove(&stranger, "cat"),
            Err(FillError::UnknownSlot(stranger))
        );
        assert_eq!(domains.is_empty(&stranger), Err(FillError::UnknownSlot(stranger)));
        assert!(domains.words(&stranger).is_err());
        assert_eq!(domains.len(&a), Ok(1));
    }
}
