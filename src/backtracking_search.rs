use bit_set::BitSet;
use instant::{Duration, Instant};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, trace, warn};

use crate::arc_consistency::{all_arcs, enforce_node_consistency, establish_arc_consistency};
use crate::domain::DomainStore;
use crate::error::FillError;
use crate::grid_config::{Choice, GridConfig, Slot, SlotId};
use crate::options::FillOptions;
use crate::word_list::WordId;
use crate::MAX_SLOT_LENGTH;

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub eliminated_words: usize,
    pub initial_consistency_time: Duration,
    pub duration: Duration,
}

/// A partial or complete mapping from slots to words. Search never mutates an assignment it has
/// handed to another frame; extending one produces a new copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    word_ids: Vec<Option<WordId>>,
}

impl Assignment {
    /// An assignment with no slots filled.
    pub fn new(config: &GridConfig) -> Assignment {
        Assignment {
            word_ids: vec![None; config.slot_count()],
        }
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.word_ids.get(slot_id).copied().flatten()
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.get(slot_id).is_some()
    }

    pub fn assigned_count(&self) -> usize {
        self.word_ids.iter().flatten().count()
    }

    /// Assigned `(slot, word)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.word_ids
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| (slot_id, word_id)))
    }

    /// Copy this assignment, extended (or overridden) with one more choice.
    pub(crate) fn with_choice(&self, choice: Choice) -> Assignment {
        let mut word_ids = self.word_ids.clone();
        word_ids[choice.slot_id] = Some(choice.word_id);
        Assignment { word_ids }
    }

    /// Assign a word to a slot by identity. The slot has to belong to the grid and the word has to
    /// be in its word list; nothing else is checked here.
    pub fn assign(&mut self, config: &GridConfig, slot: &Slot, word: &str) -> Result<(), FillError> {
        let slot_id = config.slot_id(slot)?;
        if slot_id >= self.word_ids.len() {
            return Err(FillError::UnknownSlot(*slot));
        }
        let word_id = config
            .word_list
            .word_id(word)
            .ok_or_else(|| FillError::UnknownWord(word.to_string()))?;
        self.word_ids[slot_id] = Some(word_id);
        Ok(())
    }

    pub fn choices(&self) -> Vec<Choice> {
        self.iter()
            .map(|(slot_id, word_id)| Choice { slot_id, word_id })
            .collect()
    }
}

/// A struct representing the results of a fill operation.
#[derive(Debug, Clone)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub choices: Vec<Choice>,
}

impl FillSuccess {
    /// The fill as `(slot, word)` pairs, in slot order.
    pub fn entries<'c>(&self, config: &'c GridConfig) -> Vec<(Slot, &'c str)> {
        self.choices
            .iter()
            .map(|choice| (*config.slot(choice.slot_id), config.word(choice.word_id)))
            .collect()
    }
}

/// Why a fill attempt came back without a fill. `Unsatisfiable` is the ordinary "no solution"
/// answer; the other two only happen when the matching option is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillFailure {
    Unsatisfiable,
    Timeout,
    Abort,
}

/// Is every slot in the grid assigned?
pub fn is_complete(config: &GridConfig, assignment: &Assignment) -> bool {
    config
        .slot_configs
        .iter()
        .all(|slot_config| assignment.is_assigned(slot_config.id))
}

/// Check an assignment against every constraint: each word fits its slot, no word is used twice
/// and crossing slots agree on their shared letter. An assignment made for a different grid is
/// never consistent.
pub fn is_consistent(config: &GridConfig, assignment: &Assignment) -> bool {
    if assignment.word_ids.len() != config.slot_count() {
        return false;
    }

    let mut used_word_ids: HashSet<WordId> = HashSet::with_capacity(assignment.assigned_count());

    for (slot_id, word_id) in assignment.iter() {
        if word_id >= config.word_list.len() {
            return false;
        }
        let word = config.word_list.word(word_id);

        if word.len() != config.slot(slot_id).length {
            return false;
        }

        if !used_word_ids.insert(word_id) {
            return false;
        }

        for &neighbor_id in config.neighbors(slot_id) {
            let neighbor_word_id = match assignment.get(neighbor_id) {
                Some(neighbor_word_id) => neighbor_word_id,
                None => continue,
            };
            if let Some((i, j)) = config.overlap(slot_id, neighbor_id) {
                let neighbor_word = config.word_list.word(neighbor_word_id);
                if word.glyphs.get(i) != neighbor_word.glyphs.get(j) {
                    return false;
                }
            }
        }
    }

    true
}

/// Choose the unassigned slot with the fewest remaining options, preferring the one with the most
/// neighbors on a tie. Earlier slots win any remaining ties. Returns `None` once everything is
/// assigned.
pub fn select_unassigned_slot(domains: &DomainStore, assignment: &Assignment) -> Option<SlotId> {
    let config = domains.config();
    let mut best: Option<(SlotId, usize, usize)> = None;

    for slot_config in &config.slot_configs {
        if assignment.is_assigned(slot_config.id) {
            continue;
        }

        let remaining = domains.domain(slot_config.id).len();
        let degree = slot_config.neighbors.len();

        let is_better = match best {
            None => true,
            Some((_, best_remaining, best_degree)) => {
                remaining < best_remaining || (remaining == best_remaining && degree > best_degree)
            }
        };
        if is_better {
            best = Some((slot_config.id, remaining, degree));
        }
    }

    best.map(|(slot_id, _, _)| slot_id)
}

/// Order a slot's options by how many words they would rule out of unassigned crossing slots,
/// fewest first. Equal counts keep word list order.
pub fn order_domain_values(
    domains: &DomainStore,
    slot_id: SlotId,
    assignment: &Assignment,
) -> Vec<WordId> {
    let config = domains.config();

    // For each unassigned crossing, tally the letters its options put at the shared cell.
    let crossing_tallies: SmallVec<[(usize, usize, HashMap<char, usize>); MAX_SLOT_LENGTH]> = config
        .neighbors(slot_id)
        .iter()
        .filter(|&&neighbor_id| !assignment.is_assigned(neighbor_id))
        .filter_map(|&neighbor_id| {
            let (i, j) = config.overlap(slot_id, neighbor_id)?;
            let neighbor_domain = domains.domain(neighbor_id);
            let mut letter_counts: HashMap<char, usize> = HashMap::new();
            for word_id in neighbor_domain {
                if let Some(&glyph) = config.word_list.word(word_id).glyphs.get(j) {
                    *letter_counts.entry(glyph).or_insert(0) += 1;
                }
            }
            Some((i, neighbor_domain.len(), letter_counts))
        })
        .collect();

    let mut ranked: Vec<(WordId, usize)> = domains
        .domain(slot_id)
        .iter()
        .map(|word_id| {
            let word = config.word_list.word(word_id);
            let conflicts = crossing_tallies
                .iter()
                .map(|(i, option_count, letter_counts)| {
                    let compatible = word
                        .glyphs
                        .get(*i)
                        .and_then(|glyph| letter_counts.get(glyph))
                        .copied()
                        .unwrap_or(0);
                    option_count - compatible
                })
                .sum();
            (word_id, conflicts)
        })
        .collect();

    // `sort_by_key` is stable, which is what keeps ties in word list order.
    ranked.sort_by_key(|&(_, conflicts)| conflicts);
    ranked.into_iter().map(|(word_id, _)| word_id).collect()
}

/// One level of the search: the assignment it extends, the slot it's filling and the candidate
/// words it still has to try.
struct SearchFrame<'a> {
    assignment: Assignment,
    slot_id: SlotId,
    values: Vec<WordId>,
    next_value_idx: usize,

    /// This branch's private copy of the domains, only present with forward checking.
    pruned_domains: Option<DomainStore<'a>>,
}

enum Opened<'a> {
    Frame(SearchFrame<'a>),
    Complete(Assignment),
}

impl<'a> SearchFrame<'a> {
    /// Pick the next slot to fill for `assignment` and rank its options, or report that there is
    /// nothing left to fill.
    fn open(
        base_domains: &DomainStore<'a>,
        assignment: Assignment,
        pruned_domains: Option<DomainStore<'a>>,
    ) -> Opened<'a> {
        let domains = pruned_domains.as_ref().unwrap_or(base_domains);

        let slot_id = match select_unassigned_slot(domains, &assignment) {
            Some(slot_id) => slot_id,
            None => return Opened::Complete(assignment),
        };
        let values = order_domain_values(domains, slot_id, &assignment);

        Opened::Frame(SearchFrame {
            assignment,
            slot_id,
            values,
            next_value_idx: 0,
            pruned_domains,
        })
    }
}

/// Copy `domains` and drop everything the newest choice rules out for the slots that are still
/// open: the chosen word itself, and words that disagree with it at a crossing. Returns `None` if
/// that leaves some open slot with no options.
fn forward_check<'a>(
    domains: &DomainStore<'a>,
    assignment: &Assignment,
    choice: Choice,
) -> Option<DomainStore<'a>> {
    let config = domains.config();
    let chosen_word = config.word_list.word(choice.word_id);
    let mut pruned = domains.clone();

    for slot_config in &config.slot_configs {
        let slot_id = slot_config.id;
        if slot_id == choice.slot_id || assignment.is_assigned(slot_id) {
            continue;
        }

        let domain = pruned.domain_mut(slot_id);
        domain.remove(choice.word_id);

        if let Some((i, j)) = config.overlap(slot_id, choice.slot_id) {
            let letter = chosen_word.glyphs.get(j);
            let incompatible: BitSet = domain
                .iter()
                .filter(|&word_id| config.word_list.word(word_id).glyphs.get(i) != letter)
                .collect();
            domain.difference_with(&incompatible);
        }

        if domain.is_empty() {
            return None;
        }
    }

    Some(pruned)
}

/// Depth-first search for a complete, consistent extension of `assignment`. The first complete
/// assignment found is returned as-is. The recursion is kept on an explicit stack of frames, so
/// grid size doesn't bound it by the call stack; popping an exhausted frame is the equivalent of a
/// recursive call returning failure.
pub fn backtrack<'a>(
    domains: &DomainStore<'a>,
    assignment: Assignment,
    options: &FillOptions,
    statistics: &mut Statistics,
) -> Result<Assignment, FillFailure> {
    let config = domains.config();
    let deadline = options.timeout.map(|timeout| Instant::now() + timeout);

    if !is_consistent(config, &assignment) {
        return Err(FillFailure::Unsatisfiable);
    }
    if is_complete(config, &assignment) {
        return Ok(assignment);
    }

    let mut stack: Vec<SearchFrame<'a>> = Vec::with_capacity(config.slot_count());
    match SearchFrame::open(domains, assignment, None) {
        Opened::Frame(frame) => stack.push(frame),
        Opened::Complete(assignment) => return Ok(assignment),
    }

    loop {
        statistics.states += 1;

        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Err(FillFailure::Timeout);
            }
        }
        if let Some(abort_rx) = options.abort_rx {
            if abort_rx.try_recv().is_ok() {
                return Err(FillFailure::Abort);
            }
        }

        let frame = match stack.last_mut() {
            Some(frame) => frame,
            None => return Err(FillFailure::Unsatisfiable),
        };

        let next_value = frame.values.get(frame.next_value_idx).copied();
        let word_id = match next_value {
            Some(word_id) => word_id,
            None => {
                // Every option for this slot failed, so this branch is dead.
                stack.pop();
                statistics.backtracks += 1;
                continue;
            }
        };
        frame.next_value_idx += 1;

        let choice = Choice {
            slot_id: frame.slot_id,
            word_id,
        };
        let candidate = frame.assignment.with_choice(choice);

        trace!(
            depth = candidate.assigned_count(),
            slot = %config.slot(choice.slot_id),
            word = config.word(choice.word_id),
            "trying word"
        );

        if !is_consistent(config, &candidate) {
            continue;
        }

        let pruned_domains = if options.forward_checking {
            let frame_domains = frame.pruned_domains.as_ref().unwrap_or(domains);
            match forward_check(frame_domains, &candidate, choice) {
                Some(pruned) => Some(pruned),
                None => continue,
            }
        } else {
            None
        };

        match SearchFrame::open(domains, candidate, pruned_domains) {
            Opened::Frame(next_frame) => stack.push(next_frame),
            Opened::Complete(assignment) => return Ok(assignment),
        }
    }
}

/// Search for a valid fill for the given grid: establish node and arc consistency, then backtrack.
pub fn find_fill(config: &GridConfig, options: &FillOptions) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();
    let mut statistics = Statistics::default();

    let mut domains = DomainStore::new(config);
    statistics.eliminated_words += enforce_node_consistency(&mut domains);

    match establish_arc_consistency(&mut domains, all_arcs(config)) {
        Ok(success) => {
            statistics.eliminated_words += success
                .eliminations_by_slot
                .iter()
                .map(BitSet::len)
                .sum::<usize>();
        }
        Err(failure) => {
            debug!(
                slot = %config.slot(failure.exhausted_slot_id),
                "no fill possible after initial arc consistency"
            );
            return Err(FillFailure::Unsatisfiable);
        }
    }
    statistics.initial_consistency_time = start.elapsed();

    let assignment = match backtrack(&domains, Assignment::new(config), options, &mut statistics) {
        Ok(assignment) => assignment,
        Err(failure) => {
            match failure {
                FillFailure::Unsatisfiable => {
                    debug!(states = statistics.states, "search space exhausted")
                }
                FillFailure::Timeout | FillFailure::Abort => {
                    warn!(?failure, states = statistics.states, "fill interrupted")
                }
            }
            return Err(failure);
        }
    };

    statistics.duration = start.elapsed();
    info!(
        states = statistics.states,
        backtracks = statistics.backtracks,
        duration = ?statistics.duration,
        "found fill"
    );

    Ok(FillSuccess {
        statistics,
        choices: assignment.choices(),
    })
}
