use bit_set::BitSet;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

use crate::domain::DomainStore;
use crate::error::FillError;
use crate::grid_config::{GridConfig, Slot, SlotId};

/// Result from a successful call to `enforce_arc_consistency`, reflecting which words were
/// eliminated from each slot during the call.
#[derive(Debug)]
pub struct ArcConsistencySuccess {
    pub eliminations_by_slot: Vec<BitSet>,
}

/// Result from a failed call to `enforce_arc_consistency`: some slot ran out of options, which
/// means the grid can't be filled.
#[derive(Debug, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub exhausted_slot_id: SlotId,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// FIFO worklist of ordered `(x, y)` arcs. An arc that's already waiting isn't queued twice.
#[derive(Debug)]
struct ArcQueue {
    queue: VecDeque<(SlotId, SlotId)>,
    queued: HashSet<(SlotId, SlotId)>,
}

impl ArcQueue {
    fn with_initial_arcs<Arcs>(arcs: Arcs) -> ArcQueue
    where
        Arcs: IntoIterator<Item = (SlotId, SlotId)>,
    {
        let mut queue = ArcQueue {
            queue: VecDeque::new(),
            queued: HashSet::new(),
        };
        for arc in arcs {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<(SlotId, SlotId)> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(&arc);
        Some(arc)
    }

    fn enqueue(&mut self, arc: (SlotId, SlotId)) {
        if self.queued.insert(arc) {
            self.queue.push_back(arc);
        }
    }
}

/// Every `(slot, neighbor)` pair in the grid, in slot order.
pub fn all_arcs(config: &GridConfig) -> Vec<(SlotId, SlotId)> {
    config
        .slot_configs
        .iter()
        .flat_map(|slot_config| {
            slot_config
                .neighbors
                .iter()
                .map(move |&neighbor| (slot_config.id, neighbor))
        })
        .collect()
}

/// Remove every word whose length doesn't match its slot. Returns how many words were removed in
/// total; a second call always returns 0.
pub fn enforce_node_consistency(domains: &mut DomainStore) -> usize {
    let config = domains.config();
    let mut eliminated = 0;

    for slot_config in &config.slot_configs {
        let wrong_length: BitSet = domains
            .domain(slot_config.id)
            .iter()
            .filter(|&word_id| config.word_list.word(word_id).len() != slot_config.slot.length)
            .collect();

        eliminated += wrong_length.len();
        domains.domain_mut(slot_config.id).difference_with(&wrong_length);
    }

    debug!(eliminated, "node consistency");
    eliminated
}

/// Make `x` arc-consistent with `y`, removing every word of `x` that has no partner in `y` agreeing
/// at their overlap. Returns whether anything was removed.
pub fn revise(domains: &mut DomainStore, x: &Slot, y: &Slot) -> Result<bool, FillError> {
    let config = domains.config();
    let x = config.slot_id(x)?;
    let y = config.slot_id(y)?;
    Ok(!revise_slots(domains, x, y).is_empty())
}

/// Id-based `revise`, returning the set of words it removed from `x`.
pub(crate) fn revise_slots(domains: &mut DomainStore, x: SlotId, y: SlotId) -> BitSet {
    let config = domains.config();

    let (i, j) = match config.overlap(x, y) {
        Some(overlap) => overlap,
        None => return BitSet::new(),
    };

    // Which letters does `y` still offer at the crossing cell?
    let supported: HashSet<char> = domains
        .domain(y)
        .iter()
        .filter_map(|word_id| config.word_list.word(word_id).glyphs.get(j).copied())
        .collect();

    // Decide against a snapshot of `x`'s domain, then apply the removals in one step.
    let unsupported: BitSet = domains
        .domain(x)
        .iter()
        .filter(|&word_id| match config.word_list.word(word_id).glyphs.get(i) {
            Some(glyph) => !supported.contains(glyph),
            None => true,
        })
        .collect();

    domains.domain_mut(x).difference_with(&unsupported);
    unsupported
}

/// Run AC-3 over the given arcs, or over every arc in the grid if none are given. Slots named in
/// `arcs` must belong to the grid; that's checked before any domain is touched.
pub fn enforce_arc_consistency(
    domains: &mut DomainStore,
    arcs: Option<&[(Slot, Slot)]>,
) -> Result<ArcConsistencyResult, FillError> {
    let config = domains.config();

    let arcs: Vec<(SlotId, SlotId)> = match arcs {
        Some(arcs) => arcs
            .iter()
            .map(|(x, y)| Ok((config.slot_id(x)?, config.slot_id(y)?)))
            .collect::<Result<_, FillError>>()?,
        None => all_arcs(config),
    };

    Ok(establish_arc_consistency(domains, arcs))
}

/// Id-based implementation of `enforce_arc_consistency`.
pub(crate) fn establish_arc_consistency<Arcs>(
    domains: &mut DomainStore,
    arcs: Arcs,
) -> ArcConsistencyResult
where
    Arcs: IntoIterator<Item = (SlotId, SlotId)>,
{
    let config = domains.config();
    let mut queue = ArcQueue::with_initial_arcs(arcs);
    let mut eliminations_by_slot: Vec<BitSet> =
        config.slot_configs.iter().map(|_| BitSet::new()).collect();

    while let Some((x, y)) = queue.pop_front() {
        let removed = revise_slots(domains, x, y);
        if removed.is_empty() {
            continue;
        }
        eliminations_by_slot[x].union_with(&removed);

        if domains.domain(x).is_empty() {
            debug!(slot = %config.slot(x), "domain wiped out during arc consistency");
            return Err(ArcConsistencyFailure { exhausted_slot_id: x });
        }

        // Shrinking `x` may have left words in its other neighbors without a partner.
        for &z in config.neighbors(x) {
            if z != y {
                queue.enqueue((z, x));
            }
        }
    }

    debug!(
        eliminated = eliminations_by_slot.iter().map(BitSet::len).sum::<usize>(),
        "arc consistency established"
    );
    Ok(ArcConsistencySuccess { eliminations_by_slot })
}
