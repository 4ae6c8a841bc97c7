use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Debug, Formatter};

use crate::error::FillError;
use crate::word_list::{WordId, WordList};
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given slot, based on its index in the GridConfig's `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed (row, column) coords for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// The identity of a slot: where it starts, how long it is and which way it runs. Two slots are the
/// same slot iff all four fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub row: usize,
    pub col: usize,
    pub length: usize,
    pub direction: Direction,
}

impl Slot {
    pub fn new(row: usize, col: usize, length: usize, direction: Direction) -> Slot {
        Slot { row, col, length, direction }
    }

    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| match self.direction {
            Direction::Across => (self.row, self.col + cell_idx),
            Direction::Down => (self.row + cell_idx, self.col),
        })
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            Direction::Across => "across",
            Direction::Down => "down",
        };
        write!(f, "({}, {}) {} {}", self.row, self.col, direction, self.length)
    }
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub slot: Slot,

    /// One entry per cell; `None` where no other slot passes through the cell.
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,

    /// Distinct crossing slot ids, in the order of the cells they cross.
    pub neighbors: SmallVec<[SlotId; MAX_SLOT_LENGTH]>,
}

/// A choice of word for a given slot, either during search or as part of a finished fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A struct representing the aspects of a grid that are static during filling: its geometry, its
/// slots and the vocabulary that domains are drawn from.
pub struct GridConfig {
    pub width: usize,
    pub height: usize,

    /// Row-major flags for which cells can hold a letter.
    pub cells: Vec<bool>,

    pub slot_configs: Vec<SlotConfig>,
    pub word_list: WordList,
    slot_ids_by_slot: HashMap<Slot, SlotId>,
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("slot_configs", &self.slot_configs)
            .field("word_list", &self.word_list)
            .finish()
    }
}

impl GridConfig {
    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    pub fn slot(&self, slot_id: SlotId) -> &Slot {
        &self.slot_configs[slot_id].slot
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slot_configs.iter().map(|slot_config| &slot_config.slot)
    }

    /// Resolve a slot identity to its id, failing if the slot doesn't belong to this grid.
    pub fn slot_id(&self, slot: &Slot) -> Result<SlotId, FillError> {
        self.slot_ids_by_slot
            .get(slot)
            .copied()
            .ok_or(FillError::UnknownSlot(*slot))
    }

    /// The local indices `(i, j)` at which character `i` of slot `a` shares a cell with character
    /// `j` of slot `b`, or `None` if they don't cross.
    pub fn overlap(&self, a: SlotId, b: SlotId) -> Option<(usize, usize)> {
        if a == b {
            return None;
        }
        self.slot_configs[a]
            .crossings
            .iter()
            .enumerate()
            .find_map(|(cell_idx, crossing)| match crossing {
                Some(crossing) if crossing.other_slot_id == b => {
                    Some((cell_idx, crossing.other_slot_cell))
                }
                _ => None,
            })
    }

    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.slot_configs[slot_id].neighbors
    }

    pub fn is_open(&self, (row, col): GridCoord) -> bool {
        row < self.height && col < self.width && self.cells[row * self.width + col]
    }

    pub fn word(&self, word_id: WordId) -> &str {
        &self.word_list.word(word_id).string
    }
}

/// Build a GridConfig from an explicit list of slots. The grid is sized to fit the slots, and the
/// only open cells are the ones some slot passes through.
pub fn generate_grid_config(word_list: WordList, entries: &[Slot]) -> Result<GridConfig, FillError> {
    let mut width = 0;
    let mut height = 0;
    for entry in entries {
        for (row, col) in entry.cell_coords() {
            width = width.max(col + 1);
            height = height.max(row + 1);
        }
    }

    let mut cells = vec![false; width * height];
    for entry in entries {
        for (row, col) in entry.cell_coords() {
            cells[row * width + col] = true;
        }
    }

    build_grid_config(word_list, width, height, cells, entries)
}

/// Generate a grid config from a structure template, with `_` or `.` representing open cells and
/// anything else representing blocks. Short rows and blank rows are padded with blocks.
pub fn generate_grid_config_from_template_string(
    word_list: WordList,
    template: &str,
) -> Result<GridConfig, FillError> {
    // Trailing whitespace and surrounding blank lines are dropped, along with any indentation
    // common to every row. Anything else, including a space inside the grid, is a block.
    let lines: Vec<&str> = template.lines().map(str::trim_end).collect();
    let lines = match (
        lines.iter().position(|line| !line.is_empty()),
        lines.iter().rposition(|line| !line.is_empty()),
    ) {
        (Some(first), Some(last)) => &lines[first..=last],
        _ => return Err(FillError::EmptyTemplate),
    };

    let is_indent = |c: char| c == ' ' || c == '\t';
    let indent = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.len() - line.trim_start_matches(is_indent).len())
        .min()
        .unwrap_or(0);

    let template: Vec<Vec<char>> = lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or("").chars().collect())
        .collect();

    let height = template.len();
    let width = template.iter().map(|line| line.len()).max().unwrap_or(0);

    let mut cells = vec![false; width * height];
    for (row, line) in template.iter().enumerate() {
        for (col, &cell) in line.iter().enumerate() {
            cells[row * width + col] = cell == '_' || cell == '.';
        }
    }

    // Find every maximal run of open cells along one axis. `outer` is the row for across runs and
    // the column for down runs.
    let runs = |outer_len: usize, inner_len: usize, is_open: &dyn Fn(usize, usize) -> bool| {
        let mut result: Vec<(usize, usize, usize)> = vec![];
        for outer in 0..outer_len {
            let mut run_start: Option<usize> = None;
            for inner in 0..=inner_len {
                let open = inner < inner_len && is_open(outer, inner);
                match (open, run_start) {
                    (true, None) => run_start = Some(inner),
                    (false, Some(start)) => {
                        if inner - start > 1 {
                            result.push((outer, start, inner - start));
                        }
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }
        result
    };

    let mut entries: Vec<Slot> = vec![];

    for (row, col, length) in runs(height, width, &|row, col| cells[row * width + col]) {
        entries.push(Slot::new(row, col, length, Direction::Across));
    }
    for (col, row, length) in runs(width, height, &|col, row| cells[row * width + col]) {
        entries.push(Slot::new(row, col, length, Direction::Down));
    }

    build_grid_config(word_list, width, height, cells, &entries)
}

fn build_grid_config(
    word_list: WordList,
    width: usize,
    height: usize,
    cells: Vec<bool>,
    entries: &[Slot],
) -> Result<GridConfig, FillError> {
    let mut slot_ids_by_slot: HashMap<Slot, SlotId> = HashMap::with_capacity(entries.len());

    // Build a map from cell location to the slots passing through it, which we can then use to
    // calculate crossings.
    let mut entries_by_loc: HashMap<GridCoord, Vec<(SlotId, usize)>> = HashMap::new();

    for (slot_id, entry) in entries.iter().enumerate() {
        if entry.length == 0 {
            return Err(FillError::InvalidGrid(format!("slot {entry} has no cells")));
        }
        if slot_ids_by_slot.insert(*entry, slot_id).is_some() {
            return Err(FillError::InvalidGrid(format!("slot {entry} appears twice")));
        }

        for (cell_idx, loc) in entry.cell_coords().enumerate() {
            let slots_at_loc = entries_by_loc.entry(loc).or_default();
            if slots_at_loc
                .iter()
                .any(|&(other_slot_id, _)| entries[other_slot_id].direction == entry.direction)
            {
                return Err(FillError::InvalidGrid(format!(
                    "parallel slots share the cell at ({}, {})",
                    loc.0, loc.1
                )));
            }
            // With only perpendicular slots allowed, a cell never holds more than two.
            slots_at_loc.push((slot_id, cell_idx));
        }
    }

    let slot_configs = entries
        .iter()
        .enumerate()
        .map(|(slot_id, entry)| {
            let crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]> = entry
                .cell_coords()
                .map(|loc| {
                    entries_by_loc[&loc]
                        .iter()
                        .find(|&&(other_slot_id, _)| other_slot_id != slot_id)
                        .map(|&(other_slot_id, other_slot_cell)| Crossing {
                            other_slot_id,
                            other_slot_cell,
                        })
                })
                .collect();

            let mut neighbors: SmallVec<[SlotId; MAX_SLOT_LENGTH]> = SmallVec::new();
            for crossing in crossings.iter().flatten() {
                if !neighbors.contains(&crossing.other_slot_id) {
                    neighbors.push(crossing.other_slot_id);
                }
            }

            SlotConfig {
                id: slot_id,
                slot: *entry,
                crossings,
                neighbors,
            }
        })
        .collect();

    Ok(GridConfig {
        width,
        height,
        cells,
        slot_configs,
        word_list,
        slot_ids_by_slot,
    })
}

#[cfg(test)]
mod tests {
    use crate::error::FillError;
    use crate::grid_config::{
        generate_grid_config, generate_grid_config_from_template_string, Direction, Slot,
    };
    use crate::word_list::WordList;

    /// #___#
    /// #_#_#
    /// _____
    /// #_#_#
    #[test]
    fn test_template_slots_and_overlaps() {
        let config = generate_grid_config_from_template_string(
            WordList::default(),
            "
            #___#
            #_#_#
            _____
            #_#_#
            ",
        )
        .expect("failed to parse template");

        assert_eq!(config.width, 5);
        assert_eq!(config.height, 4);

        let slots: Vec<Slot> = config.slots().copied().collect();
        assert_eq!(
            slots,
            vec![
                Slot::new(0, 1, 3, Direction::Across),
                Slot::new(2, 0, 5, Direction::Across),
                Slot::new(0, 1, 4, Direction::Down),
                Slot::new(0, 3, 4, Direction::Down),
            ]
        );

        assert_eq!(config.overlap(0, 2), Some((0, 0)));
        assert_eq!(config.overlap(2, 0), Some((0, 0)));
        assert_eq!(config.overlap(0, 3), Some((2, 0)));
        assert_eq!(config.overlap(3, 0), Some((0, 2)));
        assert_eq!(config.overlap(1, 2), Some((1, 2)));
        assert_eq!(config.overlap(1, 3), Some((3, 2)));
        assert_eq!(config.overlap(0, 1), None);
        assert_eq!(config.overlap(2, 3), None);
        assert_eq!(config.overlap(0, 0), None);

        assert_eq!(config.neighbors(0), &[2, 3]);
        assert_eq!(config.neighbors(1), &[2, 3]);
        assert_eq!(config.neighbors(2), &[0, 1]);
    }

    #[test]
    fn test_template_pads_short_rows_and_skips_single_cells() {
        let config = generate_grid_config_from_template_string(
            WordList::default(),
            "
            ___
            _
            ",
        )
        .unwrap();

        assert_eq!(config.width, 3);
        assert_eq!(config.height, 2);
        assert!(!config.is_open((1, 1)));
        assert!(config.is_open((1, 0)));

        let slots: Vec<Slot> = config.slots().copied().collect();
        assert_eq!(
            slots,
            vec![
                Slot::new(0, 0, 3, Direction::Across),
                Slot::new(0, 0, 2, Direction::Down),
            ]
        );
    }

    #[test]
    fn test_template_keeps_leading_and_interior_blocks() {
        let config = generate_grid_config_from_template_string(
            WordList::default(),
            "
            ___
             __
            ",
        )
        .unwrap();

        assert_eq!(config.width, 3);
        assert!(!config.is_open((1, 0)));
        assert!(config.is_open((1, 1)));

        let slots: Vec<Slot> = config.slots().copied().collect();
        assert_eq!(
            slots,
            vec![
                Slot::new(0, 0, 3, Direction::Across),
                Slot::new(1, 1, 2, Direction::Across),
                Slot::new(0, 1, 2, Direction::Down),
                Slot::new(0, 2, 2, Direction::Down),
            ]
        );

        // A blank row in the middle is a row of blocks.
        let config =
            generate_grid_config_from_template_string(WordList::default(), "__\r\n\n__\r\n")
                .unwrap();
        assert_eq!(config.height, 3);
        assert_eq!(config.width, 2);
        let slots: Vec<Slot> = config.slots().copied().collect();
        assert_eq!(
            slots,
            vec![
                Slot::new(0, 0, 2, Direction::Across),
                Slot::new(2, 0, 2, Direction::Across),
            ]
        );
    }

    #[test]
    fn test_empty_template_is_rejected() {
        let result = generate_grid_config_from_template_string(WordList::default(), "\n   \n");
        assert_eq!(result.unwrap_err(), FillError::EmptyTemplate);
    }

    #[test]
    fn test_slot_identity_lookup() {
        let a = Slot::new(1, 0, 3, Direction::Across);
        let b = Slot::new(1, 1, 3, Direction::Down);
        let config = generate_grid_config(WordList::default(), &[a, b]).unwrap();

        assert_eq!(config.slot_id(&a), Ok(0));
        assert_eq!(config.slot_id(&Slot::new(1, 1, 3, Direction::Down)), Ok(1));

        let stranger = Slot::new(1, 1, 3, Direction::Across);
        assert_eq!(config.slot_id(&stranger), Err(FillError::UnknownSlot(stranger)));

        assert_eq!(config.overlap(0, 1), Some((1, 0)));
        assert_eq!(config.width, 3);
        assert_eq!(config.height, 4);
    }

    #[test]
    fn test_invalid_entries_are_rejected() {
        let a = Slot::new(0, 0, 3, Direction::Across);

        let duplicate = generate_grid_config(WordList::default(), &[a, a]);
        assert!(matches!(duplicate, Err(FillError::InvalidGrid(_))));

        let empty = generate_grid_config(
            WordList::default(),
            &[Slot::new(0, 0, 0, Direction::Down)],
        );
        assert!(matches!(empty, Err(FillError::InvalidGrid(_))));

        let pileup = generate_grid_config(
            WordList::default(),
            &[
                a,
                Slot::new(0, 1, 2, Direction::Down),
                Slot::new(0, 0, 2, Direction::Across),
            ],
        );
        assert!(matches!(pileup, Err(FillError::InvalidGrid(_))));

        // Overlapping runs in the same direction would put two letters in one cell.
        let parallel = generate_grid_config(
            WordList::new(["abc", "bzz"]),
            &[a, Slot::new(0, 1, 3, Direction::Across)],
        );
        assert!(matches!(parallel, Err(FillError::InvalidGrid(_))));

        let stacked = generate_grid_config(
            WordList::default(),
            &[
                Slot::new(0, 0, 3, Direction::Down),
                Slot::new(2, 0, 2, Direction::Down),
            ],
        );
        assert!(matches!(stacked, Err(FillError::InvalidGrid(_))));

        // Touching end to end without sharing a cell is fine.
        let adjacent = generate_grid_config(
            WordList::default(),
            &[a, Slot::new(0, 3, 2, Direction::Across)],
        )
        .unwrap();
        assert_eq!(adjacent.overlap(0, 1), None);
    }
}
