//! Fill crossword structures from a word list by treating every slot as a variable in a
//! constraint satisfaction problem: node and arc consistency up front, then backtracking search
//! ordered by the minimum-remaining-values and least-constraining-value heuristics.

pub mod arc_consistency;
pub mod backtracking_search;
pub mod domain;
pub mod error;
pub mod grid_config;
pub mod options;
pub mod render;
pub mod word_list;

pub use backtracking_search::{find_fill, FillFailure, FillSuccess, Statistics};
pub use error::FillError;
pub use grid_config::{
    generate_grid_config, generate_grid_config_from_template_string, Direction, GridConfig, Slot,
};
pub use options::FillOptions;
pub use render::render_grid;
pub use word_list::WordList;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;
