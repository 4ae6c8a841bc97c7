use thiserror::Error;

use crate::grid_config::Slot;

/// Errors caused by malformed input or by addressing something that isn't part of the grid. An
/// unfillable grid is not an error; see `FillFailure` for that.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FillError {
    #[error("slot {0} is not part of this grid")]
    UnknownSlot(Slot),

    #[error("word {0:?} is not in the word list")]
    UnknownWord(String),

    #[error("structure template contains no rows")]
    EmptyTemplate,

    #[error("invalid grid: {0}")]
    InvalidGrid(String),
}
