use thiserror::Error;

/// Crate-wide result alias for the core engine.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error taxonomy for the core engine (spec.md §7).
///
/// `UninitializedShifter` and `InvalidPartition` are programming errors: a
/// correctly-driven caller never triggers them, so callers generally
/// propagate them rather than recover.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("sequence length ({len}) is shorter than k ({k})")]
    SequenceTooShort { len: usize, k: usize },

    #[error("encountered non-alphabet byte {byte:#04x} at position {pos}")]
    InvalidCharacter { byte: u8, pos: usize },

    #[error("shift_* called before hash_base on an uninitialized shifter")]
    UninitializedShifter,

    #[error("unknown partition id {partition} (storage has {n_partitions} partitions)")]
    InvalidPartition { partition: u32, n_partitions: u32 },

    #[error("shifter K={shifter_k} / k'={shifter_kprime} does not match UKHS k'={ukhs_kprime}")]
    UkhsMismatch {
        shifter_k: usize,
        shifter_kprime: usize,
        ukhs_kprime: usize,
    },

    #[error("persisted-state file format error: {0}")]
    FileFormat(String),
}
