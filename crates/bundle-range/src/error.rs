use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BundleRangeError {
    #[error("bundle has {got} evaluation block numbers, expected {expected}")]
    ChainCountMismatch { got: usize, expected: usize },
    #[error("missing block timestamp for chain {chain} at block {block}")]
    MissingBlockTimestamp { chain: bridge_types::ChainId, block: u64 },

    #[error("chain {chain} derived a non-zero start block {start} with a zero start time")]
    ZeroStartTimeWithNonzeroStart { chain: bridge_types::ChainId, start: u64 },

    #[error("chain {chain} derived endTime {end_time} before startTime {start_time}")]
    EndTimeBeforeStartTime {
        chain: bridge_types::ChainId,
        start_time: u64,
        end_time: u64,
    },
}
