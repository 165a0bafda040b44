// SPDX-License-Identifier: MIT OR Apache-2.0
//! Invalidation levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much of a processor must be recomputed.
///
/// Levels are totally ordered. During propagation a processor's level only
/// ever increases; it returns to [`InvalidationLevel::Valid`] only when the
/// evaluation pass reports a successful recomputation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum InvalidationLevel {
    /// Up to date
    #[default]
    Valid,
    /// Output must be recomputed from unchanged inputs/resources
    InvalidOutput,
    /// Internal resources must be rebuilt before output can be recomputed
    InvalidResample,
}

impl InvalidationLevel {
    /// Level passed on to processors downstream of one invalidated at `self`.
    ///
    /// Consumers only ever need their output recomputed.
    pub fn downstream(self) -> Self {
        match self {
            Self::Valid => Self::Valid,
            Self::InvalidOutput | Self::InvalidResample => Self::InvalidOutput,
        }
    }

    /// Whether this level requires any recomputation
    pub fn is_invalid(self) -> bool {
        self != Self::Valid
    }
}

impl fmt::Display for InvalidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Valid => "Valid",
            Self::InvalidOutput => "InvalidOutput",
            Self::InvalidResample => "InvalidResample",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(InvalidationLevel::Valid < InvalidationLevel::InvalidOutput);
        assert!(InvalidationLevel::InvalidOutput < InvalidationLevel::InvalidResample);
        assert_eq!(InvalidationLevel::default(), InvalidationLevel::Valid);
    }

    #[test]
    fn test_downstream_mapping() {
        assert_eq!(InvalidationLevel::Valid.downstream(), InvalidationLevel::Valid);
        assert_eq!(
            InvalidationLevel::InvalidResample.downstream(),
            InvalidationLevel::InvalidOutput
        );
    }
}
