//! Approximation streams — the sole representation of a design point.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::partition::PartitionRegistry;

/// Marker for a partition that does not exist; always passed through
/// unchanged by generation and assembly.
pub const ABSENT: i32 = -1;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("stream has {got} entries, registry has {want} partitions")]
    LengthMismatch { got: usize, want: usize },

    #[error("degree {degree} out of range [1, {max}] for partition {index}")]
    DegreeOutOfRange { index: usize, degree: i32, max: i32 },

    #[error("partition {index} is absent but carries degree {degree}")]
    DegreeForAbsent { index: usize, degree: i32 },
}

/// One precision degree per partition: `ABSENT` for a missing partition,
/// otherwise a value in `[1, max_degree]` where `max_degree` denotes the
/// exact variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApproxStream(Vec<i32>);

impl ApproxStream {
    pub fn new(degrees: Vec<i32>) -> Self {
        Self(degrees)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn degree(&self, index: usize) -> i32 {
        self.0[index]
    }

    pub fn degrees(&self) -> &[i32] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }

    /// Copy of this stream with one coordinate replaced.
    pub fn with_degree(&self, index: usize, degree: i32) -> Self {
        let mut degrees = self.0.clone();
        degrees[index] = degree;
        Self(degrees)
    }

    /// Check the stream against its registry: one entry per partition,
    /// `ABSENT` exactly on absent partitions, degrees within range.
    pub fn validate(&self, registry: &PartitionRegistry) -> Result<(), StreamError> {
        if self.0.len() != registry.len() {
            return Err(StreamError::LengthMismatch {
                got: self.0.len(),
                want: registry.len(),
            });
        }
        for (index, &degree) in self.0.iter().enumerate() {
            let partition = registry.get(index).expect("index bounded by len check");
            if !partition.exists {
                if degree != ABSENT {
                    return Err(StreamError::DegreeForAbsent { index, degree });
                }
                continue;
            }
            if degree < 1 || degree > partition.max_degree() {
                return Err(StreamError::DegreeOutOfRange {
                    index,
                    degree,
                    max: partition.max_degree(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for ApproxStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}
