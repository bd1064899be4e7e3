//! Partition descriptors and the registry built at partitioning time.

use serde::{Deserialize, Serialize};

use crate::stream::{ApproxStream, ABSENT};

/// Static description of one circuit partition. Immutable once the
/// circuit has been partitioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub index: usize,
    pub num_inputs: usize,
    pub num_outputs: usize,
    /// `false` marks a degenerate partition the partitioner produced no
    /// module for; it contributes nothing to generation or assembly.
    pub exists: bool,
}

impl Partition {
    pub fn new(index: usize, num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            index,
            num_inputs,
            num_outputs,
            exists: true,
        }
    }

    /// Placeholder for an empty slot in the partitioner's output.
    pub fn absent(index: usize) -> Self {
        Self {
            index,
            num_inputs: 0,
            num_outputs: 0,
            exists: false,
        }
    }

    /// The exact (unapproximated) degree: the partition's output width.
    pub fn max_degree(&self) -> i32 {
        self.num_outputs as i32
    }
}

/// All partitions of one circuit, in partitioner order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRegistry {
    partitions: Vec<Partition>,
}

impl PartitionRegistry {
    pub fn new(partitions: Vec<Partition>) -> Self {
        Self { partitions }
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Partition> {
        self.partitions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter()
    }

    /// Partitions that actually exist, in index order.
    pub fn existing(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter().filter(|p| p.exists)
    }

    /// The all-exact design point: every existing partition at its
    /// maximum degree, absent partitions at the pass-through marker.
    pub fn all_exact_stream(&self) -> ApproxStream {
        ApproxStream::new(
            self.partitions
                .iter()
                .map(|p| if p.exists { p.max_degree() } else { ABSENT })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exact_stream_skips_absent() {
        let registry = PartitionRegistry::new(vec![
            Partition::new(0, 4, 3),
            Partition::absent(1),
            Partition::new(2, 2, 2),
        ]);
        let stream = registry.all_exact_stream();
        assert_eq!(stream.degrees(), &[3, ABSENT, 2]);
    }

    #[test]
    fn test_existing_filters() {
        let registry = PartitionRegistry::new(vec![
            Partition::new(0, 4, 3),
            Partition::absent(1),
        ]);
        let indices: Vec<usize> = registry.existing().map(|p| p.index).collect();
        assert_eq!(indices, vec![0]);
    }
}
