//! Recursive decomposition of oversized partitions under a cell budget.

use serde::{Deserialize, Serialize};
use whittle_circuit::Netlist;
use whittle_tooling::{Partitioner, SizeEstimator};

use crate::SearchError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecomposeConfig {
    /// A block above this cell count is split further.
    pub cell_budget: usize,
    /// Cap on a leaf's suggested internal partition count.
    pub max_fine_parts: usize,
    /// One suggested internal partition per this many cells.
    pub cells_per_fine_part: usize,
}

impl Default for DecomposeConfig {
    fn default() -> Self {
        Self {
            cell_budget: 2000,
            max_fine_parts: 30,
            cells_per_fine_part: 20,
        }
    }
}

/// A partition small enough to search directly.
#[derive(Debug, Clone)]
pub struct LeafBlock {
    pub netlist: Netlist,
    pub cells: usize,
    /// How finely the leaf's own search should re-partition it.
    pub suggested_parts: usize,
}

/// Result of decomposing a circuit: the accumulated top-level wiring
/// (every split block's shell joins it) plus the leaves.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub toplevel: Netlist,
    pub leaves: Vec<LeafBlock>,
}

/// Split `circuit` until every block fits the cell budget.
///
/// Runs on an explicit worklist rather than call recursion, so deeply
/// nested circuits cannot exhaust the stack.
pub fn decompose(
    partitioner: &dyn Partitioner,
    estimator: &dyn SizeEstimator,
    circuit: &Netlist,
    config: &DecomposeConfig,
) -> Result<Decomposition, SearchError> {
    let total = estimator.cell_count(circuit)?;
    let first = partitioner.partition(circuit, total / config.cell_budget + 1)?;
    log::info!(
        "decomposing {} ({total} cells) into {} blocks",
        circuit.module,
        first.modules.len()
    );

    let mut toplevel = first.toplevel;
    let mut worklist: Vec<Netlist> = first.modules.into_iter().flatten().collect();
    let mut leaves = Vec::new();

    while let Some(block) = worklist.pop() {
        let cells = estimator.cell_count(&block)?;
        if cells > config.cell_budget {
            let sub = partitioner.partition(&block, cells / config.cell_budget + 1)?;
            let children: Vec<Netlist> = sub.modules.into_iter().flatten().collect();
            // A block the partitioner cannot split any further stays a
            // leaf even over budget; requeueing it would never
            // terminate.
            if children.len() > 1 {
                // The split block's own wiring becomes part of the
                // shared top level; its children go back on the
                // worklist.
                toplevel = Netlist::assemble(&toplevel, [&sub.toplevel]);
                worklist.extend(children);
                continue;
            }
            log::debug!("{} ({cells} cells) is indivisible", block.module);
        }
        let suggested = (cells / config.cells_per_fine_part + 1).min(config.max_fine_parts);
        log::debug!(
            "leaf {} ({cells} cells, {suggested} fine partitions)",
            block.module
        );
        leaves.push(LeafBlock {
            netlist: block,
            cells,
            suggested_parts: suggested,
        });
    }

    log::info!("{} leaves under {}-cell budget", leaves.len(), config.cell_budget);
    Ok(Decomposition { toplevel, leaves })
}

#[cfg(test)]
mod tests {
    use super::*;
    use whittle_tooling::model::{self, ModelPartitioner, ModelSizeEstimator};

    #[test]
    fn test_small_circuit_yields_single_leaf() {
        let circuit = model::circuit("top", &[model::part("p0", 4, 4, 500)]);
        let out = decompose(
            &ModelPartitioner,
            &ModelSizeEstimator,
            &circuit,
            &DecomposeConfig::default(),
        )
        .unwrap();
        assert_eq!(out.leaves.len(), 1);
        assert_eq!(out.leaves[0].cells, 500);
        // 500 / 20 + 1 = 26, under the cap of 30.
        assert_eq!(out.leaves[0].suggested_parts, 26);
    }

    #[test]
    fn test_oversized_blocks_split_until_under_budget() {
        let parts: Vec<_> = (0..5)
            .map(|i| model::part(&format!("p{i}"), 4, 4, 1500))
            .collect();
        let circuit = model::circuit("top", &parts);
        let out = decompose(
            &ModelPartitioner,
            &ModelSizeEstimator,
            &circuit,
            &DecomposeConfig::default(),
        )
        .unwrap();

        // 7500 cells -> 4 initial blocks of up to 2 parts (3000 cells),
        // each oversized block splits into single-part leaves.
        assert_eq!(out.leaves.len(), 5);
        for leaf in &out.leaves {
            assert!(leaf.cells <= 2000);
            assert_eq!(leaf.suggested_parts, 30); // 1500/20 + 1 capped
        }
        // Every original part survives in exactly one leaf.
        let mut names: Vec<String> = out
            .leaves
            .iter()
            .flat_map(|l| model::parts_of(&l.netlist).unwrap())
            .map(|p| p.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["p0", "p1", "p2", "p3", "p4"]);
    }

    #[test]
    fn test_split_block_wiring_joins_toplevel() {
        let parts: Vec<_> = (0..5)
            .map(|i| model::part(&format!("p{i}"), 4, 4, 1500))
            .collect();
        let circuit = model::circuit("top", &parts);
        let out = decompose(
            &ModelPartitioner,
            &ModelSizeEstimator,
            &circuit,
            &DecomposeConfig::default(),
        )
        .unwrap();
        // The root wiring plus the shells of both split blocks.
        assert!(out.toplevel.text.contains("top top\n"));
        assert!(out.toplevel.text.contains("top top_0\n"));
        assert!(out.toplevel.text.contains("top top_1\n"));
    }

    #[test]
    fn test_indivisible_oversized_block_becomes_leaf() {
        // One 5000-cell part: the partitioner can never split it, so it
        // must come back as a single (over-budget) leaf.
        let circuit = model::circuit("top", &[model::part("p0", 4, 4, 5000)]);
        let out = decompose(
            &ModelPartitioner,
            &ModelSizeEstimator,
            &circuit,
            &DecomposeConfig::default(),
        )
        .unwrap();
        assert_eq!(out.leaves.len(), 1);
        assert_eq!(out.leaves[0].cells, 5000);
        assert_eq!(out.leaves[0].suggested_parts, 30);
    }
}
