//! Testbench generation for partitions.
//!
//! Each leaf partition gets a testbench once, before any search begins.
//! Vectors come from a seeded RNG so a rerun with the same seed
//! exercises the same stimulus; when the input space is small enough the
//! generator sweeps it exhaustively instead.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use whittle_circuit::Netlist;

use crate::ports::scan_ports;
use crate::traits::{Stimulus, StimulusGenerator};
use crate::ToolError;

/// Writes Verilog testbenches that drive a partition's inputs and
/// `$display` its outputs, one row per vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerilogStimulus {
    /// Number of random vectors per testbench.
    pub vectors: usize,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

impl Default for VerilogStimulus {
    fn default() -> Self {
        Self {
            vectors: 5000,
            seed: 42,
        }
    }
}

impl StimulusGenerator for VerilogStimulus {
    fn generate(&self, partition: &Netlist) -> Result<Stimulus, ToolError> {
        let ports = scan_ports(partition)?;
        let num_inputs = ports.input_bits();
        let num_outputs = ports.output_bits();
        if num_inputs == 0 || num_outputs == 0 {
            return Err(ToolError::unparsable(
                "stimulus",
                format!("module {} has no usable ports", partition.module),
            ));
        }

        let tb_name = format!("{}_tb", partition.module);
        let mut text = String::new();
        text.push_str(&format!("module {tb_name};\n"));
        text.push_str(&format!("reg [{}:0] pi;\n", num_inputs - 1));
        text.push_str(&format!("wire [{}:0] po;\n", num_outputs - 1));

        // Instantiate the partition, slicing pi/po across its ports in
        // declaration order.
        text.push_str(&format!("{} dut (", partition.module));
        let mut offset = 0usize;
        let mut connections = Vec::new();
        for port in &ports.inputs {
            connections.push(format!(".{}(pi[{}:{}])", port.name, offset + port.width - 1, offset));
            offset += port.width;
        }
        offset = 0;
        for port in &ports.outputs {
            connections.push(format!(".{}(po[{}:{}])", port.name, offset + port.width - 1, offset));
            offset += port.width;
        }
        text.push_str(&connections.join(", "));
        text.push_str(");\n");

        text.push_str("initial begin\n");
        for vector in self.build_vectors(partition, num_inputs) {
            text.push_str(&format!(
                "  pi = {num_inputs}'b{vector}; #1 $display(\"%b\", po);\n"
            ));
        }
        text.push_str("end\nendmodule\n");

        Ok(Stimulus {
            testbench: Netlist::new(tb_name, text),
            num_inputs,
            num_outputs,
        })
    }
}

impl VerilogStimulus {
    fn build_vectors(&self, partition: &Netlist, num_inputs: usize) -> Vec<String> {
        // Exhaustive sweep when the input space fits the vector budget.
        if num_inputs < 64 && (1u64 << num_inputs) <= self.vectors as u64 {
            return (0..1u64 << num_inputs)
                .map(|v| format!("{v:0width$b}", width = num_inputs))
                .collect();
        }

        // Otherwise seed a stream per partition so two partitions with
        // the same widths still see different vectors.
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ name_salt(&partition.module));
        (0..self.vectors)
            .map(|_| {
                (0..num_inputs)
                    .map(|_| if rng.gen::<bool>() { '1' } else { '0' })
                    .collect()
            })
            .collect()
    }
}

fn name_salt(name: &str) -> u64 {
    name.bytes().fold(0u64, |acc, b| {
        acc.wrapping_mul(31).wrapping_add(b as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition() -> Netlist {
        Netlist::new("top_0", "module top_0(a, b, y);\ninput [1:0] a;\ninput b;\noutput [1:0] y;\nendmodule\n")
    }

    #[test]
    fn test_counts_come_from_ports() {
        let stim = VerilogStimulus::default().generate(&partition()).unwrap();
        assert_eq!(stim.num_inputs, 3);
        assert_eq!(stim.num_outputs, 2);
        assert_eq!(stim.testbench.module, "top_0_tb");
    }

    #[test]
    fn test_small_input_space_is_exhaustive() {
        let stim = VerilogStimulus::default().generate(&partition()).unwrap();
        // 3 input bits -> 8 vectors, all distinct.
        let count = stim.testbench.text.matches("$display").count();
        assert_eq!(count, 8);
        assert!(stim.testbench.text.contains("pi = 3'b000;"));
        assert!(stim.testbench.text.contains("pi = 3'b111;"));
    }

    #[test]
    fn test_same_seed_same_testbench() {
        let wide = Netlist::new(
            "w",
            "module w(a, y);\ninput [63:0] a;\noutput y;\nendmodule\n",
        );
        let generator = VerilogStimulus {
            vectors: 16,
            seed: 7,
        };
        let a = generator.generate(&wide).unwrap();
        let b = generator.generate(&wide).unwrap();
        assert_eq!(a.testbench, b.testbench);
    }

    #[test]
    fn test_no_outputs_is_an_error() {
        let bad = Netlist::new("b", "module b(a);\ninput a;\nendmodule\n");
        assert!(VerilogStimulus::default().generate(&bad).is_err());
    }
}
