use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use whittle_circuit::netlist::parse_module_name;
use whittle_circuit::Netlist;
use whittle_core::{RunConfig, Session};
use whittle_tooling::iverilog::{Iverilog, IverilogConfig};
use whittle_tooling::lsoracle::{LsOracle, LsOracleConfig};
use whittle_tooling::stimulus::VerilogStimulus;
use whittle_tooling::yosys::{Yosys, YosysConfig};
use whittle_tooling::bmf::{BmfApproximator, BmfConfig};
use whittle_tooling::Toolchain;

/// Approximate logic synthesis: trade output accuracy for area by
/// degrading the precision of circuit partitions under an error bound.
#[derive(Debug, Parser)]
#[command(name = "whittle", version)]
struct Args {
    /// Input Verilog file.
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Testbench Verilog file. Required in flat mode; generated from
    /// the input when omitted in recursive mode.
    #[arg(short = 't', long)]
    testbench: Option<PathBuf>,

    /// Number of partitions (flat mode).
    #[arg(short = 'n', long, default_value_t = 8)]
    parts: usize,

    /// Output directory.
    #[arg(short = 'o', long, default_value = "output")]
    output: PathBuf,

    /// Error threshold in [0, 1].
    #[arg(short = 's', long, default_value_t = 0.5)]
    threshold: f64,

    /// Liberty cell library.
    #[arg(long)]
    liberty: PathBuf,

    /// Recursive mode: decompose oversized partitions and run one
    /// worker per leaf.
    #[arg(long)]
    recursive: bool,

    /// Path to yosys.
    #[arg(long, default_value = "yosys")]
    yosys: PathBuf,

    /// Path to lsoracle.
    #[arg(long, default_value = "lsoracle")]
    lsoracle: PathBuf,

    /// Path to iverilog.
    #[arg(long, default_value = "iverilog")]
    iverilog: PathBuf,

    /// Path to vvp.
    #[arg(long, default_value = "vvp")]
    vvp: PathBuf,

    /// Path to the boolean-matrix-factorization approximator.
    #[arg(long, default_value = "bmf_factor")]
    bmf: PathBuf,

    /// Stimulus vectors per generated testbench.
    #[arg(long, default_value_t = 5000)]
    vectors: usize,

    /// Stimulus RNG seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    colog::init();
    let args = Args::parse();

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let module = parse_module_name(&source)
        .with_context(|| format!("no module declaration in {}", args.input.display()))?;
    let circuit = Netlist::new(module, source);

    let testbench = match &args.testbench {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let name = parse_module_name(&text)
                .unwrap_or_else(|| format!("{}_tb", circuit.module));
            Some(Netlist::new(name, text))
        }
        None => None,
    };

    let toolchain = build_toolchain(&args)?;
    let config = RunConfig {
        threshold: args.threshold,
        num_parts: args.parts,
        output_dir: args.output.clone(),
        ..RunConfig::default()
    };
    let session = Session::new(config, toolchain);

    log::info!(
        "approximating {} (threshold {:.4}, {} mode)",
        circuit.module,
        args.threshold,
        if args.recursive { "recursive" } else { "flat" }
    );
    let summary = if args.recursive {
        session.run_recursive(&circuit, testbench.as_ref())?
    } else {
        let testbench =
            testbench.context("flat mode needs a testbench (-t); see --recursive")?;
        session.run_flat(&circuit, &testbench)?
    };

    log::info!(
        "{}: area {:.2} ({:.2}% of {:.2}) after {} iterations",
        summary.label,
        summary.result.area,
        100.0 * summary.result.area / summary.original_area.max(f64::MIN_POSITIVE),
        summary.original_area,
        summary.iterations
    );
    if let Some(artifact) = &summary.artifact {
        log::info!("winning netlist written to {}", artifact.display());
    }
    Ok(())
}

fn build_toolchain(args: &Args) -> anyhow::Result<Toolchain> {
    let yosys = Arc::new(Yosys::new(YosysConfig {
        yosys: args.yosys.clone(),
        liberty: args.liberty.clone(),
        workdir: args.output.join("synth"),
    })?);
    let partitioner = LsOracle::new(LsOracleConfig {
        binary: args.lsoracle.clone(),
        workdir: args.output.join("partition"),
        part_config: None,
    })?;
    let simulator = Iverilog::new(IverilogConfig {
        iverilog: args.iverilog.clone(),
        vvp: args.vvp.clone(),
        workdir: args.output.join("truthtable"),
    })?;
    let approximator = BmfApproximator::new(BmfConfig {
        binary: args.bmf.clone(),
        workdir: args.output.join("approx"),
    })?;

    Ok(Toolchain {
        partitioner: Arc::new(partitioner),
        size_estimator: yosys.clone(),
        approximator: Arc::new(approximator),
        simulator: Arc::new(simulator),
        synthesizer: yosys,
        stimulus: Arc::new(VerilogStimulus {
            vectors: args.vectors,
            seed: args.seed,
        }),
    })
}
