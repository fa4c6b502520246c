//! Run gem5 over every (L1 size, benchmark) cell
use anyhow::Context;
use chrono::Local;
use clap::{Parser, builder::BoolishValueParser};
use cli_table::{Cell, Table, print_stdout};
use gem5_sweep::{
    BenchmarkConfig, DEFAULT_CALIBRATION_SIZE, DEFAULT_PROGRESS_HZ, DEFAULT_SIZES, Gem5,
    RunResult, SweepConfig, SweepRunner, default_benchmarks, display_path,
    estimate_sweep_seconds, expand_path, format_seconds, get_tqdm_style, parse_size_list,
    plan_sweep,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the gem5 binary
    #[arg(long, env = "GEM5", default_value = "~/gem5/build/RISCV/gem5.opt")]
    gem5: PathBuf,

    /// gem5 configuration script
    #[arg(long, env = "CONFIG", default_value = "~/arq/TP4_EX4/gem5/se_A7_q4.py")]
    config: PathBuf,

    /// Base output directory, cells land in {outbase}/L1_{size}/{benchmark}
    #[arg(long, env = "OUTBASE", default_value = "~/arq/TP4_EX4/m5out/q4/A7")]
    outbase: PathBuf,

    /// Stop after this many committed instructions, 0 runs to completion
    #[arg(long, env = "MAXINSTS", default_value_t = 0)]
    maxinsts: u64,

    /// gem5 progress print frequency in Hz, 0 disables
    #[arg(long, env = "PROGRESS", default_value_t = DEFAULT_PROGRESS_HZ)]
    progress: u32,

    /// Skip cells that already have a non-empty stats.txt
    #[arg(long, env = "SKIP_DONE", default_value_t = true, action = clap::ArgAction::Set, value_parser = BoolishValueParser::new())]
    skip_done: bool,

    /// Run each benchmark once at the calibration size, no skipping and no instruction cap
    #[arg(long, env = "CALIBRATE", default_value_t = false, action = clap::ArgAction::Set, value_parser = BoolishValueParser::new())]
    calibrate: bool,

    /// L1 size used in calibration mode
    #[arg(long, env = "CALIBRATION_SIZE", default_value = DEFAULT_CALIBRATION_SIZE)]
    calibration_size: String,

    /// Whitespace separated L1 sizes
    #[arg(long, env = "SIZES", default_value = DEFAULT_SIZES)]
    sizes: String,

    /// MiBench root for the default benchmark list
    #[arg(long, env = "MIBENCH", default_value = "~/arq/TP4_EX4/mibench")]
    mibench: PathBuf,

    /// JSON benchmark list replacing the default one
    #[arg(long, env = "BENCHMARKS")]
    benchmarks: Option<PathBuf>,

    /// Print the gem5 command lines without running them
    #[arg(long)]
    dry_run: bool,

    /// Write the session results as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

fn build_config(args: &Cli) -> anyhow::Result<SweepConfig> {
    let benchmarks = match &args.benchmarks {
        Some(path) => BenchmarkConfig::load(expand_path(path))?.benchmarks,
        None => default_benchmarks(expand_path(&args.mibench)),
    };
    let config = SweepConfig {
        gem5: expand_path(&args.gem5),
        config_script: expand_path(&args.config),
        outbase: expand_path(&args.outbase),
        sizes: parse_size_list(&args.sizes)?,
        benchmarks,
        max_insts: args.maxinsts,
        progress_hz: args.progress,
        skip_done: args.skip_done,
        calibrate: args.calibrate,
        calibration_size: args.calibration_size.clone(),
    };
    config.validate()?;
    Ok(config)
}

fn print_summary(results: &[RunResult]) -> anyhow::Result<()> {
    let mut table = vec![];
    for result in results {
        let status = if result.skipped {
            "skip".to_string()
        } else if result.success() {
            "ok".to_string()
        } else {
            format!("rc={}", result.exit_code)
        };
        table.push(vec![
            result.run_spec.size.clone().cell(),
            result.run_spec.benchmark_name.clone().cell(),
            status.cell(),
            format_seconds(result.elapsed_seconds).cell(),
            display_path(&result.run_spec.output_directory).cell(),
        ]);
    }
    let table = table.table().title(vec![
        "L1".cell(),
        "Benchmark".cell(),
        "Status".cell(),
        "Elapsed".cell(),
        "Output".cell(),
    ]);
    print_stdout(table)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let config = build_config(&args)?;
    let effective = config.effective();

    println!("GEM5={}", effective.gem5.display());
    println!("CONFIG={}", effective.config_script.display());
    println!("OUTBASE={}", effective.outbase.display());
    println!("SIZES={}", effective.sizes.join(" "));
    println!(
        "BENCHMARKS={}",
        effective
            .benchmarks
            .iter()
            .map(|b| b.name.as_str())
            .collect::<Vec<&str>>()
            .join(" ")
    );
    println!(
        "MAXINSTS={} PROGRESS={} SKIP_DONE={} CALIBRATE={}",
        effective.max_insts, effective.progress_hz, effective.skip_done, config.calibrate
    );

    let pbar = indicatif::ProgressBar::new(effective.num_cells() as u64);
    pbar.set_style(get_tqdm_style());
    let sink_pbar = pbar.clone();
    let gem5 = Gem5::new(
        &effective,
        Box::new(move |line| sink_pbar.suspend(|| println!("{}", line))),
    );

    if args.dry_run {
        for spec in plan_sweep(&effective) {
            println!("{}", gem5.command_line(&spec));
        }
        return Ok(());
    }

    println!("Sweep started at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    let mut runner = SweepRunner::new(effective, gem5).with_progress_bar(pbar);
    runner.run();
    println!("Sweep finished at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    let results = runner.into_results();
    print_summary(&results)?;

    let failed = results.iter().filter(|r| !r.skipped && !r.success()).count();
    if failed > 0 {
        log::warn!("{} of {} cells exited with a non-zero code", failed, results.len());
    }

    if config.calibrate {
        let full_sizes = config.sizes.len();
        match estimate_sweep_seconds(&results, full_sizes) {
            Some(seconds) => println!(
                "Estimated full sweep ({} sizes, {} runs): ~{} ({}x slowdown for small L1)",
                full_sizes,
                config.num_cells(),
                format_seconds(seconds),
                gem5_sweep::CALIBRATION_SLOWDOWN
            ),
            None => println!("No calibration run finished, cannot estimate the full sweep"),
        }
    }

    if let Some(json) = &args.json {
        std::fs::write(json, serde_json::to_vec_pretty(&results)?)
            .with_context(|| format!("Failed to write {}", json.display()))?;
        println!("Result written to {}", json.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const ENV_VARS: [&str; 4] = ["SKIP_DONE", "CALIBRATE", "SIZES", "MAXINSTS"];

    #[test]
    fn test_cli_env_and_flags() {
        Cli::command().debug_assert();

        // SAFETY: the only test in this binary, nothing else reads the environment concurrently
        unsafe {
            for var in ENV_VARS {
                std::env::remove_var(var);
            }
        }
        let args = Cli::try_parse_from(["sweep"]).unwrap();
        assert!(args.skip_done);
        assert!(!args.calibrate);
        assert_eq!(parse_size_list(&args.sizes).unwrap().len(), 5);

        unsafe {
            std::env::set_var("SKIP_DONE", "0");
            std::env::set_var("CALIBRATE", "yes");
            std::env::set_var("SIZES", "2kB  4kB\t32kB");
            std::env::set_var("MAXINSTS", "5000000");
        }
        let args = Cli::try_parse_from(["sweep"]).unwrap();
        assert!(!args.skip_done);
        assert!(args.calibrate);
        assert_eq!(args.maxinsts, 5_000_000);
        assert_eq!(
            parse_size_list(&args.sizes).unwrap(),
            vec!["2kB", "4kB", "32kB"]
        );

        // flags win over the environment
        let args = Cli::try_parse_from(["sweep", "--skip-done", "on", "--calibrate", "off"]).unwrap();
        assert!(args.skip_done);
        assert!(!args.calibrate);

        unsafe {
            std::env::set_var("SKIP_DONE", "maybe");
        }
        assert!(Cli::try_parse_from(["sweep"]).is_err());

        unsafe {
            for var in ENV_VARS {
                std::env::remove_var(var);
            }
        }
    }
}
