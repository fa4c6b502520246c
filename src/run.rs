use crate::{Benchmark, SweepConfig, get_cell_dir};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// exit code recorded when the simulator could not be launched at all
pub const LAUNCH_FAILURE_RC: i32 = 127;

/// One cell of the sweep: a single gem5 invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpec {
    /// L1 size label, e.g. "16kB"
    pub size: String,
    pub benchmark_name: String,
    /// target program
    pub command: PathBuf,
    pub arguments: Vec<String>,
    /// `{outbase}/L1_{size}/{benchmark_name}`
    pub output_directory: PathBuf,
    /// committed instruction cap, 0 means unlimited
    pub max_insts: u64,
    pub progress_hz: u32,
}

impl RunSpec {
    pub fn new(config: &SweepConfig, size: &str, benchmark: &Benchmark) -> Self {
        Self {
            size: size.to_string(),
            benchmark_name: benchmark.name.clone(),
            command: benchmark.executable.clone(),
            arguments: benchmark.args.clone(),
            output_directory: get_cell_dir(&config.outbase, size, &benchmark.name),
            max_insts: config.max_insts,
            progress_hz: config.progress_hz,
        }
    }

    pub fn cell_name(&self) -> String {
        format!("L1_{}/{}", self.size, self.benchmark_name)
    }
}

/// Outcome of one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_spec: RunSpec,
    pub exit_code: i32,
    pub elapsed_seconds: f64,
    /// a completed stats.txt was already present
    pub skipped: bool,
}

impl RunResult {
    pub fn skipped(run_spec: RunSpec) -> Self {
        Self {
            run_spec,
            exit_code: 0,
            elapsed_seconds: 0.0,
            skipped: true,
        }
    }

    pub fn finished(run_spec: RunSpec, exit_code: i32, elapsed_seconds: f64) -> Self {
        Self {
            run_spec,
            exit_code,
            elapsed_seconds,
            skipped: false,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Every cell of the sweep in execution order: sizes outer, benchmarks inner
pub fn plan_sweep(config: &SweepConfig) -> Vec<RunSpec> {
    let mut specs = Vec::with_capacity(config.num_cells());
    for size in &config.sizes {
        for benchmark in &config.benchmarks {
            specs.push(RunSpec::new(config, size, benchmark));
        }
    }
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use std::path::Path;

    #[test]
    fn test_plan_order() {
        let config = test_config(
            Path::new("/tmp/m5out"),
            &["1kB", "2kB"],
            &["dijkstra", "blowfish_enc"],
        );
        let cells: Vec<String> = plan_sweep(&config).iter().map(|s| s.cell_name()).collect();
        assert_eq!(
            cells,
            vec![
                "L1_1kB/dijkstra",
                "L1_1kB/blowfish_enc",
                "L1_2kB/dijkstra",
                "L1_2kB/blowfish_enc",
            ]
        );
    }

    #[test]
    fn test_output_directories_are_unique() {
        let config = test_config(
            Path::new("/tmp/m5out"),
            &["1kB", "2kB", "4kB"],
            &["dijkstra", "blowfish_enc", "blowfish_dec"],
        );
        let specs = plan_sweep(&config);
        let dirs: std::collections::HashSet<&PathBuf> =
            specs.iter().map(|s| &s.output_directory).collect();
        assert_eq!(dirs.len(), specs.len());
        assert_eq!(
            specs[0].output_directory,
            PathBuf::from("/tmp/m5out/L1_1kB/dijkstra")
        );
    }

    #[test]
    fn test_result_json() {
        let config = test_config(Path::new("/tmp/m5out"), &["1kB"], &["dijkstra"]);
        let spec = plan_sweep(&config).remove(0);
        let result = RunResult::finished(spec, 1, 12.5);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["exit_code"], 1);
        assert_eq!(json["skipped"], false);
        assert_eq!(json["run_spec"]["benchmark_name"], "dijkstra");
        assert!(!result.success());
    }
}
