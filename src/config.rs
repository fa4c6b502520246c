use crate::{Benchmark, parse_size_label, validate_benchmarks};
use anyhow::{Context, bail};
use std::path::PathBuf;

pub const DEFAULT_SIZES: &str = "1kB 2kB 4kB 8kB 16kB";
pub const DEFAULT_CALIBRATION_SIZE: &str = "16kB";
pub const DEFAULT_PROGRESS_HZ: u32 = 10;

/// Sweep configuration, built once at startup and never mutated afterwards
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// gem5 executable
    pub gem5: PathBuf,
    /// gem5 python configuration script
    pub config_script: PathBuf,
    /// root of the `L1_{size}` directories
    pub outbase: PathBuf,
    /// L1 size labels, outer loop of the sweep
    pub sizes: Vec<String>,
    /// benchmarks, inner loop of the sweep
    pub benchmarks: Vec<Benchmark>,
    /// committed instruction cap, 0 means run to completion
    pub max_insts: u64,
    /// progress print frequency in Hz, 0 disables
    pub progress_hz: u32,
    /// skip cells that already have a non-empty stats.txt
    pub skip_done: bool,
    /// one representative run per benchmark to estimate sweep runtime
    pub calibrate: bool,
    pub calibration_size: String,
}

/// Split a whitespace separated size list, e.g. "1kB 2kB  4kB"
pub fn parse_size_list(sizes: &str) -> anyhow::Result<Vec<String>> {
    let sizes: Vec<String> = sizes.split_whitespace().map(str::to_string).collect();
    if sizes.is_empty() {
        bail!("Size list is empty");
    }
    for size in &sizes {
        parse_size_label(size).with_context(|| format!("Invalid L1 size {:?}", size))?;
    }
    Ok(sizes)
}

impl SweepConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        for size in self.sizes.iter().chain(std::iter::once(&self.calibration_size)) {
            parse_size_label(size).with_context(|| format!("Invalid L1 size {:?}", size))?;
        }
        if self.sizes.is_empty() {
            bail!("Size list is empty");
        }
        validate_benchmarks(&self.benchmarks)
    }

    /// Configuration actually swept: calibration pins one size, disables
    /// skipping and lifts the instruction cap
    pub fn effective(&self) -> SweepConfig {
        if !self.calibrate {
            return self.clone();
        }
        SweepConfig {
            sizes: vec![self.calibration_size.clone()],
            skip_done: false,
            max_insts: 0,
            ..self.clone()
        }
    }

    pub fn num_cells(&self) -> usize {
        self.sizes.len() * self.benchmarks.len()
    }
}

#[cfg(test)]
pub(crate) fn test_config(outbase: &std::path::Path, sizes: &[&str], names: &[&str]) -> SweepConfig {
    SweepConfig {
        gem5: PathBuf::from("/opt/gem5/build/RISCV/gem5.opt"),
        config_script: PathBuf::from("/opt/gem5/se_A7_q4.py"),
        outbase: outbase.to_path_buf(),
        sizes: sizes.iter().map(|s| s.to_string()).collect(),
        benchmarks: names
            .iter()
            .map(|name| Benchmark {
                name: name.to_string(),
                executable: PathBuf::from(format!("/opt/mibench/{}", name)),
                args: vec!["input.dat".to_string()],
            })
            .collect(),
        max_insts: 0,
        progress_hz: DEFAULT_PROGRESS_HZ,
        skip_done: true,
        calibrate: false,
        calibration_size: DEFAULT_CALIBRATION_SIZE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_size_list() {
        assert_eq!(
            parse_size_list(DEFAULT_SIZES).unwrap(),
            vec!["1kB", "2kB", "4kB", "8kB", "16kB"]
        );
        assert_eq!(
            parse_size_list("  2kB\t32kB \n").unwrap(),
            vec!["2kB", "32kB"]
        );
        assert!(parse_size_list("   ").is_err());
        assert!(parse_size_list("1kB huge").is_err());
    }

    #[test]
    fn test_calibration_overrides() {
        let mut config = test_config(Path::new("/tmp/out"), &["1kB", "2kB", "4kB"], &["dijkstra"]);
        config.max_insts = 5_000_000;
        config.skip_done = true;

        let normal = config.effective();
        assert_eq!(normal.sizes.len(), 3);
        assert!(normal.skip_done);
        assert_eq!(normal.max_insts, 5_000_000);

        config.calibrate = true;
        let calibrated = config.effective();
        assert_eq!(calibrated.sizes, vec!["16kB"]);
        assert!(!calibrated.skip_done);
        assert_eq!(calibrated.max_insts, 0);
        assert_eq!(calibrated.num_cells(), 1);
    }

    #[test]
    fn test_validate() {
        let mut config = test_config(Path::new("/tmp/out"), &["1kB"], &["dijkstra", "sha"]);
        config.validate().unwrap();

        config.calibration_size = "sixteen".to_string();
        assert!(config.validate().is_err());

        config.calibration_size = DEFAULT_CALIBRATION_SIZE.to_string();
        config.benchmarks.push(config.benchmarks[0].clone());
        assert!(config.validate().is_err());
    }
}
