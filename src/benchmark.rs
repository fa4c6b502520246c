use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

const BLOWFISH_KEY: &str = "1234567890abcdeffedcba0987654321";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benchmark {
    /// Benchmark name, also the output subdirectory of each cell
    pub name: String,
    /// Path to its executable
    pub executable: PathBuf,
    /// Command line args
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub benchmarks: Vec<Benchmark>,
}

impl BenchmarkConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path)
            .with_context(|| format!("Failed to read benchmark config {}", path.display()))?;
        let config: BenchmarkConfig = serde_json::from_slice(&content)
            .with_context(|| format!("Failed to parse benchmark config {}", path.display()))?;
        validate_benchmarks(&config.benchmarks)?;
        Ok(config)
    }
}

/// MiBench programs used in the L1 sweep, blowfish_dec reads what blowfish_enc wrote
pub fn default_benchmarks<P: AsRef<Path>>(mibench: P) -> Vec<Benchmark> {
    let mibench = mibench.as_ref();
    let dijkstra = mibench.join("network").join("dijkstra");
    let blowfish = mibench.join("security").join("blowfish");
    let file = |dir: &Path, name: &str| dir.join(name).display().to_string();

    vec![
        Benchmark {
            name: "dijkstra".to_string(),
            executable: dijkstra.join("dijkstra_large"),
            args: vec![file(&dijkstra, "input.dat")],
        },
        Benchmark {
            name: "blowfish_enc".to_string(),
            executable: blowfish.join("bf"),
            args: vec![
                "e".to_string(),
                file(&blowfish, "input_large.asc"),
                file(&blowfish, "output_large.enc"),
                BLOWFISH_KEY.to_string(),
            ],
        },
        Benchmark {
            name: "blowfish_dec".to_string(),
            executable: blowfish.join("bf"),
            args: vec![
                "d".to_string(),
                file(&blowfish, "output_large.enc"),
                file(&blowfish, "output_large.dec"),
                BLOWFISH_KEY.to_string(),
            ],
        },
    ]
}

/// Names double as directory names, so they must be unique and path-safe
pub fn validate_benchmarks(benchmarks: &[Benchmark]) -> anyhow::Result<()> {
    if benchmarks.is_empty() {
        bail!("No benchmarks configured");
    }
    let mut seen = HashSet::new();
    for benchmark in benchmarks {
        let name = benchmark.name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            bail!("Invalid benchmark name {:?}", name);
        }
        if !seen.insert(name) {
            bail!("Duplicate benchmark name {:?}", name);
        }
    }
    Ok(())
}
