// sweep folder structure:
// {outbase}/
// \- L1_{size}/
//    \- {benchmark-name}/
//       |- stats.txt    <- completion marker, non-empty once gem5 finished
//       |- simout       <- redirected gem5 stdout, mirrored while running
//       |- simerr       <- redirected gem5 stderr
//       |- program.out  <- target program stdout
//       \- program.err  <- target program stderr

use resolve_path::PathResolveExt;
use std::path::{Path, PathBuf};

pub const STATS_FILE: &str = "stats.txt";
pub const SIMOUT_FILE: &str = "simout";
pub const SIMERR_FILE: &str = "simerr";

/// Files left behind by an interrupted run
pub const TRANSIENT_FILES: &[&str] = &[SIMOUT_FILE, SIMERR_FILE, "program.out", "program.err"];

pub fn get_size_dir<P: AsRef<Path>>(outbase: P, size: &str) -> PathBuf {
    outbase.as_ref().join(format!("L1_{}", size))
}

pub fn get_cell_dir<P: AsRef<Path>>(outbase: P, size: &str, benchmark_name: &str) -> PathBuf {
    get_size_dir(outbase, size).join(benchmark_name)
}

pub fn get_stats_path<P: AsRef<Path>>(cell_dir: P) -> PathBuf {
    cell_dir.as_ref().join(STATS_FILE)
}

pub fn get_simout_path<P: AsRef<Path>>(cell_dir: P) -> PathBuf {
    cell_dir.as_ref().join(SIMOUT_FILE)
}

/// State of the completion marker of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    Missing,
    /// present but zero-length, gem5 crashed or was killed before dumping stats
    Empty,
    Done,
}

pub fn marker_state<P: AsRef<Path>>(cell_dir: P) -> MarkerState {
    match std::fs::metadata(get_stats_path(cell_dir)) {
        Ok(meta) if meta.len() > 0 => MarkerState::Done,
        Ok(_) => MarkerState::Empty,
        Err(_) => MarkerState::Missing,
    }
}

/// Remove an empty marker along with the transient logs next to it
pub fn remove_stale_files<P: AsRef<Path>>(cell_dir: P) -> std::io::Result<()> {
    let cell_dir = cell_dir.as_ref();
    std::fs::remove_file(get_stats_path(cell_dir))?;
    for name in TRANSIENT_FILES {
        match std::fs::remove_file(cell_dir.join(name)) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => return Err(err),
            _ => {}
        }
    }
    Ok(())
}

/// Expand a leading `~`, keep the path as given if home cannot be found
pub fn expand_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    match path.try_resolve() {
        Ok(resolved) => resolved.into_owned(),
        Err(_) => path.to_path_buf(),
    }
}

/// Path relative to the current directory when possible, for display
pub fn display_path<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();
    std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(path, cwd))
        .filter(|rel| !rel.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
