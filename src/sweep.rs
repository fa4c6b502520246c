use crate::{
    LAUNCH_FAILURE_RC, MarkerState, RunResult, RunSpec, Simulator, SweepConfig, display_path,
    get_tqdm_style, marker_state, plan_sweep, remove_stale_files,
};
use anyhow::Context;
use indicatif::ProgressBar;
use std::time::Instant;

/// Runs every cell of a sweep one after another
///
/// A failing cell, whether gem5 exits non-zero or its output directory
/// cannot be prepared, is recorded and the sweep moves on.
pub struct SweepRunner<S: Simulator> {
    config: SweepConfig,
    simulator: S,
    pbar: ProgressBar,
    results: Vec<RunResult>,
}

impl<S: Simulator> SweepRunner<S> {
    /// `config` should already be the effective configuration
    pub fn new(config: SweepConfig, simulator: S) -> Self {
        let pbar = ProgressBar::new(config.num_cells() as u64);
        pbar.set_style(get_tqdm_style());
        Self {
            config,
            simulator,
            pbar,
            results: vec![],
        }
    }

    /// Replace the progress bar, e.g. with `ProgressBar::hidden()`
    pub fn with_progress_bar(mut self, pbar: ProgressBar) -> Self {
        pbar.set_length(self.config.num_cells() as u64);
        self.pbar = pbar;
        self
    }

    pub fn progress_bar(&self) -> &ProgressBar {
        &self.pbar
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<RunResult> {
        self.results
    }

    fn notice(&self, message: String) {
        self.pbar.suspend(|| println!("{}", message));
    }

    pub fn run(&mut self) -> &[RunResult] {
        for spec in plan_sweep(&self.config) {
            let result = self.run_cell(spec);
            self.results.push(result);
            self.pbar.inc(1);
        }
        self.pbar.finish_and_clear();
        &self.results
    }

    /// Create the output directory and apply the skip and stale marker
    /// policies, returns true when the cell is already done
    fn prepare_cell(&self, spec: &RunSpec) -> anyhow::Result<bool> {
        let outdir = &spec.output_directory;
        std::fs::create_dir_all(outdir)
            .with_context(|| format!("Failed to create output directory {}", outdir.display()))?;

        match marker_state(outdir) {
            MarkerState::Done if self.config.skip_done => {
                self.notice(format!(
                    "[skip] {} (stats.txt present in {})",
                    spec.cell_name(),
                    display_path(outdir)
                ));
                return Ok(true);
            }
            MarkerState::Empty => {
                log::warn!(
                    "Removing empty stats.txt left by an interrupted run in {}",
                    outdir.display()
                );
                remove_stale_files(outdir).with_context(|| {
                    format!("Failed to clean stale files in {}", outdir.display())
                })?;
            }
            _ => {}
        }
        Ok(false)
    }

    fn finish_cell(&self, spec: RunSpec, exit_code: i32, begin: Instant) -> RunResult {
        let elapsed = begin.elapsed().as_secs_f64();
        self.notice(format!(
            "[done] {} rc={} elapsed={:.0}s",
            spec.cell_name(),
            exit_code,
            elapsed
        ));
        if exit_code != 0 {
            log::warn!(
                "{} exited with rc={}, continuing with the next cell",
                spec.cell_name(),
                exit_code
            );
        }
        RunResult::finished(spec, exit_code, elapsed)
    }

    fn run_cell(&mut self, spec: RunSpec) -> RunResult {
        self.pbar.set_message(spec.cell_name());
        let begin = Instant::now();

        match self.prepare_cell(&spec) {
            Ok(true) => return RunResult::skipped(spec),
            Ok(false) => {}
            Err(err) => {
                log::error!("{}: {:#}", spec.cell_name(), err);
                return self.finish_cell(spec, LAUNCH_FAILURE_RC, begin);
            }
        }

        self.notice(format!(
            "[run] {} cmd={} maxinsts={}",
            spec.cell_name(),
            spec.command.display(),
            spec.max_insts
        ));
        let exit_code = match self.simulator.run(&spec) {
            Ok(code) => code,
            Err(err) => {
                log::error!("{}: {:#}", spec.cell_name(), err);
                LAUNCH_FAILURE_RC
            }
        };
        self.finish_cell(spec, exit_code, begin)
    }
}
