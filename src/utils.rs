use crate::RunResult;

pub fn get_tqdm_style() -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::with_template(
            "{percent:>3}% |{wide_bar}| {pos}/{len} [{elapsed_precise}<{eta_precise}] {msg}",
        )
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
        .progress_chars("██ ")
}

/// Small L1 caches make gem5 noticeably slower than the calibration size
pub const CALIBRATION_SLOWDOWN: f64 = 1.4;

/// Estimated wall-clock seconds of a full sweep over `full_sizes` sizes,
/// from the runs of a calibration session
pub fn estimate_sweep_seconds(calibration: &[RunResult], full_sizes: usize) -> Option<f64> {
    let runs: Vec<&RunResult> = calibration.iter().filter(|r| !r.skipped).collect();
    if runs.is_empty() {
        return None;
    }
    let per_size: f64 = runs.iter().map(|r| r.elapsed_seconds).sum();
    Some(per_size * full_sizes as f64 * CALIBRATION_SLOWDOWN)
}

/// "1h02m03s" style duration
pub fn format_seconds(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (hours, minutes, secs) = (total / 3600, total / 60 % 60, total % 60);
    if hours > 0 {
        format!("{}h{:02}m{:02}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m{:02}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
