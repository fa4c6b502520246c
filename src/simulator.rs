use crate::{LogMirror, RunSpec, SweepConfig, get_simout_path};
use anyhow::{Context, bail};
use std::{
    ffi::OsString,
    os::unix::process::ExitStatusExt,
    path::PathBuf,
    process::{Command, ExitStatus, Stdio},
};

/// Launches the external simulator for one cell
pub trait Simulator {
    /// Run to completion and return the exit code. `Err` means the
    /// simulator could not be launched.
    fn run(&mut self, spec: &RunSpec) -> anyhow::Result<i32>;
}

/// Where mirrored simulator output goes
pub type LineSink = Box<dyn Fn(&str) + Send + Sync>;

/// gem5 in syscall-emulation mode, driven through a python config script
pub struct Gem5 {
    pub binary: PathBuf,
    pub config_script: PathBuf,
    sink: std::sync::Arc<LineSink>,
}

impl Gem5 {
    pub fn new(config: &SweepConfig, sink: LineSink) -> Self {
        Self {
            binary: config.gem5.clone(),
            config_script: config.config_script.clone(),
            sink: std::sync::Arc::new(sink),
        }
    }

    /// gem5 options, then the config script, then the script's own options
    pub fn args(&self, spec: &RunSpec) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            format!("--outdir={}", spec.output_directory.display()).into(),
            "--redirect-stdout".into(),
            "--redirect-stderr".into(),
            self.config_script.clone().into(),
            "--l1".into(),
            spec.size.clone().into(),
            "--maxinsts".into(),
            spec.max_insts.to_string().into(),
            "--progress".into(),
            spec.progress_hz.to_string().into(),
            "--cmd".into(),
            spec.command.clone().into(),
        ];
        // --options swallows everything after it
        if !spec.arguments.is_empty() {
            args.push("--options".into());
            args.extend(spec.arguments.iter().map(OsString::from));
        }
        args
    }

    pub fn command_line(&self, spec: &RunSpec) -> String {
        std::iter::once(self.binary.clone().into_os_string())
            .chain(self.args(spec))
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<String>>()
            .join(" ")
    }

    fn check_inputs(&self) -> anyhow::Result<()> {
        if !self.binary.is_file() {
            bail!("gem5 binary {} not found", self.binary.display());
        }
        std::fs::File::open(&self.config_script).with_context(|| {
            format!(
                "Cannot read gem5 config script {}",
                self.config_script.display()
            )
        })?;
        Ok(())
    }
}

/// Exit code of a finished child, a signal terminated child maps to 128 + signal
pub fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => -1,
    }
}

impl Simulator for Gem5 {
    fn run(&mut self, spec: &RunSpec) -> anyhow::Result<i32> {
        self.check_inputs()?;

        // gem5 truncates simout on start, a previous run's copy would be
        // mirrored and leave the reader past the new end of file
        let simout = get_simout_path(&spec.output_directory);
        match std::fs::remove_file(&simout) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
                log::debug!("Failed to remove {}: {}", simout.display(), err);
            }
            _ => {}
        }

        let sink = self.sink.clone();
        let _mirror = LogMirror::spawn(&simout, move |line| {
            sink(line)
        });

        log::debug!("Running {}", self.command_line(spec));
        let mut child = Command::new(&self.binary)
            .args(self.args(spec))
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch {}", self.binary.display()))?;
        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for {}", self.binary.display()))?;
        // _mirror is stopped and joined on drop, on every path out of here
        Ok(exit_code(status))
    }
}
