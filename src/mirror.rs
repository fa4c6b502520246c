use std::{
    fs::File,
    io::{BufRead, BufReader, Seek, SeekFrom},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
    time::Duration,
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tails a growing log file on a background thread and hands every line to a sink
///
/// The thread lives until `stop` is called or the mirror is dropped. The file
/// may not exist yet when the mirror starts. Read errors end the thread quietly.
pub struct LogMirror {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LogMirror {
    pub fn spawn<P, F>(path: P, sink: F) -> Self
    where
        P: AsRef<Path>,
        F: FnMut(&str) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let path = path.as_ref().to_path_buf();
        let thread_stop = stop.clone();
        let handle = std::thread::Builder::new()
            .name("log-mirror".to_string())
            .spawn(move || {
                if let Err(err) = tail(&path, &thread_stop, sink) {
                    log::debug!("Stopped mirroring {}: {}", path.display(), err);
                }
            });
        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::debug!("Failed to start log mirror: {}", err);
                None
            }
        };
        Self { stop, handle }
    }

    /// Signal the thread, wait for it to drain and exit
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::debug!("Log mirror thread panicked");
            }
        }
    }
}

impl Drop for LogMirror {
    fn drop(&mut self) {
        self.stop();
    }
}

fn wait_for_file(path: &Path, stop: &AtomicBool) -> std::io::Result<Option<File>> {
    loop {
        // check the flag first so a run that never created the file still ends
        let stopping = stop.load(Ordering::Acquire);
        match File::open(path) {
            Ok(file) => return Ok(Some(file)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if stopping {
                    return Ok(None);
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(err) => return Err(err),
        }
    }
}

fn tail<F: FnMut(&str)>(path: &Path, stop: &AtomicBool, mut sink: F) -> std::io::Result<()> {
    let Some(file) = wait_for_file(path, stop)? else {
        return Ok(());
    };
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let mut position = 0u64;
    loop {
        // read everything available after the stop flag was observed, then exit
        let stopping = stop.load(Ordering::Acquire);
        // the file was truncated under us, start over from the beginning
        if std::fs::metadata(path).is_ok_and(|meta| meta.len() < position) {
            reader.seek(SeekFrom::Start(0))?;
            position = 0;
            line.clear();
        }
        loop {
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            position += read as u64;
            if line.ends_with('\n') {
                sink(line.trim_end_matches(['\n', '\r']));
                line.clear();
            }
        }
        if stopping {
            if !line.is_empty() {
                sink(line.trim_end_matches('\r'));
            }
            return Ok(());
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io::Write, sync::Mutex};

    fn collector() -> (Arc<Mutex<Vec<String>>>, impl FnMut(&str) + Send + 'static) {
        let lines = Arc::new(Mutex::new(vec![]));
        let sink_lines = lines.clone();
        (lines, move |line: &str| {
            sink_lines.lock().unwrap().push(line.to_string())
        })
    }

    #[test]
    fn test_mirror_growing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simout");
        let (lines, sink) = collector();

        let mut mirror = LogMirror::spawn(&path, sink);
        // file appears after the mirror started
        std::thread::sleep(Duration::from_millis(150));
        let mut file = File::create(&path).unwrap();
        writeln!(file, "gem5 Simulator System.").unwrap();
        file.flush().unwrap();
        std::thread::sleep(Duration::from_millis(250));
        writeln!(file, "info: Entering event queue @ 0.  Starting simulation...").unwrap();
        write!(file, "Exiting @ tick 123 because exiting with last active thread context").unwrap();
        file.flush().unwrap();
        mirror.stop();

        assert_eq!(
            *lines.lock().unwrap(),
            vec![
                "gem5 Simulator System.",
                "info: Entering event queue @ 0.  Starting simulation...",
                "Exiting @ tick 123 because exiting with last active thread context",
            ]
        );
    }

    #[test]
    fn test_mirror_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simout");
        let old: String = (0..50).map(|i| format!("OLD line {}\n", i)).collect();
        std::fs::write(&path, old).unwrap();
        let (lines, sink) = collector();

        let mut mirror = LogMirror::spawn(&path, sink);
        std::thread::sleep(Duration::from_millis(250));
        // rewritten like gem5 does when it reopens simout
        std::fs::write(&path, "new run line\n").unwrap();
        std::thread::sleep(Duration::from_millis(250));
        mirror.stop();

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 51);
        assert_eq!(lines.last().unwrap(), "new run line");
    }

    #[test]
    fn test_mirror_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (lines, sink) = collector();
        let mut mirror = LogMirror::spawn(dir.path().join("never"), sink);
        std::thread::sleep(Duration::from_millis(50));
        mirror.stop();
        assert!(lines.lock().unwrap().is_empty());
    }

    #[test]
    fn test_drop_stops_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simout");
        std::fs::write(&path, "line one\nline two\n").unwrap();
        let (lines, sink) = collector();
        {
            let _mirror = LogMirror::spawn(&path, sink);
        }
        assert_eq!(*lines.lock().unwrap(), vec!["line one", "line two"]);
    }
}
