// src/source/log_tail.rs
//! Miner log tailing adapter
//!
//! A reader thread follows the log like `tail -f`: it opens the file, jumps
//! to the end and picks up each new line as it is written. Truncation rewinds
//! to the start; when the path is rotated to a new file, the new file is
//! opened and read from its start. Matching lines update the latest rate;
//! `poll` only ever reads that value.

use super::{HashrateSource, no_data};
use crate::types::SampleSource;
use crate::utils::error::TelemetryError;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs::{File, Metadata};
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

const LABEL: &str = "cpuminer log";

/// Pause between reads once the end of the file is reached
const IDLE_SLEEP: Duration = Duration::from_millis(500);

/// Pause before reopening a missing or unreadable file
const REOPEN_BACKOFF: Duration = Duration::from_secs(1);

lazy_static! {
    /// `thread 0: 2097152 hashes, 245.3 khash/s`, `... 1.25 MH/s`
    static ref CPUMINER_RATE_RE: Regex = Regex::new(
        r"(?i)(?:thread\s+\d+:\s+)?[\d,]+\s+hashes,\s*([\d.]+)\s*(khash/s|Mhash/s|kH/s|MH/s)"
    )
    .expect("hashrate pattern is valid");
}

/// Extracts a hashrate in H/s from one log line
///
/// Lets other miners' log formats be plugged into [`LogTailSource`].
pub trait RateParser: Send + Sync {
    /// Returns the rate reported on `line`, if any
    fn parse_rate(&self, line: &str) -> Option<f64>;
}

/// Parser for cpuminer's per-thread and total rate lines
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuminerRateParser;

impl RateParser for CpuminerRateParser {
    fn parse_rate(&self, line: &str) -> Option<f64> {
        let caps = CPUMINER_RATE_RE.captures(line)?;
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str().to_lowercase();
        let scale = if unit.starts_with('m') { 1e6 } else { 1e3 };
        Some(value * scale)
    }
}

/// Follows a miner log file on a background thread
///
/// The thread stops when [`stop`](Self::stop) is called or the source is
/// dropped, within about half a second.
pub struct LogTailSource {
    path: PathBuf,
    latest_hz: Arc<Mutex<f64>>,
    stop: Arc<AtomicBool>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl LogTailSource {
    /// Starts following `path`
    ///
    /// The file does not need to exist yet; the reader keeps retrying.
    pub fn spawn(path: impl Into<PathBuf>, parser: Box<dyn RateParser>) -> Self {
        let path = path.into();
        let latest_hz = Arc::new(Mutex::new(0.0));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let path = path.clone();
            let latest_hz = latest_hz.clone();
            let stop = stop.clone();
            thread::Builder::new()
                .name("log-tail".into())
                .spawn(move || follow_loop(&path, parser.as_ref(), &latest_hz, &stop))
                .map_err(|e| log::error!("Could not start log reader: {}", e))
                .ok()
        };

        LogTailSource {
            path,
            latest_hz,
            stop,
            handle: Mutex::new(handle),
        }
    }

    /// File being followed
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stops the reader thread and waits for it
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl Drop for LogTailSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl HashrateSource for LogTailSource {
    fn kind(&self) -> SampleSource {
        SampleSource::LogTail
    }

    fn poll(&self) -> (f64, String) {
        let hz = *self.latest_hz.lock().unwrap_or_else(PoisonError::into_inner);
        if hz > 0.0 {
            (hz, LABEL.to_string())
        } else {
            (0.0, no_data(LABEL))
        }
    }
}

fn follow_loop(path: &Path, parser: &dyn RateParser, latest_hz: &Mutex<f64>, stop: &AtomicBool) {
    // History present at startup is skipped; anything opened later is new.
    let mut from_start = false;
    while !stop.load(Ordering::Relaxed) {
        let result = File::open(path)
            .map_err(TelemetryError::from)
            .and_then(|file| follow(file, path, from_start, parser, latest_hz, stop));
        if let Err(e) = result {
            log::debug!("Log tail on {} waiting: {}", path.display(), e);
            thread::sleep(REOPEN_BACKOFF);
        }
        from_start = true;
    }
}

/// Reads lines appended to `file` until stopped, rotated away or an I/O
/// error occurs
fn follow(
    file: File,
    path: &Path,
    from_start: bool,
    parser: &dyn RateParser,
    latest_hz: &Mutex<f64>,
    stop: &AtomicBool,
) -> Result<(), TelemetryError> {
    let mut reader = BufReader::new(file);
    if !from_start {
        reader.seek(SeekFrom::End(0))?;
    }
    log::info!("Following {}", path.display());

    let mut line = Vec::new();
    while !stop.load(Ordering::Relaxed) {
        if reader.read_until(b'\n', &mut line)? == 0 || line.last() != Some(&b'\n') {
            // at EOF, possibly holding a partial line
            match file_state(&mut reader, path)? {
                FileState::Current => {}
                FileState::Truncated => {
                    log::info!("{} was truncated, reading from the start", path.display());
                    reader.seek(SeekFrom::Start(0))?;
                    line.clear();
                }
                FileState::Replaced => {
                    log::info!("{} was rotated, reopening", path.display());
                    return Ok(());
                }
            }
            thread::sleep(IDLE_SLEEP);
            continue;
        }

        if let Some(hz) = parser.parse_rate(&String::from_utf8_lossy(&line)) {
            *latest_hz.lock().unwrap_or_else(PoisonError::into_inner) = hz;
        }
        line.clear();
    }

    Ok(())
}

/// How the open handle relates to the file now at the followed path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileState {
    Current,
    /// Same file, now shorter than our position
    Truncated,
    /// A different file sits at the path
    Replaced,
}

fn file_state(reader: &mut BufReader<File>, path: &Path) -> Result<FileState, TelemetryError> {
    let open = reader.get_ref().metadata()?;
    match std::fs::metadata(path) {
        Ok(at_path) if !same_file(&open, &at_path) => return Ok(FileState::Replaced),
        Ok(_) => {}
        // Renamed away and not recreated yet; the miner may still write to
        // the old file.
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    if open.len() < reader.stream_position()? {
        Ok(FileState::Truncated)
    } else {
        Ok(FileState::Current)
    }
}

#[cfg(unix)]
fn same_file(a: &Metadata, b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

// Without inode numbers only truncation is detected.
#[cfg(not(unix))]
fn same_file(_a: &Metadata, _b: &Metadata) -> bool {
    true
}
