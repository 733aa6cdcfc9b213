/// Process logger: env_logger filtering plus an in-memory ring, a log file
/// and a broadcast feed for `/logs/stream`.
use env_logger::{Logger, Target};
use log::{Log, Metadata, Record, SetLoggerError};
use printboard_core::identity::now_iso;
use serde::Serialize;
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, OnceLock, PoisonError};
use tokio::sync::broadcast;

const MAX_LOG_ENTRIES: usize = 2000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    fn line(&self) -> String {
        format!(
            "{} [{}] [{}] {}",
            self.timestamp,
            self.level.to_uppercase(),
            self.target,
            self.message.replace('\n', "\\n")
        )
    }
}

struct LogHub {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
    tx: broadcast::Sender<LogEntry>,
}

impl LogHub {
    fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(512);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            tx,
        }
    }

    fn push(&self, entry: LogEntry) {
        {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.push_back(entry.clone());
            while entries.len() > self.capacity {
                entries.pop_front();
            }
        }
        let _ = self.tx.send(entry);
    }

    fn recent(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

static LOG_HUB: LazyLock<LogHub> = LazyLock::new(|| LogHub::new(MAX_LOG_ENTRIES));

struct LogFile {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl LogFile {
    fn open(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn append(&self, entry: &LogEntry) {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            match Self::open(&self.path) {
                Ok(file) => *guard = Some(file),
                Err(_) => return,
            }
        }
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(file, "{}", entry.line());
            let _ = file.flush();
        }
    }
}

static LOG_FILE: OnceLock<LogFile> = OnceLock::new();

fn dispatch(entry: LogEntry) {
    if let Some(file) = LOG_FILE.get() {
        file.append(&entry);
    }
    LOG_HUB.push(entry);
}

struct BroadcastLogger {
    inner: Logger,
}

impl Log for BroadcastLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, rec: &Record<'_>) {
        if !self.enabled(rec.metadata()) {
            return;
        }
        dispatch(LogEntry {
            timestamp: now_iso(),
            level: rec.level().to_string().to_lowercase(),
            target: rec.target().to_string(),
            message: rec.args().to_string(),
        });
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the logger. `RUST_LOG` controls the filter (default `warn`).
pub fn init(log_path: PathBuf) -> Result<(), SetLoggerError> {
    let file = LogFile::open(&log_path).ok();
    let _ = LOG_FILE.set(LogFile {
        path: log_path,
        file: Mutex::new(file),
    });

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.target(Target::Pipe(Box::new(io::sink())));
    let logger = Box::leak(Box::new(BroadcastLogger {
        inner: builder.build(),
    }));
    log::set_logger(logger)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

pub fn recent_entries() -> Vec<LogEntry> {
    LOG_HUB.recent()
}

pub fn subscribe() -> broadcast::Receiver<LogEntry> {
    LOG_HUB.tx.subscribe()
}

pub fn log_file_path() -> Option<String> {
    LOG_FILE.get().map(|f| f.path.display().to_string())
}

/// Record a line without going through `log`, for when the logger itself
/// failed to install.
pub fn write_fallback_line(message: &str) {
    dispatch(LogEntry {
        timestamp: now_iso(),
        level: "error".to_string(),
        target: "printboard.log_bridge".to_string(),
        message: message.to_string(),
    });
}
