//! # daylog
//!
//! daylog is a leveled logger with two modes. In **debug mode** every line
//! goes to standard error. In **release mode** lines go to files that are
//! named after the calendar day and rolled over after a configurable number
//! of days. Info, warning and error lines can share one file or each get a
//! file of their own. Debug lines are only ever emitted in debug mode.
//!
//! Every header line carries the severity, a millisecond timestamp and the
//! name of the function that logged it:
//!
//! ```text
//! [INFO]    | 24/03/05 - 13:04:05.123 | [handle_request] value=42
//! [WARNING] | 24/03/05 - 13:04:05.124 | [handle_request] slow backend
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use daylog::{DayLogBuilder, TimeZone};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let log = DayLogBuilder::release("./logs")
//!         .file_prefix("myapp")
//!         .new_file_interval(1) // myapp-info-2025-04-01.log, myapp-warn-..., myapp-err-...
//!         .file_mode(0o750)
//!         .time_zone(TimeZone::Local)
//!         .build()?;
//!
//!     daylog::info!(log, "server listening on port {}", 8080);
//!     daylog::warning!(log, "config file missing, using defaults");
//!     daylog::println_err!(log, "raw line without a header");
//!
//!     // The process-wide instance logs to stderr.
//!     daylog::debug!("only visible in debug mode");
//!     Ok(())
//! }
//! ```
use {
    chrono::{DateTime, FixedOffset, Local, Utc},
    rotation::{FileSlot, LogFiles},
    std::{
        cell::Cell,
        fmt, fs,
        io::{self, Write},
        path::{Path, PathBuf},
        sync::{Mutex, MutexGuard, OnceLock, PoisonError},
    },
};

#[cfg(unix)]
use std::{
    ffi::OsStr,
    os::unix::{ffi::OsStrExt, fs::DirBuilderExt},
};

mod caller;
mod macros;
mod rotation;
#[cfg(feature = "tracing")]
mod tracing_writer;

/// Selects where a [`DayLog`] writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Everything, debug lines included, goes to the console writer
    /// (standard error unless configured otherwise). No file is ever opened.
    Debug,
    /// Info, warning and error lines go to day-rotated files. Debug lines
    /// are discarded.
    Release,
}

/// The four fixed severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    /// The leading column of a header line, padded so the timestamps align.
    fn header_label(self) -> &'static str {
        match self {
            Severity::Debug => "[DEBUG]   | ",
            Severity::Info => "[INFO]    | ",
            Severity::Warning => "[WARNING] | ",
            Severity::Error => "[ERROR]   | ",
        }
    }
}

/// Specifies the time zone used for file dates, day boundaries and header
/// timestamps.
///
/// # Examples
/// ```
/// use daylog::TimeZone;
/// use chrono::FixedOffset;
///
/// let utc = TimeZone::UTC;
/// let local = TimeZone::Local;
/// // Roll over at midnight UTC+8 wherever the process runs.
/// let china = TimeZone::Fix(FixedOffset::east_opt(8 * 3600).unwrap());
/// ```
#[derive(Debug, Clone)]
pub enum TimeZone {
    /// Use UTC.
    UTC,
    /// Use the system's local time zone. The offset is looked up on every
    /// call, so daylight saving changes move the day boundary with them.
    Local,
    /// Use a fixed offset.
    Fix(FixedOffset),
}

impl TimeZone {
    /// Express `instant` in this time zone.
    fn at(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            TimeZone::UTC => instant.fixed_offset(),
            TimeZone::Local => instant.with_timezone(&Local).fixed_offset(),
            TimeZone::Fix(fixed_offset) => instant.with_timezone(fixed_offset),
        }
    }
}

/// What happens when a rotation cannot open a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnRotationFailure {
    /// Panic. A logger that cannot guarantee a destination stops the caller
    /// rather than letting it run blind.
    #[default]
    Panic,
    /// Report the failure through `tracing`, keep writing to the previous
    /// file and retry on the next call. Lines that have no previous file go
    /// to standard error.
    KeepPrevious,
}

/// Configuration of a logger. Fixed once [`DayLogBuilder::build`] returns.
#[derive(Debug, Clone)]
struct DayLogMeta {
    /// Where release-mode files live, without a trailing separator.
    directory: PathBuf,
    mode: Mode,
    /// Optional prefix placed in front of every file name.
    file_prefix: Option<String>,
    /// Info, warning and error share a single file.
    all_in_one: bool,
    /// Number of calendar days a file set stays current.
    new_file_interval: u32,
    /// Unix mode bits for the directory and the files it creates.
    file_mode: u32,
    time_zone: TimeZone,
    /// Point stdout/stderr at the log files on every rotation.
    redirect_std_streams: bool,
    on_rotation_failure: OnRotationFailure,
}

impl DayLogMeta {
    fn new(mode: Mode) -> Self {
        DayLogMeta {
            directory: PathBuf::new(),
            mode,
            file_prefix: None,
            all_in_one: false,
            new_file_interval: 1,
            file_mode: 0o755,
            time_zone: TimeZone::Local,
            redirect_std_streams: false,
            on_rotation_failure: OnRotationFailure::Panic,
        }
    }

    /// Get the current time in the configured time zone.
    fn now(&self) -> DateTime<FixedOffset> {
        self.time_zone.at(Utc::now())
    }

    /// Reject release settings that cannot produce a usable file set.
    fn validate(&self) -> Result<(), DayLogError> {
        if self.directory.as_os_str().is_empty() {
            return Err(DayLogError::Configuration("log directory must not be empty".to_string()));
        }
        if self.file_mode == 0 {
            return Err(DayLogError::Configuration("file mode must not be zero".to_string()));
        }
        if self.new_file_interval == 0 {
            return Err(DayLogError::Configuration(
                "new file interval must be at least one day".to_string(),
            ));
        }
        Ok(())
    }

    /// Create the log directory and its parents if it does not exist yet.
    fn prepare_directory(&self) -> Result<(), DayLogError> {
        if self.directory.exists() {
            return Ok(());
        }
        let mut dir_builder = fs::DirBuilder::new();
        dir_builder.recursive(true);
        #[cfg(unix)]
        dir_builder.mode(self.file_mode);
        dir_builder
            .create(&self.directory)
            .map_err(|err| DayLogError::CreateDirectoryFailed(self.directory.clone(), err.to_string()))?;
        tracing::debug!(directory = %self.directory.display(), "created log directory");
        Ok(())
    }

    /// Rotate the file set if it is no longer valid at `now`.
    ///
    /// Must be called with the state lock held, so that the check, the swap
    /// of handles and the new baseline are seen together.
    fn check_rotation(&self, state: &mut DayLogState, now: &DateTime<FixedOffset>) {
        let Sinks::Files(files) = &mut state.sinks else {
            return;
        };
        if rotation::files_valid(now, state.last_rotation, self.new_file_interval, files, self.all_in_one) {
            return;
        }
        match files.rotate(self, now) {
            Ok(()) => {
                state.last_rotation = Some(rotation::start_of_day(*now));
                tracing::debug!(directory = %self.directory.display(), "rotated log files");
            }
            Err(err) => match self.on_rotation_failure {
                OnRotationFailure::Panic => {
                    tracing::error!(%err, "log rotation failed");
                    panic!("failed to rotate log files: {err}");
                }
                OnRotationFailure::KeepPrevious => {
                    tracing::error!(%err, "log rotation failed, keeping previous log files");
                }
            },
        }
    }
}

/// Strip a single trailing separator, leaving a bare root alone.
#[cfg(unix)]
fn normalize_directory(directory: &Path) -> PathBuf {
    match directory.as_os_str().as_bytes().split_last() {
        Some((b'/', rest)) if !rest.is_empty() => PathBuf::from(OsStr::from_bytes(rest)),
        _ => directory.to_path_buf(),
    }
}

#[cfg(not(unix))]
fn normalize_directory(directory: &Path) -> PathBuf {
    match directory.to_str() {
        Some(raw) if raw.len() > 1 && raw.ends_with(std::path::is_separator) => {
            PathBuf::from(&raw[..raw.len() - 1])
        }
        _ => directory.to_path_buf(),
    }
}

/// Where lines end up.
enum Sinks {
    /// Debug mode: one writer for every severity.
    Console(Box<dyn Write + Send>),
    /// Release mode: the current file set.
    Files(LogFiles),
}

/// Mutable state of a logger, guarded by its mutex.
struct DayLogState {
    /// Midnight of the day the current file set was opened.
    last_rotation: Option<DateTime<FixedOffset>>,
    sinks: Sinks,
}

impl DayLogState {
    fn new(sinks: Sinks) -> Self {
        DayLogState {
            last_rotation: None,
            sinks,
        }
    }

    /// The writer a severity resolves to, if one is installed.
    fn sink(&mut self, severity: Severity, all_in_one: bool) -> Option<&mut dyn Write> {
        match &mut self.sinks {
            Sinks::Console(writer) => Some(writer.as_mut()),
            Sinks::Files(files) => files
                .get_mut(FileSlot::for_severity(severity, all_in_one))
                .map(|file| file as &mut dyn Write),
        }
    }
}

/// A leveled logger writing to the console or to day-rotated files.
///
/// All methods take `&self`; a `DayLog` can be shared between threads.
/// Rotation and writing happen under one lock, so no caller ever writes to
/// a handle that another caller has just closed.
pub struct DayLog {
    meta: DayLogMeta,
    state: Mutex<DayLogState>,
}

impl DayLog {
    /// A ready-to-use debug mode logger writing to standard error.
    pub fn console() -> Self {
        DayLog {
            meta: DayLogMeta::new(Mode::Debug),
            state: Mutex::new(DayLogState::new(Sinks::Console(Box::new(io::stderr())))),
        }
    }

    pub fn mode(&self) -> Mode {
        self.meta.mode
    }

    /// The normalized log directory. Empty in debug mode unless one was set.
    pub fn directory(&self) -> &Path {
        &self.meta.directory
    }

    /// Log a debug line. Does nothing in release mode.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Debug, args);
    }

    /// Log an info line.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Info, args);
    }

    /// Log a warning line.
    pub fn warning(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Warning, args);
    }

    /// Log an error line.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Error, args);
    }

    /// Write `args` and a newline to the info destination, without a header.
    pub fn println_info(&self, args: fmt::Arguments<'_>) {
        self.println(Severity::Info, args);
    }

    /// Write `args` and a newline to the warning destination, without a
    /// header.
    pub fn println_warning(&self, args: fmt::Arguments<'_>) {
        self.println(Severity::Warning, args);
    }

    /// Write `args` and a newline to the error destination, without a
    /// header.
    pub fn println_err(&self, args: fmt::Arguments<'_>) {
        self.println(Severity::Error, args);
    }

    /// An [`io::Write`] handle that sends raw bytes to the destination of
    /// `severity`, rotating first when needed.
    ///
    /// # Examples
    /// ```
    /// use std::io::Write;
    ///
    /// let log = daylog::DayLog::console();
    /// writeln!(log.writer(daylog::Severity::Warning), "disk 91% full").unwrap();
    /// ```
    pub fn writer(&self, severity: Severity) -> SeverityWriter<'_> {
        SeverityWriter { log: self, severity }
    }

    /// The file currently bound to `severity`. `None` in debug mode and
    /// before the first line has been logged.
    pub fn file_path(&self, severity: Severity) -> Option<PathBuf> {
        let state = self.lock_state();
        match &state.sinks {
            Sinks::Console(_) => None,
            Sinks::Files(files) => files
                .path(FileSlot::for_severity(severity, self.meta.all_in_one))
                .map(Path::to_path_buf),
        }
    }

    fn log(&self, severity: Severity, args: fmt::Arguments<'_>) {
        if !self.accepts(severity) {
            return;
        }
        let caller = caller::resolve();
        let now = self.meta.now();
        let line = format_line(severity, &now, &caller, args);
        let _ = self.emit_at(severity, &now, line.as_bytes());
    }

    fn println(&self, severity: Severity, args: fmt::Arguments<'_>) {
        let now = self.meta.now();
        let _ = self.emit_at(severity, &now, format!("{args}\n").as_bytes());
    }

    /// Debug lines only pass in debug mode.
    fn accepts(&self, severity: Severity) -> bool {
        severity != Severity::Debug || self.meta.mode == Mode::Debug
    }

    /// Rotate if needed, then write `bytes` to the destination of `severity`.
    fn emit_at(&self, severity: Severity, now: &DateTime<FixedOffset>, bytes: &[u8]) -> io::Result<()> {
        if !self.accepts(severity) {
            return Ok(());
        }
        let Some(_emitting) = EmitGuard::enter() else {
            return io::stderr().write_all(bytes);
        };
        let mut state = self.lock_state();
        if severity != Severity::Debug {
            self.meta.check_rotation(&mut state, now);
        }
        match state.sink(severity, self.meta.all_in_one) {
            Some(sink) => sink.write_all(bytes),
            None => io::stderr().write_all(bytes),
        }
    }

    fn flush_sink(&self, severity: Severity) -> io::Result<()> {
        let Some(_emitting) = EmitGuard::enter() else {
            return Ok(());
        };
        let mut state = self.lock_state();
        match state.sink(severity, self.meta.all_in_one) {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, DayLogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

thread_local! {
    static EMITTING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as holding a logger's state lock.
///
/// Rotation reports through `tracing`, and a subscriber may write back into
/// a `DayLog`. Such nested writes go to standard error instead of waiting on
/// the lock this thread already holds.
struct EmitGuard;

impl EmitGuard {
    fn enter() -> Option<Self> {
        EMITTING.with(|emitting| (!emitting.replace(true)).then(|| EmitGuard))
    }
}

impl Drop for EmitGuard {
    fn drop(&mut self) {
        EMITTING.with(|emitting| emitting.set(false));
    }
}

impl fmt::Debug for DayLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DayLog")
            .field("mode", &self.meta.mode)
            .field("directory", &self.meta.directory)
            .field("all_in_one", &self.meta.all_in_one)
            .finish_non_exhaustive()
    }
}

/// Render a header line: `"[LEVEL]   | YY/MM/DD - HH:MM:SS.mmm | [caller] message\n"`.
fn format_line(severity: Severity, now: &DateTime<FixedOffset>, caller: &str, args: fmt::Arguments<'_>) -> String {
    format!(
        "{}{} | [{caller}] {args}\n",
        severity.header_label(),
        now.format("%y/%m/%d - %H:%M:%S%.3f")
    )
}

/// Raw writer for one severity of a [`DayLog`], see [`DayLog::writer`].
pub struct SeverityWriter<'a> {
    log: &'a DayLog,
    severity: Severity,
}

impl io::Write for SeverityWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.log.emit_at(self.severity, &self.log.meta.now(), buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.log.flush_sink(self.severity)
    }
}

static GLOBAL: OnceLock<DayLog> = OnceLock::new();

/// The process-wide logger used by the macros when no logger is given.
///
/// Created on first use with [`DayLog::console`] and never reconfigured
/// afterwards. Applications that want files build their own [`DayLog`].
pub fn global() -> &'static DayLog {
    GLOBAL.get_or_init(DayLog::console)
}

/// Errors that can occur when building a logger.
#[derive(Debug, thiserror::Error)]
pub enum DayLogError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Failed to create directory '{0}': {1}")]
    CreateDirectoryFailed(PathBuf, String),
    #[error("Failed to create file '{0}': {1}")]
    CreateFileFailed(PathBuf, String),
}

/// Provides a fluent interface for configuring [`DayLog`] instances.
///
/// Building is the initialization step. In release mode it checks that a
/// directory, a non-zero file mode and a non-zero interval are set, and
/// creates the directory when missing. Files are opened lazily by the first
/// info, warning or error line.
///
/// # Default Configuration
///
/// * No file prefix
/// * One file per severity
/// * A new file set every day
/// * File mode `0o755` for the directory and the files
/// * Local system time zone
/// * Standard streams left alone
/// * Panic when a rotation cannot open a file
///
/// # Examples
///
/// ```rust
/// use daylog::{DayLogBuilder, OnRotationFailure, TimeZone};
///
/// let dir = tempfile::tempdir().unwrap();
/// let log = DayLogBuilder::release(dir.path())
///     .file_prefix("api")
///     .all_in_one(true) // api-2025-04-01.log
///     .new_file_interval(7)
///     .time_zone(TimeZone::UTC)
///     .on_rotation_failure(OnRotationFailure::KeepPrevious)
///     .build()
///     .unwrap();
/// log.info(format_args!("ready"));
/// ```
pub struct DayLogBuilder {
    meta: DayLogMeta,
    console: Option<Box<dyn Write + Send>>,
}

impl DayLogBuilder {
    /// Create a builder for the given mode.
    pub fn new(mode: Mode) -> Self {
        DayLogBuilder {
            meta: DayLogMeta::new(mode),
            console: None,
        }
    }

    /// Create a release mode builder writing under `directory`.
    pub fn release<P: AsRef<Path>>(directory: P) -> Self {
        Self::new(Mode::Release).directory(directory)
    }

    /// Set the directory for release-mode files.
    pub fn directory<P: AsRef<Path>>(self, directory: P) -> Self {
        Self {
            meta: DayLogMeta {
                directory: directory.as_ref().to_path_buf(),
                ..self.meta
            },
            ..self
        }
    }

    /// Set the prefix of every file name, e.g. `myapp` for
    /// `myapp-info-2025-04-01.log`.
    pub fn file_prefix<S: Into<String>>(self, prefix: S) -> Self {
        Self {
            meta: DayLogMeta {
                file_prefix: Some(prefix.into()),
                ..self.meta
            },
            ..self
        }
    }

    /// Write info, warning and error lines to a single file.
    pub fn all_in_one(self, all_in_one: bool) -> Self {
        Self {
            meta: DayLogMeta { all_in_one, ..self.meta },
            ..self
        }
    }

    /// Set how many calendar days a file set stays current.
    pub fn new_file_interval(self, days: u32) -> Self {
        Self {
            meta: DayLogMeta {
                new_file_interval: days,
                ..self.meta
            },
            ..self
        }
    }

    /// Set the mode bits used when creating the directory and the files
    /// (Unix-like systems only), e.g. `0o750`.
    pub fn file_mode(self, mode: u32) -> Self {
        Self {
            meta: DayLogMeta {
                file_mode: mode,
                ..self.meta
            },
            ..self
        }
    }

    /// Set the time zone for file dates and header timestamps.
    pub fn time_zone(self, time_zone: TimeZone) -> Self {
        Self {
            meta: DayLogMeta {
                time_zone,
                ..self.meta
            },
            ..self
        }
    }

    /// Also point the process's stdout and stderr at the log files on every
    /// rotation, so output from other code is captured too. The combined
    /// file takes both streams; otherwise stdout goes to the info file and
    /// stderr to the error file. Unix only.
    pub fn redirect_std_streams(self, redirect: bool) -> Self {
        Self {
            meta: DayLogMeta {
                redirect_std_streams: redirect,
                ..self.meta
            },
            ..self
        }
    }

    /// Choose what happens when a rotation cannot open a file.
    pub fn on_rotation_failure(self, policy: OnRotationFailure) -> Self {
        Self {
            meta: DayLogMeta {
                on_rotation_failure: policy,
                ..self.meta
            },
            ..self
        }
    }

    /// Replace standard error as the debug mode destination.
    pub fn console_writer<W: Write + Send + 'static>(self, writer: W) -> Self {
        Self {
            console: Some(Box::new(writer)),
            ..self
        }
    }

    /// Build the logger.
    pub fn build(self) -> Result<DayLog, DayLogError> {
        let mut meta = self.meta;
        let sinks = match meta.mode {
            Mode::Debug => Sinks::Console(self.console.unwrap_or_else(|| Box::new(io::stderr()))),
            Mode::Release => {
                meta.validate()?;
                meta.directory = normalize_directory(&meta.directory);
                #[cfg(not(unix))]
                tracing::warn!("file modes are not supported on this platform and will be ignored");
                meta.prepare_directory()?;
                Sinks::Files(LogFiles::new())
            }
        };
        Ok(DayLog {
            meta,
            state: Mutex::new(DayLogState::new(sinks)),
        })
    }
}
