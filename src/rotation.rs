//! File naming, the rotation decision and the file handles that back
//! RELEASE mode.
//!
//! A rotation walks every active [`FileSlot`], opens the file named for the
//! current day, closes whatever the slot held before and installs the new
//! handle. The caller owns the decision of what to do when an open fails.
use {
    crate::{DayLogError, DayLogMeta, Severity},
    chrono::{DateTime, Days, FixedOffset, NaiveTime},
    std::{
        fs,
        io::{self, Write as _},
        path::{Path, PathBuf},
    },
};

#[cfg(unix)]
use std::os::{
    fd::{AsRawFd, IntoRawFd, RawFd},
    unix::fs::OpenOptionsExt,
};

/// An on-disk destination.
///
/// In combined mode the single [`FileSlot::Combined`] slot serves info,
/// warning and error alike. Otherwise every severity has a slot of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileSlot {
    Combined,
    Info,
    Warn,
    Err,
}

impl FileSlot {
    const COMBINED: [FileSlot; 1] = [FileSlot::Combined];
    const SPLIT: [FileSlot; 3] = [FileSlot::Info, FileSlot::Warn, FileSlot::Err];

    /// The slots a logger with the given layout keeps open.
    pub(crate) fn active(all_in_one: bool) -> &'static [FileSlot] {
        if all_in_one {
            &Self::COMBINED
        } else {
            &Self::SPLIT
        }
    }

    /// The slot a severity writes to. Debug shares the info slot, although
    /// RELEASE mode never writes debug lines.
    pub(crate) fn for_severity(severity: Severity, all_in_one: bool) -> Self {
        if all_in_one {
            return FileSlot::Combined;
        }
        match severity {
            Severity::Debug | Severity::Info => FileSlot::Info,
            Severity::Warning => FileSlot::Warn,
            Severity::Error => FileSlot::Err,
        }
    }

    /// The severity segment of the file name.
    fn tag(self) -> Option<&'static str> {
        match self {
            FileSlot::Combined => None,
            FileSlot::Info => Some("info"),
            FileSlot::Warn => Some("warn"),
            FileSlot::Err => Some("err"),
        }
    }

    fn index(self) -> usize {
        match self {
            FileSlot::Combined | FileSlot::Info => 0,
            FileSlot::Warn => 1,
            FileSlot::Err => 2,
        }
    }

    /// Standard descriptors this slot takes over when stream redirection is
    /// enabled.
    #[cfg(unix)]
    fn std_fds(self) -> &'static [RawFd] {
        use nix::libc::{STDERR_FILENO, STDOUT_FILENO};
        match self {
            FileSlot::Combined => &[STDOUT_FILENO, STDERR_FILENO],
            FileSlot::Info => &[STDOUT_FILENO],
            FileSlot::Warn => &[],
            FileSlot::Err => &[STDERR_FILENO],
        }
    }
}

/// Build the file name for a slot on the calendar day of `now`.
///
/// # Arguments
/// * `prefix` - Optional file name prefix. An empty prefix is ignored.
/// * `slot` - The destination being named.
/// * `now` - The instant whose date goes into the name.
/// # Returns
/// `{prefix-}{date}.log` for the combined slot, `{prefix-}{tag}-{date}.log`
/// otherwise, e.g. `myapp-info-2024-01-01.log`.
pub(crate) fn file_name(prefix: Option<&str>, slot: FileSlot, now: &DateTime<FixedOffset>) -> String {
    let mut name = String::new();
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        name.push_str(prefix);
        name.push('-');
    }
    if let Some(tag) = slot.tag() {
        name.push_str(tag);
        name.push('-');
    }
    format!("{name}{}.log", now.format("%Y-%m-%d"))
}

/// Midnight of the calendar day of `now`, in the same offset.
#[allow(deprecated)]
pub(crate) fn start_of_day(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    DateTime::<FixedOffset>::from_local(now.date_naive().and_time(NaiveTime::default()), *now.offset())
}

/// Decide whether the current file set may keep receiving lines.
///
/// The set is valid while the calendar date of `now` is before the date of
/// the baseline plus `interval_days` and every tracked file still exists.
/// Dates are compared rather than instants, so an offset change between the
/// baseline and `now` does not move the day boundary. A missing baseline
/// means nothing has been opened yet.
pub(crate) fn files_valid(
    now: &DateTime<FixedOffset>,
    last_rotation: Option<DateTime<FixedOffset>>,
    interval_days: u32,
    files: &LogFiles,
    all_in_one: bool,
) -> bool {
    let within_interval = last_rotation
        .and_then(|baseline| baseline.date_naive().checked_add_days(Days::new(interval_days.into())))
        .is_some_and(|due| now.date_naive() < due);
    within_interval && files.all_exist(all_in_one)
}

/// An open log file together with the path it was opened at.
#[derive(Debug)]
pub(crate) struct LogFile {
    path: PathBuf,
    file: fs::File,
}

impl LogFile {
    /// Open `path` for appending, creating it with `file_mode` when absent.
    /// An existing file from earlier in the day is appended to, never
    /// truncated.
    pub(crate) fn open(path: PathBuf, file_mode: u32) -> Result<Self, DayLogError> {
        let mut open_options = fs::OpenOptions::new();
        open_options.read(true).append(true).create(true);
        #[cfg(unix)]
        open_options.mode(file_mode);
        #[cfg(not(unix))]
        let _ = file_mode;

        let file = open_options
            .open(&path)
            .map_err(|err| DayLogError::CreateFileFailed(path.clone(), err.to_string()))?;
        Ok(Self { path, file })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Close the handle and report the result of the close itself, which a
    /// plain drop would discard.
    pub(crate) fn close(self) -> io::Result<()> {
        #[cfg(unix)]
        {
            nix::unistd::close(self.file.into_raw_fd()).map_err(io::Error::from)
        }
        #[cfg(not(unix))]
        {
            drop(self.file);
            Ok(())
        }
    }

    /// Point the standard descriptors owned by `slot` at this file.
    #[cfg(unix)]
    fn redirect_std_streams(&self, slot: FileSlot) {
        let fds = slot.std_fds();
        if fds.is_empty() {
            return;
        }
        // Whatever is still buffered belongs to the previous destination.
        let _ = io::stdout().flush();
        for &fd in fds {
            if let Err(err) = nix::unistd::dup2(self.file.as_raw_fd(), fd) {
                tracing::warn!(fd, path = %self.path.display(), %err, "failed to redirect standard stream");
            }
        }
    }

    #[cfg(not(unix))]
    fn redirect_std_streams(&self, _slot: FileSlot) {
        tracing::warn!("redirecting standard streams is not supported on this platform");
    }
}

impl io::Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// The handles currently installed in RELEASE mode, one per [`FileSlot`]
/// index. Combined mode only ever fills the first.
#[derive(Debug, Default)]
pub(crate) struct LogFiles {
    slots: [Option<LogFile>; 3],
}

impl LogFiles {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get_mut(&mut self, slot: FileSlot) -> Option<&mut LogFile> {
        self.slots[slot.index()].as_mut()
    }

    pub(crate) fn path(&self, slot: FileSlot) -> Option<&Path> {
        self.slots[slot.index()].as_ref().map(LogFile::path)
    }

    /// Every active slot holds a file that is still present on disk. An
    /// empty slot counts as missing.
    pub(crate) fn all_exist(&self, all_in_one: bool) -> bool {
        FileSlot::active(all_in_one)
            .iter()
            .all(|slot| self.path(*slot).is_some_and(Path::exists))
    }

    /// Open the files for the day of `now` and swap them into place.
    ///
    /// Slots are rotated in order. Each new file is opened before the old
    /// handle of that slot is closed. A failure to close is written into the
    /// new file and otherwise ignored.
    ///
    /// # Arguments
    /// * `meta` - Directory, naming and permission settings.
    /// * `now` - The instant whose calendar day names the files.
    /// # Returns
    /// `Err` on the first file that cannot be opened. Slots rotated before the
    /// failure keep their new handles and the failed slot keeps its old one.
    pub(crate) fn rotate(&mut self, meta: &DayLogMeta, now: &DateTime<FixedOffset>) -> Result<(), DayLogError> {
        for &slot in FileSlot::active(meta.all_in_one) {
            let path = meta
                .directory
                .join(file_name(meta.file_prefix.as_deref(), slot, now));
            let mut new_file = LogFile::open(path, meta.file_mode)?;

            if let Some(old_file) = self.slots[slot.index()].take() {
                let old_path = old_file.path().to_path_buf();
                if let Err(err) = old_file.close() {
                    tracing::warn!(path = %old_path.display(), %err, "failed to close expired log file");
                    let _ = new_file.write_all(close_failure_note(&err).as_bytes());
                }
            }

            if meta.redirect_std_streams {
                new_file.redirect_std_streams(slot);
            }

            tracing::debug!(path = %new_file.path().display(), "opened log file");
            self.slots[slot.index()] = Some(new_file);
        }
        Ok(())
    }
}

/// The line left in a freshly opened file when its predecessor failed to
/// close.
fn close_failure_note(err: &io::Error) -> String {
    format!("Close expired log file err: {err}\n")
}
