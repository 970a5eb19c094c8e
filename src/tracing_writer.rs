//! Use a [`DayLog`] as the writer of a `tracing_subscriber::fmt` layer.
//!
//! Events are routed by level: ERROR to the error file, WARN to the warning
//! file, INFO to the info file, DEBUG and TRACE to the debug destination
//! (which only exists in debug mode). Each event is written as formatted by
//! the subscriber, without a daylog header.
//!
//! ```
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let log = daylog::DayLogBuilder::release(dir.path()).build().unwrap();
//! let _guard = tracing_subscriber::fmt()
//!     .with_writer(log)
//!     .with_ansi(false)
//!     .finish()
//!     .set_default();
//!
//! tracing::warn!("lands in warn-<date>.log");
//! ```
use {
    crate::{DayLog, Severity, SeverityWriter},
    tracing::{Level, Metadata},
    tracing_subscriber::fmt::MakeWriter,
};

fn severity_of(level: &Level) -> Severity {
    match *level {
        Level::ERROR => Severity::Error,
        Level::WARN => Severity::Warning,
        Level::INFO => Severity::Info,
        _ => Severity::Debug,
    }
}

impl<'a> MakeWriter<'a> for DayLog {
    type Writer = SeverityWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer(Severity::Info)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        self.writer(severity_of(meta.level()))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::DayLogBuilder,
        std::fs,
        tracing_subscriber::util::SubscriberInitExt,
    };

    #[test]
    fn levels_map_to_severities() {
        assert_eq!(severity_of(&Level::ERROR), Severity::Error);
        assert_eq!(severity_of(&Level::WARN), Severity::Warning);
        assert_eq!(severity_of(&Level::INFO), Severity::Info);
        assert_eq!(severity_of(&Level::DEBUG), Severity::Debug);
        assert_eq!(severity_of(&Level::TRACE), Severity::Debug);
    }

    #[test]
    fn events_land_in_their_files() {
        let dir = tempfile::tempdir().unwrap();
        let log = DayLogBuilder::release(dir.path()).file_prefix("trc").build().unwrap();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log)
            .with_ansi(false)
            .with_max_level(Level::TRACE)
            .finish();

        {
            let _guard = subscriber.set_default();
            tracing::warn!("disk almost full");
            tracing::error!("disk full");
            tracing::debug!("dropped in release mode");
        }

        let mut warn_file = None;
        let mut err_file = None;
        for entry in fs::read_dir(dir.path()).unwrap().flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with("trc-warn-") {
                warn_file = Some(fs::read_to_string(entry.path()).unwrap());
            } else if name.starts_with("trc-err-") {
                err_file = Some(fs::read_to_string(entry.path()).unwrap());
            }
        }
        let warn_file = warn_file.unwrap();
        let err_file = err_file.unwrap();
        assert!(warn_file.contains("disk almost full"));
        assert!(err_file.contains("disk full"));
        assert!(!err_file.contains("almost"));
        assert!(!warn_file.contains("dropped") && !err_file.contains("dropped"));
    }
}
