//! Formatting front-ends for [`DayLog`](crate::DayLog).
//!
//! Every macro takes either a logger followed by format arguments, or just
//! the format arguments, in which case the line goes to
//! [`global()`](crate::global).
//!
//! ```
//! let log = daylog::DayLog::console();
//! daylog::info!(log, "value={}", 42);
//! daylog::error!("no logger given, {} goes to the global one", "this");
//! ```

/// Log a debug line. Discarded in release mode.
#[macro_export]
macro_rules! debug {
    ($fmt:literal $($arg:tt)*) => {
        $crate::global().debug(::std::format_args!($fmt $($arg)*))
    };
    ($log:expr, $($arg:tt)+) => {
        $log.debug(::std::format_args!($($arg)+))
    };
}

/// Log an info line.
#[macro_export]
macro_rules! info {
    ($fmt:literal $($arg:tt)*) => {
        $crate::global().info(::std::format_args!($fmt $($arg)*))
    };
    ($log:expr, $($arg:tt)+) => {
        $log.info(::std::format_args!($($arg)+))
    };
}

/// Log a warning line.
#[macro_export]
macro_rules! warning {
    ($fmt:literal $($arg:tt)*) => {
        $crate::global().warning(::std::format_args!($fmt $($arg)*))
    };
    ($log:expr, $($arg:tt)+) => {
        $log.warning(::std::format_args!($($arg)+))
    };
}

/// Log an error line.
#[macro_export]
macro_rules! error {
    ($fmt:literal $($arg:tt)*) => {
        $crate::global().error(::std::format_args!($fmt $($arg)*))
    };
    ($log:expr, $($arg:tt)+) => {
        $log.error(::std::format_args!($($arg)+))
    };
}

/// Write a line without header to the info destination.
#[macro_export]
macro_rules! println_info {
    ($fmt:literal $($arg:tt)*) => {
        $crate::global().println_info(::std::format_args!($fmt $($arg)*))
    };
    ($log:expr, $($arg:tt)+) => {
        $log.println_info(::std::format_args!($($arg)+))
    };
}

/// Write a line without header to the warning destination.
#[macro_export]
macro_rules! println_warning {
    ($fmt:literal $($arg:tt)*) => {
        $crate::global().println_warning(::std::format_args!($fmt $($arg)*))
    };
    ($log:expr, $($arg:tt)+) => {
        $log.println_warning(::std::format_args!($($arg)+))
    };
}

/// Write a line without header to the error destination.
#[macro_export]
macro_rules! println_err {
    ($fmt:literal $($arg:tt)*) => {
        $crate::global().println_err(::std::format_args!($fmt $($arg)*))
    };
    ($log:expr, $($arg:tt)+) => {
        $log.println_err(::std::format_args!($($arg)+))
    };
}
