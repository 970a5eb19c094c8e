use daylog::{DayLogBuilder, OnRotationFailure};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // One file per week, shared by every severity: weekly-2025-04-01.log
    let log = DayLogBuilder::release("./logs/")
        .file_prefix("weekly")
        .all_in_one(true)
        .new_file_interval(7)
        .on_rotation_failure(OnRotationFailure::KeepPrevious)
        .build()?;

    for error_code in &[500, 502, 503, 504] {
        daylog::error!(log, "Error {error_code}: Server encountered an internal error");
        daylog::println_err!(log, "  at processRequest (server.rs:42)");
        daylog::println_err!(log, "  at handleConnection (network.rs:121)");
        daylog::println_err!(log, "--------------------");
    }

    // Debug mode sends everything to stderr instead.
    daylog::debug!("process-wide console logger");
    Ok(())
}
