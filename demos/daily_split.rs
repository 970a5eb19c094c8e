use daylog::{DayLogBuilder, TimeZone};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log = DayLogBuilder::release("./logs")
        .file_prefix("daily")
        .new_file_interval(1) // daily-info-2025-04-01.log, daily-warn-..., daily-err-...
        .time_zone(TimeZone::UTC) // Roll over at UTC midnight
        .file_mode(0o750)
        .build()?;

    daylog::info!(log, "System startup - UTC dates will be used for file names");
    daylog::info!(log, "Configuration loaded successfully");
    daylog::warning!(log, "Cache directory missing, starting cold");
    daylog::error!(log, "Upstream {} refused the connection", "db-1");
    daylog::debug!(log, "Dropped: debug lines never reach release files");

    Ok(())
}
