use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use log::LevelFilter;

pub const LOG_FILE: &str = "log.txt";

/// Send all log records to a file. Each record is a timestamped header line
/// followed by the message. The sink is shared by all worker threads
pub fn setup_file_logger(path: &Path, level: LevelFilter) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let result = env_logger::Builder::new()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {} \n {}",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        })
        .try_init();

    if result.is_err() {
        //Only the first run in a process gets to install the logger
        eprintln!("Logger already set up; not redirecting to {}", path.display());
    }
    Ok(())
}
