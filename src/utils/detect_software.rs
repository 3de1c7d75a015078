use log::debug;
use log::info;
use std::process::Command;
use std::process::Stdio;
use anyhow::bail;
use itertools::Itertools;

/// Check that a program can be spawned at all. Exit status is irrelevant,
/// most of these tools exit non-zero when called without arguments
pub fn can_spawn(program: &str) -> bool {
    debug!("Checking for {}", program);
    let spawned = Command::new(program)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if spawned.is_ok() {
        info!("Found {}", program);
        true
    } else {
        false
    }
}

/// Fail if any of the given programs is not installed or not in PATH
pub fn check_tools(programs: &[&str]) -> anyhow::Result<()> {
    let missing = programs
        .iter()
        .copied()
        .unique()
        .filter(|p| !can_spawn(p))
        .join(", ");
    if missing.is_empty() {
        Ok(())
    } else {
        bail!("The following tools are either not installed or not in PATH: {}", missing)
    }
}
