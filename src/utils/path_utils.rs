use anyhow::{Context, Result};
use path_clean::PathClean;
use std::env;
use std::path::{Path, PathBuf};

/// Make a path absolute and lexically clean. Does NOT require the path to exist
pub fn expand_and_resolve<P: AsRef<Path>>(input: P) -> Result<PathBuf> {
    let input = input.as_ref();
    let abs = if input.is_absolute() {
        input.to_path_buf()
    } else {
        env::current_dir()
            .context("Failed to get current directory")?
            .join(input)
    };
    Ok(abs.clean())
}
