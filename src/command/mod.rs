use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;

pub mod trim;
pub mod merge;
pub mod quality;
pub mod chimera;
pub mod otus;
pub mod diversity;
pub mod mapping;
pub mod parameters;

pub use trim::Trim;
pub use trim::TrimParams;

pub use merge::Merge;
pub use merge::MergeParams;

pub use quality::QualityControl;
pub use quality::QualityParams;

pub use chimera::ChimeraRemoval;
pub use chimera::ChimeraParams;

pub use otus::OtuPicking;
pub use otus::OtuParams;

pub use diversity::CoreDiversity;
pub use diversity::DiversityParams;

pub use mapping::write_mapping_file;
pub use parameters::write_parameter_file;


/// Create the output folder of a stage. It must not exist yet; an existing
/// folder means we would be writing into the leftovers of another run
pub fn create_stage_dir(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        bail!("Output folder '{}' exists already. For safety reasons, this is not allowed", path.display());
    }
    fs::create_dir(path).with_context(|| format!("Failed to create folder {}", path.display()))
}

/// For stages where the external tool creates its own output folder
pub fn ensure_absent(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        bail!("Output folder '{}' exists already. For safety reasons, this is not allowed", path.display());
    }
    Ok(())
}

/// `path` with `suffix` glued onto the file name, e.g. out.fastq + "join"
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

/// Name of the scratch folder used for one input file
pub fn scratch_dir(path_out: &Path, fname: &str) -> PathBuf {
    path_out.join(format!("temp{}", fname))
}
