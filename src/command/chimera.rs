use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use crate::params::RunParams;
use crate::params::Stage;
use crate::pool::run_parallel;
use crate::runner::execute;
use crate::runner::ExitPolicy;
use crate::runner::ToolCommand;
use crate::runner::ToolRunner;
use crate::samples;

use super::create_stage_dir;
use super::scratch_dir;

#[derive(Clone, Debug)]
pub struct ChimeraParams {
    pub path_in: PathBuf,
    pub path_out: PathBuf,

    /// Reference sequences for usearch61 chimera detection
    pub chimera_reference: String,

    pub threads_work: usize,
    pub exit_policy: ExitPolicy,
}

impl ChimeraParams {
    pub fn from_run(run: &RunParams) -> ChimeraParams {
        ChimeraParams {
            path_in: run.input_of(Stage::ChimeraRemoval).to_path_buf(),
            path_out: run.folders.chimera.clone(),
            chimera_reference: run.chimera_reference().to_string(),
            threads_work: run.threads,
            exit_policy: run.exit_policy,
        }
    }
}

/// Flags chimeric sequences of each sample, then keeps only the non-chimeric ones
pub struct ChimeraRemoval {}

impl ChimeraRemoval {
    pub fn run(params: ChimeraParams, runner: Arc<dyn ToolRunner>) -> anyhow::Result<()> {
        let files = samples::list_files_sorted(&params.path_in)?;
        create_stage_dir(&params.path_out)?;

        let params = Arc::new(params);
        run_parallel(params.threads_work, files, move |fname: String| {
            println!("Chimera removal: {}", fname);
            let path_scratch = scratch_dir(&params.path_out, &fname);
            let path_flags = path_scratch.join(&fname);

            let cmd = identify_command(&params, &fname, &path_flags);
            execute(runner.as_ref(), &cmd, params.exit_policy)?;

            let cmd = filter_command(&params, &fname, &path_flags);
            execute(runner.as_ref(), &cmd, params.exit_policy)?;

            _ = fs::remove_dir_all(&path_scratch);
            Ok(())
        })?;
        println!("Chimera removal finished.");
        Ok(())
    }
}

pub fn identify_command(params: &ChimeraParams, fname: &str, path_flags: &Path) -> ToolCommand {
    ToolCommand::new("identify_chimeric_seqs.py")
        .arg("-i")
        .arg(params.path_in.join(fname))
        .arg("-m")
        .arg("usearch61")
        .arg("-o")
        .arg(path_flags)
        .arg("-r")
        .arg(&params.chimera_reference)
}

pub fn filter_command(params: &ChimeraParams, fname: &str, path_flags: &Path) -> ToolCommand {
    ToolCommand::new("filter_fasta.py")
        .arg("-f")
        .arg(params.path_in.join(fname))
        .arg("-o")
        .arg(params.path_out.join(fname))
        .arg("-s")
        .arg(path_flags.join("non_chimeras.txt"))
}
