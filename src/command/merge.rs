use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use log::warn;

use crate::params::MergeMethod;
use crate::params::RunParams;
use crate::params::Stage;
use crate::pool::run_parallel;
use crate::runner::execute;
use crate::runner::ExitPolicy;
use crate::runner::ToolCommand;
use crate::runner::ToolRunner;
use crate::samples;
use crate::samples::ReadPair;

use super::create_stage_dir;
use super::with_suffix;

#[derive(Clone, Debug)]
pub struct MergeParams {
    pub path_in: PathBuf,
    pub path_out: PathBuf,
    pub method: MergeMethod,
    pub threads_work: usize,
    pub exit_policy: ExitPolicy,
}

impl MergeParams {
    pub fn from_run(run: &RunParams) -> MergeParams {
        MergeParams {
            path_in: run.input_of(Stage::Merge).to_path_buf(),
            path_out: run.folders.merged.clone(),
            method: run.merge,
            threads_work: run.threads,
            exit_policy: run.exit_policy,
        }
    }
}

/// Merges read pairs into single reads, with either fastq-join or BBMerge
pub struct Merge {}

impl Merge {
    pub fn run(params: MergeParams, runner: Arc<dyn ToolRunner>) -> anyhow::Result<()> {
        let pairs = samples::list_read_pairs(&params.path_in)?;
        create_stage_dir(&params.path_out)?;

        println!("Merging ...");
        let params = Arc::new(params);
        run_parallel(params.threads_work, pairs, move |pair: ReadPair| {
            println!("Merging: {} and {}", pair.r1, pair.r2);
            let path_merged = params.path_out.join(pair.merged_name());
            let cmd = merge_command(&params, &pair, &path_merged);
            execute(runner.as_ref(), &cmd, params.exit_policy)?;

            if let MergeMethod::FastqJoin { .. } = params.method {
                tidy_fastq_join_output(&path_merged)?;
            }
            Ok(())
        })?;
        println!("Merging finished.");
        Ok(())
    }
}

pub fn merge_command(params: &MergeParams, pair: &ReadPair, path_merged: &Path) -> ToolCommand {
    let in1 = params.path_in.join(&pair.r1);
    let in2 = params.path_in.join(&pair.r2);
    match params.method {
        MergeMethod::FastqJoin { max_diff_percent } => ToolCommand::new("fastq-join")
            .arg("-p")
            .arg(max_diff_percent.to_string())
            .arg(in1)
            .arg(in2)
            .arg("-o")
            .arg(path_merged),
        MergeMethod::BbMerge { maxloose } => {
            let cmd = ToolCommand::new("bbmerge.sh")
                .arg_eq("-in1", in1)
                .arg_eq("-in2", in2)
                .arg_eq("-out", path_merged);
            let cmd = if maxloose { cmd.arg("-maxloose=t") } else { cmd };
            cmd.arg("-ignorebadquality")
        }
    }
}

/// fastq-join writes <out>join plus the unjoined <out>un1 and <out>un2.
/// Keep only the joined reads, under the plain output name
fn tidy_fastq_join_output(path_merged: &Path) -> anyhow::Result<()> {
    _ = fs::remove_file(with_suffix(path_merged, "un1"));
    _ = fs::remove_file(with_suffix(path_merged, "un2"));

    let path_joined = with_suffix(path_merged, "join");
    if path_joined.exists() {
        fs::rename(&path_joined, path_merged)?;
    } else {
        warn!("fastq-join produced no joined reads at {}", path_joined.display());
    }
    Ok(())
}
