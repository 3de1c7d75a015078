use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use log::warn;

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

/// QC always runs on this many workers, independent of the core count
pub const QC_WORKERS: usize = 5;

#[derive(Clone, Debug)]
pub struct QualityParams {
    pub path_in: PathBuf,
    pub path_out: PathBuf,
    pub qc_quality: u32,
    pub exit_policy: ExitPolicy,
}

impl QualityParams {
    pub fn from_run(run: &RunParams) -> QualityParams {
        QualityParams {
            path_in: run.input_of(Stage::QualityControl).to_path_buf(),
            path_out: run.folders.quality.clone(),
            qc_quality: run.qc_quality,
            exit_policy: run.exit_policy,
        }
    }
}

/// Quality-filters merged reads into one fasta file per sample with split_libraries_fastq.py.
/// Everything but the sequences is thrown away
pub struct QualityControl {}

impl QualityControl {
    pub fn run(params: QualityParams, runner: Arc<dyn ToolRunner>) -> anyhow::Result<()> {
        let files = samples::list_files_sorted(&params.path_in)?;
        create_stage_dir(&params.path_out)?;

        let params = Arc::new(params);
        run_parallel(QC_WORKERS, files, move |fname: String| {
            println!("Quality control: {}", fname);
            let path_scratch = scratch_dir(&params.path_out, &fname);
            let cmd = quality_command(&params, &fname, &path_scratch);
            execute(runner.as_ref(), &cmd, params.exit_policy)?;

            let path_seqs = path_scratch.join("seqs.fna");
            if path_seqs.exists() {
                fs::rename(&path_seqs, params.path_out.join(samples::fasta_name(&fname)))?;
            } else {
                warn!("No sequences were produced for {}", fname);
            }
            _ = fs::remove_dir_all(&path_scratch);
            Ok(())
        })?;
        println!("Quality control finished.");
        Ok(())
    }
}

pub fn quality_command(params: &QualityParams, fname: &str, path_scratch: &Path) -> ToolCommand {
    ToolCommand::new("split_libraries_fastq.py")
        .arg("-i")
        .arg(params.path_in.join(fname))
        .arg("-o")
        .arg(path_scratch)
        .arg("--barcode_type")
        .arg("not-barcoded")
        .arg("--sample_ids")
        .arg(samples::qc_sample_id(fname))
        .arg("-q")
        .arg(params.qc_quality.to_string())
}
