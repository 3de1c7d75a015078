use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;

use crate::params::RunParams;
use crate::params::Stage;
use crate::runner::execute;
use crate::runner::ExitPolicy;
use crate::runner::ToolCommand;
use crate::runner::ToolRunner;
use crate::samples;

use super::ensure_absent;

pub const OTU_TABLE: &str = "otu_table_mc2_w_tax_no_pynast_failures.biom";
pub const OTU_TABLE_FUNGAL: &str = "otu_table_mc2_w_tax.biom";
pub const OTU_TABLE_CLOSED_REF: &str = "otu_table_mc2_w_tax_no_pynast_failures_close_reference.biom";
pub const REP_SET_TREE: &str = "rep_set.tre";

#[derive(Clone, Debug)]
pub struct OtuParams {
    pub path_in: PathBuf,
    pub path_out: PathBuf,
    pub path_parameter_file: PathBuf,

    /// Reference sequences. Fungal runs take theirs from the parameter file
    pub reference_seqs: Option<String>,

    pub threads_work: usize,
    pub exit_policy: ExitPolicy,
}

impl OtuParams {
    pub fn from_run(run: &RunParams) -> OtuParams {
        let reference_seqs = if run.is_fungal() {
            None
        } else {
            Some(run.reference_files().reference_seqs.clone())
        };
        OtuParams {
            path_in: run.input_of(Stage::OtuPicking).to_path_buf(),
            path_out: run.folders.otus.clone(),
            path_parameter_file: run.path_parameter_file.clone(),
            reference_seqs,
            threads_work: run.threads,
            exit_policy: run.exit_policy,
        }
    }
}

/// Open-reference OTU picking over all samples at once. For the bacterial
/// databases, reference-only OTUs are then filtered out of the table
pub struct OtuPicking {}

impl OtuPicking {
    pub fn run(params: OtuParams, runner: Arc<dyn ToolRunner>) -> anyhow::Result<()> {
        let inputs = fasta_inputs(&params.path_in)?;
        ensure_absent(&params.path_out)?;

        println!("Otu picking...");
        let cmd = pick_command(&params, &inputs);
        execute(runner.as_ref(), &cmd, params.exit_policy)?;

        if let Some(cmd) = filter_command(&params) {
            execute(runner.as_ref(), &cmd, params.exit_policy)?;
        }
        println!("Otu picking finished.");
        Ok(())
    }
}

fn fasta_inputs(path_in: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let inputs: Vec<PathBuf> = samples::list_fasta_files(path_in)?
        .into_iter()
        .map(|f| path_in.join(f))
        .collect();
    if inputs.is_empty() {
        bail!("No .fasta files found in {}", path_in.display());
    }
    Ok(inputs)
}

pub fn pick_command(params: &OtuParams, inputs: &[PathBuf]) -> ToolCommand {
    let mut input_list = OsString::new();
    for (i, p) in inputs.iter().enumerate() {
        if i > 0 {
            input_list.push(",");
        }
        input_list.push(p);
    }

    let cmd = ToolCommand::new("pick_open_reference_otus.py")
        .arg("-i")
        .arg(input_list)
        .arg("-o")
        .arg(&params.path_out)
        .arg("-p")
        .arg(&params.path_parameter_file);
    let cmd = match &params.reference_seqs {
        Some(r) => cmd.arg("-r").arg(r),
        None => cmd,
    };
    let cmd = cmd
        .arg("-a")
        .arg("-O")
        .arg(params.threads_work.to_string());
    if params.reference_seqs.is_none() {
        cmd.arg("--suppress_align_and_tree")
    } else {
        cmd
    }
}

/// Keep only OTUs that are not in the reference set. Not done for fungal runs
pub fn filter_command(params: &OtuParams) -> Option<ToolCommand> {
    let reference_seqs = params.reference_seqs.as_ref()?;
    Some(
        ToolCommand::new("filter_otus_from_otu_table.py")
            .arg("-i")
            .arg(params.path_out.join(OTU_TABLE))
            .arg("-o")
            .arg(params.path_out.join(OTU_TABLE_CLOSED_REF))
            .arg("--negate_ids_to_exclude")
            .arg("-e")
            .arg(reference_seqs),
    )
}
