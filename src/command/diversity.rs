use std::path::PathBuf;
use std::sync::Arc;

use crate::params::RunParams;
use crate::params::Stage;
use crate::runner::execute;
use crate::runner::ExitPolicy;
use crate::runner::ToolCommand;
use crate::runner::ToolRunner;

use super::ensure_absent;
use super::otus::OTU_TABLE;
use super::otus::OTU_TABLE_FUNGAL;
use super::otus::REP_SET_TREE;

#[derive(Clone, Debug)]
pub struct DiversityParams {
    /// Folder with the OTU picking results
    pub path_in: PathBuf,
    pub path_out: PathBuf,
    pub path_mapping: PathBuf,

    /// Rarefaction depth
    pub depth: u32,

    /// Fungal runs have no tree, so only non-phylogenetic metrics
    pub fungal: bool,

    pub exit_policy: ExitPolicy,
}

impl DiversityParams {
    pub fn from_run(run: &RunParams) -> DiversityParams {
        DiversityParams {
            path_in: run.input_of(Stage::Diversity).to_path_buf(),
            path_out: run.folders.diversity.clone(),
            path_mapping: run.path_mapping.clone(),
            depth: run.depth,
            fungal: run.is_fungal(),
            exit_policy: run.exit_policy,
        }
    }
}

pub struct CoreDiversity {}

impl CoreDiversity {
    pub fn run(params: DiversityParams, runner: Arc<dyn ToolRunner>) -> anyhow::Result<()> {
        ensure_absent(&params.path_out)?;

        println!("Core diversity analyses...");
        let cmd = diversity_command(&params);
        execute(runner.as_ref(), &cmd, params.exit_policy)?;
        println!("Core diversity analyses finished.");
        Ok(())
    }
}

pub fn diversity_command(params: &DiversityParams) -> ToolCommand {
    let biom = if params.fungal { OTU_TABLE_FUNGAL } else { OTU_TABLE };
    let cmd = ToolCommand::new("core_diversity_analyses.py")
        .arg("-i")
        .arg(params.path_in.join(biom))
        .arg("-o")
        .arg(&params.path_out)
        .arg("-m")
        .arg(&params.path_mapping);
    if params.fungal {
        cmd.arg("-e")
            .arg(params.depth.to_string())
            .arg("--nonphylogenetic_diversity")
    } else {
        cmd.arg("-t")
            .arg(params.path_in.join(REP_SET_TREE))
            .arg("-e")
            .arg(params.depth.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(fungal: bool) -> DiversityParams {
        DiversityParams {
            path_in: PathBuf::from("/otus"),
            path_out: PathBuf::from("/div"),
            path_mapping: PathBuf::from("/others/map.tsv"),
            depth: 10000,
            fungal,
            exit_policy: ExitPolicy::Continue,
        }
    }

    #[test]
    fn test_bacterial_diversity() {
        assert_eq!(
            diversity_command(&params(false)).to_string(),
            "core_diversity_analyses.py -i /otus/otu_table_mc2_w_tax_no_pynast_failures.biom -o /div -m /others/map.tsv -t /otus/rep_set.tre -e 10000"
        );
    }

    #[test]
    fn test_fungal_diversity() {
        assert_eq!(
            diversity_command(&params(true)).to_string(),
            "core_diversity_analyses.py -i /otus/otu_table_mc2_w_tax.biom -o /div -m /others/map.tsv -e 10000 --nonphylogenetic_diversity"
        );
    }
}
