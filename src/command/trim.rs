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
use crate::samples::ReadPair;

use super::create_stage_dir;

#[derive(Clone, Debug)]
pub struct TrimParams {
    pub path_in: PathBuf,
    pub path_out: PathBuf,

    /// Quality threshold for right-side trimming
    pub trim_quality: u32,

    pub threads_work: usize,
    pub exit_policy: ExitPolicy,
}

impl TrimParams {
    pub fn from_run(run: &RunParams) -> TrimParams {
        TrimParams {
            path_in: run.input_of(Stage::Trim).to_path_buf(),
            path_out: run.folders.trimmed.clone(),
            trim_quality: run.trim_quality,
            threads_work: run.threads,
            exit_policy: run.exit_policy,
        }
    }
}

/// Quality-trims both reads of every pair together, using BBDuk
pub struct Trim {}

impl Trim {
    pub fn run(params: TrimParams, runner: Arc<dyn ToolRunner>) -> anyhow::Result<()> {
        let pairs = samples::list_read_pairs(&params.path_in)?;
        create_stage_dir(&params.path_out)?;

        println!("Trimming...");
        let params = Arc::new(params);
        run_parallel(params.threads_work, pairs, move |pair: ReadPair| {
            println!("{} and {}", pair.r1, pair.r2);
            let cmd = trim_command(&params, &pair);
            execute(runner.as_ref(), &cmd, params.exit_policy)?;
            Ok(())
        })?;
        println!("Trimming finished.");
        Ok(())
    }
}

/// Trimmed reads keep their file names
pub fn trim_command(params: &TrimParams, pair: &ReadPair) -> ToolCommand {
    ToolCommand::new("bbduk.sh")
        .arg("-Xmx1000m")
        .arg_eq("-in1", params.path_in.join(&pair.r1))
        .arg_eq("-in2", params.path_in.join(&pair.r2))
        .arg_eq("-out1", params.path_out.join(&pair.r1))
        .arg_eq("-out2", params.path_out.join(&pair.r2))
        .arg("-qtrim=r")
        .arg(format!("-trimq={}", params.trim_quality))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_command() {
        let params = TrimParams {
            path_in: PathBuf::from("/in"),
            path_out: PathBuf::from("/out/trimmed"),
            trim_quality: 12,
            threads_work: 2,
            exit_policy: ExitPolicy::Continue,
        };
        let pair = ReadPair {
            r1: "s1_S1_L001_R1_001.fastq".to_string(),
            r2: "s1_S1_L001_R2_001.fastq".to_string(),
        };
        assert_eq!(
            trim_command(&params, &pair).to_string(),
            "bbduk.sh -Xmx1000m -in1=/in/s1_S1_L001_R1_001.fastq -in2=/in/s1_S1_L001_R2_001.fastq \
             -out1=/out/trimmed/s1_S1_L001_R1_001.fastq -out2=/out/trimmed/s1_S1_L001_R2_001.fastq \
             -qtrim=r -trimq=12"
        );
    }
}
