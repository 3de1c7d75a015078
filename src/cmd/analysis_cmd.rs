use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use clap::Args;
use log::info;
use log::LevelFilter;

use crate::command;
use crate::config::PipelineConfig;
use crate::config::DEFAULT_CONFIG_FILE;
use crate::params::BeginWith;
use crate::params::EntryPoint;
use crate::params::JoiningMethod;
use crate::params::MergeMethod;
use crate::params::ReferenceDatabase;
use crate::params::RunParams;
use crate::params::StageFolders;
use crate::params::StopAt;
use crate::runner::ExitPolicy;
use crate::runner::ProcessRunner;
use crate::runner::ToolRunner;
use crate::runtime;
use crate::utils;
use crate::workflow;
use crate::workflow::RunManifest;
use crate::workflow::Workflow;

pub const DEFAULT_TRIM_QUALITY: u32 = 10;
pub const DEFAULT_FASTQ_JOIN_P: u32 = 16;
pub const DEFAULT_QC_QUALITY: u32 = 19;
pub const DEFAULT_DEPTH: u32 = 10000;
pub const DEFAULT_THREADS: usize = 2;
pub const MAPPING_FILE: &str = "map.tsv";

#[derive(Args, Debug)]
pub struct AnalysisCMD {
    // Folder with paired-end FASTQ files (or fasta/OTU folder when beginning later)
    #[arg(short = 'i', value_parser = clap::value_parser!(PathBuf))]
    pub path_in: PathBuf,

    // Output folder. Must not exist
    #[arg(short = 'o', value_parser = clap::value_parser!(PathBuf))]
    pub path_out: PathBuf,

    // Begin with a later stage
    #[arg(short = 'b', value_enum)]
    pub begin_with: Option<BeginWith>,

    // Quality threshold for trimming
    #[arg(short = 't', default_value_t = DEFAULT_TRIM_QUALITY)]
    pub trim_quality: u32,

    // Stop after a stage
    #[arg(short = 's', value_enum)]
    pub stop_at: Option<StopAt>,

    // Method used to merge read pairs
    #[arg(short = 'j', value_enum, default_value = "fastq-join")]
    pub joining_method: JoiningMethod,

    // Maximum difference in percent, for fastq-join
    #[arg(short = 'd', default_value_t = DEFAULT_FASTQ_JOIN_P)]
    pub fastq_p: u32,

    // Quality threshold for quality control
    #[arg(short = 'q', default_value_t = DEFAULT_QC_QUALITY)]
    pub qc_quality: u32,

    // INI configuration file
    #[arg(short = 'c', value_parser = clap::value_parser!(PathBuf), default_value = DEFAULT_CONFIG_FILE)]
    pub path_config: PathBuf,

    // Mapping file. Generated from the sample names if not given
    #[arg(short = 'a', value_parser = clap::value_parser!(PathBuf))]
    pub path_mapping: Option<PathBuf>,

    // Parameter file for OTU picking. Generated from the configuration if not given
    #[arg(short = 'p', value_parser = clap::value_parser!(PathBuf))]
    pub path_parameter_file: Option<PathBuf>,

    // Number of cores, for the workers and for parallel QIIME jobs
    #[arg(short = 'n', value_parser = clap::value_parser!(usize), default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    // Fungal samples; use the UNITE database
    #[arg(short = 'f')]
    pub fungus: bool,

    // Use maxloose with bbmerge
    #[arg(short = 'm')]
    pub maxloose: bool,

    // Reference database
    #[arg(short = 'r', value_enum, default_value = "silva")]
    pub database: ReferenceDatabase,

    // Rarefaction depth for diversity analyses
    #[arg(short = 'e', default_value_t = DEFAULT_DEPTH)]
    pub depth: u32,

    // Continue an interrupted run in an existing output folder
    #[arg(long = "resume")]
    pub resume: bool,

    // Treat a non-zero exit of any external tool as fatal
    #[arg(long = "abort-on-tool-failure")]
    pub abort_on_tool_failure: bool,

    // Check that all external tools are available before starting
    #[arg(long = "check-tools")]
    pub check_tools: bool,
}

impl AnalysisCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let runner: Arc<dyn ToolRunner> = Arc::new(ProcessRunner::new());
        self.try_execute_with(runner)
    }

    /// Run the analysis, with the given way of invoking external tools
    pub fn try_execute_with(&self, runner: Arc<dyn ToolRunner>) -> Result<()> {
        let config = PipelineConfig::load(&self.path_config)?;
        let params = self.resolve_params(config)?;

        if params.path_out.exists() && !self.resume {
            bail!(
                "Output folder '{}' exists already. Refusing to overwrite it; use --resume to continue an interrupted run",
                params.path_out.display()
            );
        }
        if self.resume && !params.path_out.is_dir() {
            bail!("Cannot resume: output folder '{}' does not exist", params.path_out.display());
        }

        if self.check_tools {
            utils::check_tools(&workflow::required_tools(&params))?;
        }

        //Output folder layout, parameter file and log
        fs::create_dir_all(&params.folders.others)?;
        if self.path_parameter_file.is_none() {
            command::write_parameter_file(
                &params.path_parameter_file,
                params.database,
                &params.config,
                params.threads,
            )?;
        }
        runtime::setup_file_logger(&params.folders.others.join(runtime::LOG_FILE), LevelFilter::Debug)?;

        info!("started");
        for (key, value) in params.describe() {
            info!("{}: {}", key, value);
        }

        let path_manifest = params.folders.others.join(workflow::MANIFEST_FILE);
        let mut manifest = if self.resume {
            RunManifest::load(&path_manifest)?
        } else {
            RunManifest::create(&path_manifest)?
        };

        let params = Arc::new(params);
        Workflow::run(&params, &runner, &mut manifest)?;

        info!("Finished");
        println!("Analysis has finished!");
        Ok(())
    }

    /// Merge the command line with the configuration. No side effects
    pub fn resolve_params(&self, config: PipelineConfig) -> Result<RunParams> {
        let entry = EntryPoint::resolve(self.begin_with, self.stop_at);
        if entry == EntryPoint::DiversityAnalysis && self.path_mapping.is_none() {
            bail!("A mapping file (-a) is required to begin with diversity_analysis");
        }

        let threads = some_min1(self.threads)?;

        let path_in = utils::expand_and_resolve(&self.path_in)?;
        let path_out = utils::expand_and_resolve(&self.path_out)?;
        let folders = StageFolders::resolve(&path_out, &config.folders);

        let database = if self.fungus {
            ReferenceDatabase::Unite
        } else {
            self.database
        };

        let merge = match self.joining_method {
            JoiningMethod::FastqJoin => MergeMethod::FastqJoin {
                max_diff_percent: self.fastq_p,
            },
            JoiningMethod::BbMerge => MergeMethod::BbMerge {
                maxloose: self.maxloose,
            },
        };

        let run_id = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();

        let path_parameter_file = match &self.path_parameter_file {
            Some(p) => utils::expand_and_resolve(p)?,
            None => folders.others.join(format!("para{}.txt", run_id)),
        };

        let (path_mapping, generate_mapping) = match &self.path_mapping {
            Some(p) => (utils::expand_and_resolve(p)?, false),
            None => (folders.others.join(MAPPING_FILE), entry.can_generate_mapping()),
        };

        Ok(RunParams {
            run_id,
            path_in,
            path_out,
            folders,
            config,
            database,
            threads,
            trim_quality: self.trim_quality,
            merge,
            qc_quality: self.qc_quality,
            depth: self.depth,
            path_mapping,
            generate_mapping,
            path_parameter_file,
            entry,
            exit_policy: if self.abort_on_tool_failure {
                ExitPolicy::Abort
            } else {
                ExitPolicy::Continue
            },
        })
    }
}

pub fn some_min1(t: usize) -> Result<usize> {
    if t < 1 {
        bail!("Number of cores must be at least 1")
    } else {
        Ok(t)
    }
}
