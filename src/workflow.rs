use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use log::info;
use log::warn;
use serde::Deserialize;
use serde::Serialize;

use crate::command;
use crate::command::ChimeraParams;
use crate::command::ChimeraRemoval;
use crate::command::CoreDiversity;
use crate::command::DiversityParams;
use crate::command::Merge;
use crate::command::MergeParams;
use crate::command::OtuParams;
use crate::command::OtuPicking;
use crate::command::QualityControl;
use crate::command::QualityParams;
use crate::command::Trim;
use crate::command::TrimParams;
use crate::params::EntryPoint;
use crate::params::RunParams;
use crate::params::Stage;
use crate::runner::ToolRunner;

pub const MANIFEST_FILE: &str = "manifest.tsv";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Started,
    Completed,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
struct ManifestRecord {
    stage: String,
    status: StageStatus,
    timestamp: String,
}

/// Per-run record of which stages have started and finished.
/// Rewritten in full whenever a stage changes state
#[derive(Debug)]
pub struct RunManifest {
    path: PathBuf,
    records: Vec<ManifestRecord>,
}

impl RunManifest {
    pub fn create(path: &Path) -> anyhow::Result<RunManifest> {
        let manifest = RunManifest {
            path: path.to_path_buf(),
            records: Vec::new(),
        };
        manifest.save()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> anyhow::Result<RunManifest> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .with_context(|| format!("Could not open run manifest {}", path.display()))?;
        let mut records = Vec::new();
        for rec in reader.deserialize() {
            let rec: ManifestRecord = rec?;
            if Stage::from_name(&rec.stage).is_none() {
                anyhow::bail!("Unknown stage '{}' in run manifest {}", rec.stage, path.display());
            }
            records.push(rec);
        }
        Ok(RunManifest {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn status(&self, stage: Stage) -> Option<StageStatus> {
        self.records
            .iter()
            .find(|r| r.stage == stage.name())
            .map(|r| r.status)
    }

    pub fn is_completed(&self, stage: Stage) -> bool {
        self.status(stage) == Some(StageStatus::Completed)
    }

    pub fn mark(&mut self, stage: Stage, status: StageStatus) -> anyhow::Result<()> {
        let timestamp = chrono::Local::now().to_rfc3339();
        match self.records.iter_mut().find(|r| r.stage == stage.name()) {
            Some(r) => {
                r.status = status;
                r.timestamp = timestamp;
            }
            None => self.records.push(ManifestRecord {
                stage: stage.name().to_string(),
                status,
                timestamp,
            }),
        }
        self.save()
    }

    fn save(&self) -> anyhow::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(&self.path)
            .with_context(|| format!("Could not write run manifest {}", self.path.display()))?;
        if self.records.is_empty() {
            writer.write_record(["stage", "status", "timestamp"])?;
        }
        for r in &self.records {
            writer.serialize(r)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Runs the stages of the chosen entry point, one after the other
pub struct Workflow {}

impl Workflow {
    pub fn run(
        params: &Arc<RunParams>,
        runner: &Arc<dyn ToolRunner>,
        manifest: &mut RunManifest,
    ) -> anyhow::Result<()> {
        for stage in params.entry.stages() {
            if manifest.is_completed(stage) {
                info!("Skipping stage {}, already completed", stage);
                println!("Skipping {}, already completed", stage);
                continue;
            }

            //Leftovers of an interrupted attempt at this stage
            let path_out = params.folders.output_of(stage);
            if manifest.status(stage) == Some(StageStatus::Started) && path_out.exists() {
                warn!("Removing incomplete output of stage {}: {}", stage, path_out.display());
                fs::remove_dir_all(path_out)?;
            }

            if stage == Stage::Diversity && params.generate_mapping {
                let source = mapping_source(params);
                command::write_mapping_file(source, &params.path_mapping)?;
                info!("Wrote mapping file {}", params.path_mapping.display());
            }

            info!("Starting stage {}", stage);
            manifest.mark(stage, StageStatus::Started)?;
            run_stage(stage, params, runner).with_context(|| format!("Stage {} failed", stage))?;
            manifest.mark(stage, StageStatus::Completed)?;
            info!("Finished stage {}", stage);
        }
        Ok(())
    }
}

/// Folder whose per-sample files name the samples in the mapping file
pub fn mapping_source(params: &RunParams) -> &Path {
    match params.entry {
        EntryPoint::OtuPicking => &params.path_in,
        _ => &params.folders.quality,
    }
}

fn run_stage(stage: Stage, params: &RunParams, runner: &Arc<dyn ToolRunner>) -> anyhow::Result<()> {
    let runner = Arc::clone(runner);
    match stage {
        Stage::Trim => Trim::run(TrimParams::from_run(params), runner),
        Stage::Merge => Merge::run(MergeParams::from_run(params), runner),
        Stage::QualityControl => QualityControl::run(QualityParams::from_run(params), runner),
        Stage::ChimeraRemoval => ChimeraRemoval::run(ChimeraParams::from_run(params), runner),
        Stage::OtuPicking => OtuPicking::run(OtuParams::from_run(params), runner),
        Stage::Diversity => CoreDiversity::run(DiversityParams::from_run(params), runner),
    }
}

/// Programs needed to run the stages of an entry point
pub fn required_tools(params: &RunParams) -> Vec<&'static str> {
    let mut tools = Vec::new();
    for stage in params.entry.stages() {
        match stage {
            Stage::Trim => tools.push("bbduk.sh"),
            Stage::Merge => tools.push(match params.merge {
                crate::params::MergeMethod::FastqJoin { .. } => "fastq-join",
                crate::params::MergeMethod::BbMerge { .. } => "bbmerge.sh",
            }),
            Stage::QualityControl => tools.push("split_libraries_fastq.py"),
            Stage::ChimeraRemoval => {
                tools.push("identify_chimeric_seqs.py");
                tools.push("filter_fasta.py");
            }
            Stage::OtuPicking => {
                tools.push("pick_open_reference_otus.py");
                if !params.is_fungal() {
                    tools.push("filter_otus_from_otu_table.py");
                }
            }
            Stage::Diversity => tools.push("core_diversity_analyses.py"),
        }
    }
    tools
}
