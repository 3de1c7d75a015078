use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use clap::ValueEnum;

use crate::config::FolderNames;
use crate::config::PipelineConfig;
use crate::config::ReferenceFiles;
use crate::runner::ExitPolicy;

/// Reference database used for chimera detection and taxonomy
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReferenceDatabase {
    Silva,
    #[value(alias = "gg")]
    Greengenes,
    /// Fungal ITS database
    Unite,
}

impl ReferenceDatabase {
    pub fn is_fungal(&self) -> bool {
        *self == ReferenceDatabase::Unite
    }

    pub fn files<'a>(&self, cfg: &'a PipelineConfig) -> &'a ReferenceFiles {
        match self {
            ReferenceDatabase::Silva => &cfg.silva,
            ReferenceDatabase::Greengenes => &cfg.gg,
            ReferenceDatabase::Unite => &cfg.unite,
        }
    }

    /// Only SILVA has its own chimera reference; everything else uses the GG one
    pub fn chimera_reference<'a>(&self, cfg: &'a PipelineConfig) -> &'a str {
        match self {
            ReferenceDatabase::Silva => &cfg.chimera.silva,
            _ => &cfg.chimera.gg,
        }
    }
}

impl fmt::Display for ReferenceDatabase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ReferenceDatabase::Silva => "silva",
            ReferenceDatabase::Greengenes => "greengenes",
            ReferenceDatabase::Unite => "unite",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum JoiningMethod {
    #[value(name = "fastq-join")]
    FastqJoin,
    #[value(name = "bbmerge")]
    BbMerge,
}

/// Pair merger, with the one parameter each of them takes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeMethod {
    FastqJoin { max_diff_percent: u32 },
    BbMerge { maxloose: bool },
}

impl fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MergeMethod::FastqJoin { max_diff_percent } => {
                write!(f, "fastq-join (p={})", max_diff_percent)
            }
            MergeMethod::BbMerge { maxloose } => write!(f, "bbmerge (maxloose={})", maxloose),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BeginWith {
    #[value(name = "otu_picking")]
    OtuPicking,
    #[value(name = "diversity_analysis")]
    DiversityAnalysis,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StopAt {
    #[value(name = "chimera_removal")]
    ChimeraRemoval,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Trim,
    Merge,
    QualityControl,
    ChimeraRemoval,
    OtuPicking,
    Diversity,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Trim => "trim",
            Stage::Merge => "merge",
            Stage::QualityControl => "quality_control",
            Stage::ChimeraRemoval => "chimera_removal",
            Stage::OtuPicking => "otu_picking",
            Stage::Diversity => "diversity_analysis",
        }
    }

    pub fn from_name(s: &str) -> Option<Stage> {
        Stage::all().into_iter().find(|st| st.name() == s)
    }

    pub fn all() -> Vec<Stage> {
        vec![
            Stage::Trim,
            Stage::Merge,
            Stage::QualityControl,
            Stage::ChimeraRemoval,
            Stage::OtuPicking,
            Stage::Diversity,
        ]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where the workflow starts and stops
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryPoint {
    Full,
    OtuPicking,
    DiversityAnalysis,
    StopAtChimeraRemoval,
}

impl EntryPoint {
    /// Begin-with takes priority over stop-at
    pub fn resolve(begin: Option<BeginWith>, stop: Option<StopAt>) -> EntryPoint {
        match (begin, stop) {
            (Some(BeginWith::OtuPicking), _) => EntryPoint::OtuPicking,
            (Some(BeginWith::DiversityAnalysis), _) => EntryPoint::DiversityAnalysis,
            (None, Some(StopAt::ChimeraRemoval)) => EntryPoint::StopAtChimeraRemoval,
            (None, None) => EntryPoint::Full,
        }
    }

    pub fn stages(&self) -> Vec<Stage> {
        match self {
            EntryPoint::Full => Stage::all(),
            EntryPoint::OtuPicking => vec![Stage::OtuPicking, Stage::Diversity],
            EntryPoint::DiversityAnalysis => vec![Stage::Diversity],
            EntryPoint::StopAtChimeraRemoval => vec![
                Stage::Trim,
                Stage::Merge,
                Stage::QualityControl,
                Stage::ChimeraRemoval,
            ],
        }
    }

    /// Entry points that may produce their own mapping file
    pub fn can_generate_mapping(&self) -> bool {
        matches!(self, EntryPoint::Full | EntryPoint::OtuPicking)
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            EntryPoint::Full => "full",
            EntryPoint::OtuPicking => "otu_picking",
            EntryPoint::DiversityAnalysis => "diversity_analysis",
            EntryPoint::StopAtChimeraRemoval => "stop_at_chimera_removal",
        };
        write!(f, "{}", s)
    }
}

/// Absolute folder of every stage for one run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageFolders {
    pub trimmed: PathBuf,
    pub merged: PathBuf,
    pub quality: PathBuf,
    pub chimera: PathBuf,
    pub otus: PathBuf,
    pub diversity: PathBuf,
    pub others: PathBuf,
}

impl StageFolders {
    /// `path_out` must already be absolute
    pub fn resolve(path_out: &Path, names: &FolderNames) -> StageFolders {
        StageFolders {
            trimmed: path_out.join(&names.trimmed),
            merged: path_out.join(&names.merged),
            quality: path_out.join(&names.quality_step),
            chimera: path_out.join(&names.chimera_removed),
            otus: path_out.join(&names.otus),
            diversity: path_out.join(&names.diversity_analyses),
            others: path_out.join(&names.others),
        }
    }

    /// Folder written by a stage
    pub fn output_of(&self, stage: Stage) -> &Path {
        match stage {
            Stage::Trim => &self.trimmed,
            Stage::Merge => &self.merged,
            Stage::QualityControl => &self.quality,
            Stage::ChimeraRemoval => &self.chimera,
            Stage::OtuPicking => &self.otus,
            Stage::Diversity => &self.diversity,
        }
    }
}

/// All resolved settings of one run. Built once, then only read
#[derive(Clone, Debug)]
pub struct RunParams {
    pub run_id: String,
    pub path_in: PathBuf,
    pub path_out: PathBuf,
    pub folders: StageFolders,
    pub config: PipelineConfig,
    pub database: ReferenceDatabase,
    pub threads: usize,
    pub trim_quality: u32,
    pub merge: MergeMethod,
    pub qc_quality: u32,
    pub depth: u32,
    pub path_mapping: PathBuf,
    pub generate_mapping: bool,
    pub path_parameter_file: PathBuf,
    pub entry: EntryPoint,
    pub exit_policy: ExitPolicy,
}

impl RunParams {
    pub fn is_fungal(&self) -> bool {
        self.database.is_fungal()
    }

    pub fn reference_files(&self) -> &ReferenceFiles {
        self.database.files(&self.config)
    }

    pub fn chimera_reference(&self) -> &str {
        self.database.chimera_reference(&self.config)
    }

    /// Input folder of a stage, given where the workflow was entered
    pub fn input_of(&self, stage: Stage) -> &Path {
        match (self.entry, stage) {
            (_, Stage::Trim) => &self.path_in,
            (EntryPoint::OtuPicking, Stage::OtuPicking) => &self.path_in,
            (EntryPoint::DiversityAnalysis, Stage::Diversity) => &self.path_in,
            (_, Stage::Merge) => &self.folders.trimmed,
            (_, Stage::QualityControl) => &self.folders.merged,
            (_, Stage::ChimeraRemoval) => &self.folders.quality,
            (_, Stage::OtuPicking) => &self.folders.chimera,
            (_, Stage::Diversity) => &self.folders.otus,
        }
    }

    /// Key/value listing of the parameters, for the log
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let f = &self.folders;
        vec![
            ("id", self.run_id.clone()),
            ("in_folder", self.path_in.display().to_string()),
            ("out_folder", self.path_out.display().to_string()),
            ("Ftrimmed", f.trimmed.display().to_string()),
            ("Fmerged", f.merged.display().to_string()),
            ("Fqc", f.quality.display().to_string()),
            ("Fchi", f.chimera.display().to_string()),
            ("Fotus", f.otus.display().to_string()),
            ("Fdiv", f.diversity.display().to_string()),
            ("others", f.others.display().to_string()),
            ("rdb", self.database.to_string()),
            ("number_of_cores", self.threads.to_string()),
            ("jobs_to_start_configured", self.config.jobs_to_start.to_string()),
            ("trimq", self.trim_quality.to_string()),
            ("joining_method", self.merge.to_string()),
            ("qcq", self.qc_quality.to_string()),
            ("depth", self.depth.to_string()),
            ("similarity", self.config.similarity.clone()),
            ("blast_e_value", self.config.blast_e_value.clone()),
            ("mapping_file", self.path_mapping.display().to_string()),
            ("parameter_file_name", self.path_parameter_file.display().to_string()),
            ("entry_point", self.entry.to_string()),
            ("exit_policy", format!("{:?}", self.exit_policy)),
        ]
    }
}
