use std::path::Path;
use std::path::PathBuf;

use config::Config;
use config::File;
use config::FileFormat;

pub const DEFAULT_CONFIG_FILE: &str = "qiime.cfg";

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("Could not read configuration file \"{}\": {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: config::ConfigError,
    },

    #[error("Configuration is missing key \"{key}\" in section [{section}]")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },

    #[error("Invalid value \"{value}\" for key \"{key}\" in section [{section}]")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },
}

/// Subfolder names for each stage. Always end with a '/'
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNames {
    pub trimmed: String,
    pub merged: String,
    pub quality_step: String,
    pub chimera_removed: String,
    pub otus: String,
    pub diversity_analyses: String,
    pub others: String,
}

/// Files of one reference database. UNITE ships no core alignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFiles {
    pub taxonomy: String,
    pub reference_seqs: String,
    pub core_alignment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChimeraReferences {
    pub silva: String,
    pub gg: String,
}

/// Everything read from the INI configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub folders: FolderNames,
    pub jobs_to_start: usize,
    pub similarity: String,
    pub blast_e_value: String,
    pub silva: ReferenceFiles,
    pub gg: ReferenceFiles,
    pub unite: ReferenceFiles,
    pub chimera: ChimeraReferences,
}

impl PipelineConfig {
    /// Load the configuration. Every key is required; nothing is defaulted
    pub fn load(path: &Path) -> Result<PipelineConfig, ConfigurationError> {
        let source = path.to_str().ok_or_else(|| ConfigurationError::Unreadable {
            path: path.to_path_buf(),
            source: config::ConfigError::Message("path is not valid UTF-8".to_string()),
        })?;

        let cfg = Config::builder()
            .add_source(File::new(source, FileFormat::Ini).required(true))
            .build()
            .map_err(|e| ConfigurationError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            })?;

        Self::from_config(&cfg)
    }

    /// Parse configuration from INI text held in memory
    pub fn from_ini_str(text: &str) -> Result<PipelineConfig, ConfigurationError> {
        let cfg = Config::builder()
            .add_source(File::from_str(text, FileFormat::Ini))
            .build()
            .map_err(|e| ConfigurationError::Unreadable {
                path: PathBuf::from("<memory>"),
                source: e,
            })?;
        Self::from_config(&cfg)
    }

    fn from_config(cfg: &Config) -> Result<PipelineConfig, ConfigurationError> {
        let folders = FolderNames {
            trimmed: as_folder(&lookup(cfg, "FOLDERS", "trimmed")?),
            merged: as_folder(&lookup(cfg, "FOLDERS", "merged")?),
            quality_step: as_folder(&lookup(cfg, "FOLDERS", "quality_step")?),
            chimera_removed: as_folder(&lookup(cfg, "FOLDERS", "chimera_removed")?),
            otus: as_folder(&lookup(cfg, "FOLDERS", "otus")?),
            diversity_analyses: as_folder(&lookup(cfg, "FOLDERS", "diversity_analyses")?),
            others: as_folder(&lookup(cfg, "FOLDERS", "others")?),
        };

        let jobs = lookup(cfg, "GENERAL", "jobs_to_start")?;
        let jobs_to_start = match jobs.trim().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(ConfigurationError::InvalidValue {
                    section: "GENERAL",
                    key: "jobs_to_start",
                    value: jobs,
                })
            }
        };

        Ok(PipelineConfig {
            folders,
            jobs_to_start,
            similarity: lookup(cfg, "GENERAL", "similarity")?,
            blast_e_value: lookup(cfg, "GENERAL", "blast_e_value")?,
            silva: ReferenceFiles {
                taxonomy: lookup(cfg, "SILVA", "taxonomy")?,
                reference_seqs: lookup(cfg, "SILVA", "reference_seqs")?,
                core_alignment: Some(lookup(cfg, "SILVA", "core_alignment")?),
            },
            gg: ReferenceFiles {
                taxonomy: lookup(cfg, "GG", "taxonomy")?,
                reference_seqs: lookup(cfg, "GG", "reference_seqs")?,
                core_alignment: Some(lookup(cfg, "GG", "core_alignment")?),
            },
            unite: ReferenceFiles {
                taxonomy: lookup(cfg, "UNITE", "taxonomy")?,
                reference_seqs: lookup(cfg, "UNITE", "reference_seqs")?,
                core_alignment: None,
            },
            chimera: ChimeraReferences {
                silva: lookup(cfg, "CHIMERA", "silva")?,
                gg: lookup(cfg, "CHIMERA", "gg")?,
            },
        })
    }
}

/// Look up SECTION.key. config 0.13 stores keys lowercased
fn lookup(
    cfg: &Config,
    section: &'static str,
    key: &'static str,
) -> Result<String, ConfigurationError> {
    let path = format!("{}.{}", section.to_lowercase(), key);
    match cfg.get_string(&path) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigurationError::MissingKey { section, key }),
    }
}

/// Make sure a folder name ends with a separator
pub fn as_folder(folder: &str) -> String {
    if folder.ends_with('/') {
        folder.to_string()
    } else {
        format!("{}/", folder)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const EXAMPLE_CONFIG: &str = "\
[FOLDERS]
trimmed = trimmed
merged = merged/
quality_step = qc
chimera_removed = chi
otus = otus
diversity_analyses = div
others = others

[GENERAL]
jobs_to_start = 4
similarity = 0.8
blast_e_value = 0.001

[SILVA]
taxonomy = /db/silva/taxonomy.txt
reference_seqs = /db/silva/rep_set.fna
core_alignment = /db/silva/core.fasta

[GG]
taxonomy = /db/gg/taxonomy.txt
reference_seqs = /db/gg/rep_set.fna
core_alignment = /db/gg/core.fasta

[UNITE]
taxonomy = /db/unite/taxonomy.txt
reference_seqs = /db/unite/rep_set.fasta

[CHIMERA]
silva = /db/silva/chimera.fasta
gg = /db/gg/chimera.fasta
";

    #[test]
    fn test_as_folder() {
        assert_eq!(as_folder("abc"), "abc/");
        assert_eq!(as_folder("abc/"), "abc/");
    }

    #[test]
    fn test_load_example() {
        let cfg = PipelineConfig::from_ini_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(cfg.folders.trimmed, "trimmed/");
        assert_eq!(cfg.folders.merged, "merged/");
        assert_eq!(cfg.folders.others, "others/");
        assert_eq!(cfg.jobs_to_start, 4);
        assert_eq!(cfg.similarity, "0.8");
        assert_eq!(cfg.blast_e_value, "0.001");
        assert_eq!(cfg.silva.core_alignment.as_deref(), Some("/db/silva/core.fasta"));
        assert_eq!(cfg.unite.core_alignment, None);
        assert_eq!(cfg.chimera.gg, "/db/gg/chimera.fasta");
    }

    #[test]
    fn test_all_folders_normalized() {
        let cfg = PipelineConfig::from_ini_str(EXAMPLE_CONFIG).unwrap();
        let f = &cfg.folders;
        for name in [
            &f.trimmed,
            &f.merged,
            &f.quality_step,
            &f.chimera_removed,
            &f.otus,
            &f.diversity_analyses,
            &f.others,
        ] {
            assert!(name.ends_with('/'), "{} not normalized", name);
        }
    }

    #[test]
    fn test_section_case_ignored() {
        let text = EXAMPLE_CONFIG.replace("[CHIMERA]", "[chimera]");
        let cfg = PipelineConfig::from_ini_str(&text).unwrap();
        assert_eq!(cfg.chimera.silva, "/db/silva/chimera.fasta");
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let text = EXAMPLE_CONFIG.replace("gg = /db/gg/chimera.fasta\n", "");
        match PipelineConfig::from_ini_str(&text) {
            Err(ConfigurationError::MissingKey { section, key }) => {
                assert_eq!(section, "CHIMERA");
                assert_eq!(key, "gg");
            }
            other => panic!("expected missing key, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_job_count() {
        let text = EXAMPLE_CONFIG.replace("jobs_to_start = 4", "jobs_to_start = many");
        assert!(matches!(
            PipelineConfig::from_ini_str(&text),
            Err(ConfigurationError::InvalidValue { key: "jobs_to_start", .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let r = PipelineConfig::load(Path::new("/nonexistent/amplipipe/qiime.cfg"));
        assert!(matches!(r, Err(ConfigurationError::Unreadable { .. })));
    }
}
