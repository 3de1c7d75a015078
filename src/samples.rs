use std::fs;
use std::path::Path;

use anyhow::bail;
use anyhow::Context;

pub const FORWARD_TOKEN: &str = "_R1_";
pub const REVERSE_TOKEN: &str = "_R2_";

/// Illumina lane and read suffix, removed when naming merged reads
pub const LANE_READ_SUFFIX: &str = "_L001_R1_001";

/// Forward and reverse read files of one sample, as bare file names
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadPair {
    pub r1: String,
    pub r2: String,
}

impl ReadPair {
    /// Name of the merged read file: the forward name without lane/read suffix
    pub fn merged_name(&self) -> String {
        merged_name(&self.r1)
    }
}

/// Names of all regular files in a directory, sorted by name
pub fn list_files_sorted(dir: &Path) -> anyhow::Result<Vec<String>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Could not list input folder {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        files.push(entry.file_name().to_string_lossy().to_string());
    }
    files.sort();
    Ok(files)
}

/// Names of the per-sample sequence files (*.fasta) in a directory, sorted
pub fn list_fasta_files(dir: &Path) -> anyhow::Result<Vec<String>> {
    Ok(list_files_sorted(dir)?
        .into_iter()
        .filter(|f| f.ends_with(".fasta"))
        .collect())
}

/// Pair up forward and reverse reads by the _R1_/_R2_ naming convention.
/// Every forward file must have its reverse partner
pub fn pair_reads(files: &[String]) -> anyhow::Result<Vec<ReadPair>> {
    let mut pairs = Vec::new();
    for r1 in files.iter().filter(|f| f.contains(FORWARD_TOKEN)) {
        let r2 = r1.replace(FORWARD_TOKEN, REVERSE_TOKEN);
        if !files.contains(&r2) {
            bail!("Found forward read file {} but not its reverse partner {}", r1, r2);
        }
        pairs.push(ReadPair {
            r1: r1.clone(),
            r2,
        });
    }
    Ok(pairs)
}

/// List a folder and pair its read files
pub fn list_read_pairs(dir: &Path) -> anyhow::Result<Vec<ReadPair>> {
    let files = list_files_sorted(dir)?;
    pair_reads(&files)
}

pub fn merged_name(r1: &str) -> String {
    r1.replace(LANE_READ_SUFFIX, "")
}

/// Sample id handed to the QC tool: file name without .fastq
pub fn qc_sample_id(fname: &str) -> String {
    fname.replace(".fastq", "")
}

/// Name of the filtered sequence file produced for a merged read file
pub fn fasta_name(fname: &str) -> String {
    fname.replace(".fastq", ".fasta")
}

/// Sample id for the mapping file: up to the first underscore, without .fasta
pub fn mapping_sample_id(fname: &str) -> String {
    let stem = fname.replace(".fasta", "");
    match stem.split('_').next() {
        Some(id) => id.to_string(),
        None => stem,
    }
}
