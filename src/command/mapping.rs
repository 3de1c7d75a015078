use std::path::Path;

use anyhow::Context;
use csv::QuoteStyle;
use csv::WriterBuilder;

use crate::samples;

pub const MAPPING_HEADER: [&str; 6] = [
    "#SampleID",
    "BarcodeSequence",
    "LinkerPrimerSequence",
    "Read",
    "File",
    "Description",
];

/// Write a minimal mapping file with one row per sample (.fasta) file in `in_folder`.
/// Extra metadata columns can be added by hand afterwards
pub fn write_mapping_file(in_folder: &Path, path_out: &Path) -> anyhow::Result<usize> {
    println!("Writing mapping file");
    let files = samples::list_fasta_files(in_folder)?;

    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .from_path(path_out)
        .with_context(|| format!("Failed to create mapping file {}", path_out.display()))?;

    writer.write_record(MAPPING_HEADER)?;
    for fname in &files {
        let sample_id = samples::mapping_sample_id(fname);
        writer.write_record([
            sample_id.as_str(),
            "",
            "",
            "R1",
            fname.as_str(),
            "single_file",
        ])?;
    }
    writer.flush()?;
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_mapping_rows() {
        let dir = tempfile::tempdir().unwrap();
        let qc = dir.path().join("qc");
        fs::create_dir(&qc).unwrap();
        fs::write(qc.join("s2_S2.fasta"), ">a\nACGT\n").unwrap();
        fs::write(qc.join("s1_S1.fasta"), ">a\nACGT\n").unwrap();

        let path_map = dir.path().join("map.tsv");
        assert_eq!(write_mapping_file(&qc, &path_map).unwrap(), 2);

        let text = fs::read_to_string(&path_map).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "#SampleID\tBarcodeSequence\tLinkerPrimerSequence\tRead\tFile\tDescription"
        );
        assert_eq!(lines[1], "s1\t\t\tR1\ts1_S1.fasta\tsingle_file");
        assert_eq!(lines[2], "s2\t\t\tR1\ts2_S2.fasta\tsingle_file");
    }

    #[test]
    fn test_mapping_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_S1.fasta"), ">a\nACGT\n").unwrap();
        fs::write(dir.path().join("README.txt"), "notes").unwrap();

        let path_map = dir.path().join("map.tsv");
        assert_eq!(write_mapping_file(dir.path(), &path_map).unwrap(), 1);
        let text = fs::read_to_string(&path_map).unwrap();
        assert!(!text.contains("README"));
        assert_eq!(text.lines().count(), 2);
    }
}
