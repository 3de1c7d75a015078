use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use anyhow::Context;

use crate::config::PipelineConfig;
use crate::params::ReferenceDatabase;

/// Key/value lines of the QIIME parameter file for the chosen database
pub fn parameter_entries(
    database: ReferenceDatabase,
    cfg: &PipelineConfig,
    jobs_to_start: usize,
) -> Vec<(&'static str, String)> {
    let files = database.files(cfg);
    let mut entries = vec![
        ("assign_taxonomy:id_to_taxonomy_fp", files.taxonomy.clone()),
        ("assign_taxonomy:reference_seqs_fp", files.reference_seqs.clone()),
        ("pick_otus.py:pick_otus_reference_seqs_fp", files.reference_seqs.clone()),
    ];

    if database.is_fungal() {
        entries.push(("parallel:jobs_to_start", jobs_to_start.to_string()));
        entries.push(("assign_taxonomy:assignment_method", "blast".to_string()));
        entries.push(("parallel_assign_taxonomy_blast:e_value", cfg.blast_e_value.clone()));
    } else {
        entries.push(("pick_otus:enable_rev_strand_match", "True".to_string()));
        if let Some(core_alignment) = &files.core_alignment {
            entries.push(("filter_alignment.py:pynast_template_alignment_fp", core_alignment.clone()));
        }
        entries.push(("parallel:jobs_to_start", jobs_to_start.to_string()));
        entries.push(("assign_taxonomy:similarity", cfg.similarity.clone()));
    }
    entries
}

/// Write the parameter file consumed by pick_open_reference_otus.py
pub fn write_parameter_file(
    path: &Path,
    database: ReferenceDatabase,
    cfg: &PipelineConfig,
    jobs_to_start: usize,
) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create parameter file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for (key, value) in parameter_entries(database, cfg, jobs_to_start) {
        writeln!(writer, "{}\t{}", key, value)?;
    }
    writer.flush()?;
    Ok(())
}
