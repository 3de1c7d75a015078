#![allow(dead_code)]

use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use amplipipe::runner::ToolCommand;
use amplipipe::runner::ToolOutput;
use amplipipe::runner::ToolRunner;

pub const CONFIG: &str = "\
[FOLDERS]
trimmed = trimmed
merged = merged
quality_step = qc
chimera_removed = chi
otus = otus
diversity_analyses = div
others = others

[GENERAL]
jobs_to_start = 2
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

pub fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("qiime.cfg");
    fs::write(&path, CONFIG).unwrap();
    path
}

/// Folder with one read pair per sample, Illumina style names
pub fn write_reads(dir: &Path, samples: &[&str]) -> PathBuf {
    let path = dir.join("reads");
    fs::create_dir(&path).unwrap();
    for (i, s) in samples.iter().enumerate() {
        for r in ["R1", "R2"] {
            let fname = format!("{}_S{}_L001_{}_001.fastq", s, i + 1, r);
            fs::write(path.join(fname), "@r\nACGT\n+\nIIII\n").unwrap();
        }
    }
    path
}

/// Folder of per-sample filtered sequences, as left by chimera removal
pub fn write_fasta(dir: &Path, samples: &[&str]) -> PathBuf {
    let path = dir.join("chimera_free");
    fs::create_dir(&path).unwrap();
    for (i, s) in samples.iter().enumerate() {
        fs::write(path.join(format!("{}_S{}.fasta", s, i + 1)), ">a\nACGT\n").unwrap();
    }
    path
}

/// Stands in for the external tools: records every command and creates the
/// files the real tool would have created
#[derive(Default)]
pub struct FakeTools {
    pub calls: Mutex<Vec<ToolCommand>>,
    pub fail_program: Option<String>,
}

impl FakeTools {
    pub fn new() -> FakeTools {
        FakeTools::default()
    }

    pub fn failing(program: &str) -> FakeTools {
        FakeTools {
            calls: Mutex::new(Vec::new()),
            fail_program: Some(program.to_string()),
        }
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.program().to_string())
            .collect()
    }

    pub fn calls_to(&self, program: &str) -> Vec<ToolCommand> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.program() == program)
            .cloned()
            .collect()
    }
}

fn flag_value(cmd: &ToolCommand, flag: &str) -> PathBuf {
    PathBuf::from(cmd.value_of(flag).unwrap_or_else(|| panic!("{} has no {}", cmd, flag)))
}

fn eq_value(cmd: &ToolCommand, key: &str) -> PathBuf {
    let prefix = format!("{}=", key);
    let arg = cmd
        .args()
        .iter()
        .map(|a| a.to_string_lossy().to_string())
        .find(|a| a.starts_with(&prefix))
        .unwrap_or_else(|| panic!("{} has no {}", cmd, key));
    PathBuf::from(&arg[prefix.len()..])
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

impl ToolRunner for FakeTools {
    fn invoke(&self, cmd: &ToolCommand) -> anyhow::Result<ToolOutput> {
        self.calls.lock().unwrap().push(cmd.clone());

        if self.fail_program.as_deref() == Some(cmd.program()) {
            return Ok(ToolOutput {
                success: false,
                code: Some(1),
                stdout: Vec::new(),
                stderr: b"simulated failure".to_vec(),
            });
        }

        match cmd.program() {
            "bbduk.sh" => {
                fs::write(eq_value(cmd, "-out1"), "@r\nACGT\n+\nIIII\n")?;
                fs::write(eq_value(cmd, "-out2"), "@r\nACGT\n+\nIIII\n")?;
            }
            "fastq-join" => {
                let out = flag_value(cmd, "-o");
                fs::write(suffixed(&out, "join"), "@r\nACGTACGT\n+\nIIIIIIII\n")?;
                fs::write(suffixed(&out, "un1"), "")?;
                fs::write(suffixed(&out, "un2"), "")?;
            }
            "bbmerge.sh" => {
                fs::write(eq_value(cmd, "-out"), "@r\nACGTACGT\n+\nIIIIIIII\n")?;
            }
            "split_libraries_fastq.py" => {
                let out = flag_value(cmd, "-o");
                fs::create_dir_all(&out)?;
                fs::write(out.join("seqs.fna"), ">s_0\nACGTACGT\n")?;
                fs::write(out.join("split_library_log.txt"), "log")?;
            }
            "identify_chimeric_seqs.py" => {
                let out = flag_value(cmd, "-o");
                fs::create_dir_all(&out)?;
                fs::write(out.join("non_chimeras.txt"), "s_0\n")?;
            }
            "filter_fasta.py" => {
                fs::write(flag_value(cmd, "-o"), ">s_0\nACGTACGT\n")?;
            }
            "pick_open_reference_otus.py" => {
                let out = flag_value(cmd, "-o");
                fs::create_dir_all(&out)?;
                fs::write(out.join("otu_table_mc2_w_tax_no_pynast_failures.biom"), "{}")?;
                fs::write(out.join("otu_table_mc2_w_tax.biom"), "{}")?;
                fs::write(out.join("rep_set.tre"), "();")?;
            }
            "filter_otus_from_otu_table.py" => {
                fs::write(flag_value(cmd, "-o"), "{}")?;
            }
            "core_diversity_analyses.py" => {
                fs::create_dir_all(flag_value(cmd, "-o"))?;
            }
            other => anyhow::bail!("unexpected tool {}", other),
        }
        Ok(ToolOutput::ok())
    }
}
