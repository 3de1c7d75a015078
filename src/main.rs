use std::process::ExitCode;

use clap::Parser;
use amplipipe::cmd;

/// Microbiome analysis of amplicon sequencing data using multiple external tools
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    analysis: cmd::AnalysisCMD,
}

fn main() -> ExitCode {
    let mut cli = Cli::parse();

    let result = cli.analysis.try_execute();

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
