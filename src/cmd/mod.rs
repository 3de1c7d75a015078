pub mod analysis_cmd;

pub use analysis_cmd::AnalysisCMD;
