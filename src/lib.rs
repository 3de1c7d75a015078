pub mod cmd;
pub mod command;
pub mod config;
pub mod params;
pub mod pool;
pub mod runner;
pub mod runtime;
pub mod samples;
pub mod utils;
pub mod workflow;

pub use config::ConfigurationError;
pub use config::PipelineConfig;
pub use params::RunParams;
pub use runner::ToolRunner;
pub use workflow::Workflow;
