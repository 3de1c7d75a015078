use std::ffi::OsStr;
use std::ffi::OsString;
use std::fmt;
use std::process;

use anyhow::Context;
use log::info;
use log::warn;

use crate::utils::command_to_string;

/// What to do when an external tool exits with a non-zero status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Log a warning and carry on, leaving it to later stages to notice missing output
    Continue,
    /// Turn the failure into an error that aborts the run
    Abort,
}

/// One invocation of an external program, kept as an argument vector.
/// Nothing is ever passed through a shell
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: &str) -> ToolCommand {
        ToolCommand {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> ToolCommand {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append an argument of the form `key=value`, as used by the BBTools suite
    pub fn arg_eq(mut self, key: &str, value: impl AsRef<OsStr>) -> ToolCommand {
        let mut a = OsString::from(key);
        a.push("=");
        a.push(value.as_ref());
        self.args.push(a);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Position of an argument, if present. Lets test runners inspect what a
    /// stage asked for
    pub fn position_of(&self, arg: &str) -> Option<usize> {
        self.args.iter().position(|a| a == arg)
    }

    /// The argument following a flag, e.g. the value of `-o`
    pub fn value_of(&self, flag: &str) -> Option<&OsString> {
        self.position_of(flag).and_then(|i| self.args.get(i + 1))
    }

    pub fn to_process(&self) -> process::Command {
        let mut cmd = process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", command_to_string(&self.program, &self.args))
    }
}

/// Captured result of a finished tool
#[derive(Clone, Debug, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// A clean exit with no output, as reported by test runners
    pub fn ok() -> ToolOutput {
        ToolOutput {
            success: true,
            code: Some(0),
            ..Default::default()
        }
    }
}

/// Something that can run an external tool to completion.
/// Errors are reserved for failing to run the tool at all
pub trait ToolRunner: Send + Sync {
    fn invoke(&self, cmd: &ToolCommand) -> anyhow::Result<ToolOutput>;
}

/// Runs tools as child processes and waits for them
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner {}

impl ProcessRunner {
    pub fn new() -> ProcessRunner {
        ProcessRunner {}
    }
}

impl ToolRunner for ProcessRunner {
    fn invoke(&self, cmd: &ToolCommand) -> anyhow::Result<ToolOutput> {
        let output = cmd
            .to_process()
            .output()
            .with_context(|| format!("Could not spawn process {}", cmd.program()))?;
        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Run a tool, log what happened, then apply the exit policy
pub fn execute(
    runner: &dyn ToolRunner,
    cmd: &ToolCommand,
    policy: ExitPolicy,
) -> anyhow::Result<ToolOutput> {
    info!("{}", cmd);
    let output = runner
        .invoke(cmd)
        .with_context(|| format!("Failed to run: {}", cmd))?;

    if !output.stdout.is_empty() {
        info!("{}", String::from_utf8_lossy(&output.stdout));
    }
    if !output.stderr.is_empty() {
        warn!("{}", String::from_utf8_lossy(&output.stderr));
    }

    if !output.success {
        let status = match output.code {
            Some(c) => format!("exit code {}", c),
            None => "a signal".to_string(),
        };
        match policy {
            ExitPolicy::Continue => {
                warn!("{} terminated with {}; continuing", cmd.program(), status);
            }
            ExitPolicy::Abort => {
                anyhow::bail!(
                    "{} terminated with {}\ncommand: {}\n{}",
                    cmd.program(),
                    status,
                    cmd,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> ToolCommand {
        ToolCommand::new("sh").arg("-c").arg(script)
    }

    #[test]
    fn test_arg_building() {
        let cmd = ToolCommand::new("bbduk.sh")
            .arg("-Xmx1000m")
            .arg_eq("-in1", "/a/b.fastq")
            .arg("-o")
            .arg("out dir");
        assert_eq!(cmd.to_string(), "bbduk.sh -Xmx1000m -in1=/a/b.fastq -o out dir");
        assert_eq!(cmd.value_of("-o"), Some(&OsString::from("out dir")));
        assert_eq!(cmd.value_of("-x"), None);
        assert_eq!(cmd.args().len(), 4);
    }

    #[test]
    fn test_capture_output() {
        let out = execute(
            &ProcessRunner::new(),
            &sh("echo hello; echo oops >&2"),
            ExitPolicy::Abort,
        )
        .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout, b"hello\n");
        assert_eq!(out.stderr, b"oops\n");
    }

    #[test]
    fn test_nonzero_exit_continue() {
        let out = execute(&ProcessRunner::new(), &sh("exit 3"), ExitPolicy::Continue).unwrap();
        assert!(!out.success);
        assert_eq!(out.code, Some(3));
    }

    #[test]
    fn test_nonzero_exit_abort() {
        let err = execute(&ProcessRunner::new(), &sh("echo bad >&2; exit 3"), ExitPolicy::Abort)
            .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("exit code 3"));
        assert!(msg.contains("bad"));
    }

    #[test]
    fn test_spawn_failure_propagates() {
        let r = execute(
            &ProcessRunner::new(),
            &ToolCommand::new("amplipipe-no-such-program").arg("-o").arg("/x"),
            ExitPolicy::Continue,
        );
        let msg = format!("{:#}", r.unwrap_err());
        assert!(msg.contains("amplipipe-no-such-program -o /x"), "{}", msg);
    }
}
