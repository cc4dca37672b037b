// src/utils/command.rs: Job command descriptors and the runner that executes them

use std::fmt;
use std::path::Path;
use std::process::Stdio;

use log::{debug, info};
use tokio::process::Command;

use crate::config::defs::PipelineError;


/// A fully-built external invocation: program plus ordered arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Capture stderr together with stdout.
    pub merge_stderr: bool,
}

impl JobCommand {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            merge_stderr: false,
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Pushes a `--flag value` pair.
    pub fn flag<S: Into<String>>(mut self, flag: &str, value: S) -> Self {
        self.args.push(flag.to_string());
        self.args.push(value.into());
        self
    }

    pub fn merge_stderr(mut self) -> Self {
        self.merge_stderr = true;
        self
    }

    /// Value following the first occurrence of `flag`, if any.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for JobCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}


/// Executes job commands and returns their captured text output.
pub trait CommandRunner {
    fn run(&self, command: &JobCommand) -> impl Future<Output = Result<String, PipelineError>>;
}


/// Runs commands as child processes, blocking the caller's task until exit.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &JobCommand) -> Result<String, PipelineError> {
        debug!("Running: {}", command);

        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PipelineError::ToolNotFound(command.program.clone())
                } else {
                    PipelineError::ToolExecution {
                        tool: command.program.clone(),
                        error: e.to_string(),
                    }
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(PipelineError::ToolExecution {
                tool: command.program.clone(),
                error: format!("exit {:?}: {}", output.status.code(), stderr.trim()),
            });
        }

        if command.merge_stderr {
            Ok(format!("{}{}", stdout, stderr))
        } else {
            relay_stderr(&command.program, &stderr);
            Ok(stdout)
        }
    }
}


/// Logs each non-blank stderr line of a successful run; returns how many were logged.
pub fn relay_stderr(program: &str, stderr: &str) -> usize {
    let mut relayed = 0;
    for line in stderr.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()) {
        info!("{}: {}", program, line);
        relayed += 1;
    }
    relayed
}


/// Checks whether a program is an existing path or resolvable on PATH.
pub fn exists_command(cmd: &str) -> bool {
    if Path::new(cmd).exists() {
        return true;
    }
    std::env::var_os("PATH").is_some_and(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(cmd))
            .any(|full| full.is_file())
    })
}


/// Fails early with ToolNotFound when `tool` cannot be located.
pub fn require_tool(tool: &str) -> Result<(), PipelineError> {
    if exists_command(tool) {
        Ok(())
    } else {
        Err(PipelineError::ToolNotFound(tool.to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_command_builder() {
        let cmd = JobCommand::new("dsub")
            .flag("--name", "sample1")
            .flag("--project", "my-project")
            .arg("--wait");
        assert_eq!(cmd.args, vec!["--name", "sample1", "--project", "my-project", "--wait"]);
        assert_eq!(cmd.value_of("--project"), Some("my-project"));
        assert_eq!(cmd.value_of("--zones"), None);
        assert_eq!(cmd.to_string(), "dsub --name sample1 --project my-project --wait");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_captures_stdout() -> anyhow::Result<()> {
        let cmd = JobCommand::new("sh").arg("-c").arg("echo job-id; echo warn 1>&2");
        let out = ProcessRunner.run(&cmd).await?;
        assert_eq!(out.trim(), "job-id");

        let merged = ProcessRunner.run(&cmd.clone().merge_stderr()).await?;
        assert!(merged.contains("job-id") && merged.contains("warn"));
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_relays_stderr_on_success() -> anyhow::Result<()> {
        let cmd = JobCommand::new("sh")
            .arg("-c")
            .arg("echo job-1; echo 'Launched job-id: job-1' 1>&2");
        let out = ProcessRunner.run(&cmd).await?;
        assert_eq!(out, "job-1\n");
        Ok(())
    }

    #[test]
    fn test_relay_stderr_counts_lines() {
        assert_eq!(relay_stderr("dsub", "Launched job-id: job-1\n\nProvider: google-v2\n"), 2);
        assert_eq!(relay_stderr("dsub", "  \n"), 0);
        assert_eq!(relay_stderr("dsub", ""), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_nonzero_exit() {
        let cmd = JobCommand::new("sh").arg("-c").arg("echo boom 1>&2; exit 3");
        let err = ProcessRunner.run(&cmd).await.unwrap_err();
        match err {
            PipelineError::ToolExecution { tool, error } => {
                assert_eq!(tool, "sh");
                assert!(error.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_process_runner_missing_tool() {
        let cmd = JobCommand::new("definitely-not-a-real-binary-xyz");
        let err = ProcessRunner.run(&cmd).await.unwrap_err();
        assert!(matches!(err, PipelineError::ToolNotFound(_)));
        assert!(require_tool("definitely-not-a-real-binary-xyz").is_err());
    }
}
