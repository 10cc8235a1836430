use crate::exec::{Cmd, Output, StdoutMode};
use crate::result::{RmkError, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use which::which;

/// Spawns external processes for live commands and for discovery probes.
#[derive(Default, Debug, Clone, Copy)]
pub struct ProcessManager;

impl ProcessManager {
    pub fn new() -> Self {
        Self
    }

    pub fn has_executable(&self, name: &str) -> bool {
        which(name).is_ok()
    }

    /** Runs a target command for real
     *
     * A non-zero exit status is not an error: it is handed back in
     * [`Output::status`] and the target decides what it means. Only a
     * failure to start the process is reported as `Err`.
     */
    pub async fn run(&self, cmd: &Cmd) -> Result<Output> {
        let mut command = Command::new(cmd.program());
        command.args(cmd.get_args());
        command.stdin(Stdio::inherit());
        if let Some(dir) = cmd.dir() {
            command.current_dir(dir);
        }

        match cmd.stdout_mode() {
            StdoutMode::Inherit | StdoutMode::Null => {
                if cmd.stdout_mode() == StdoutMode::Null {
                    command.stdout(Stdio::null());
                } else {
                    command.stdout(Stdio::inherit());
                }
                command.stderr(Stdio::inherit());

                let status = command.status().await.map_err(|e| {
                    RmkError::process(format!("Failed to execute {}: {}", cmd.program(), e))
                })?;

                Ok(Output {
                    status: status.code(),
                    ..Output::default()
                })
            }
            StdoutMode::Capture => {
                command.stdout(Stdio::piped());
                command.stderr(Stdio::null());

                let output = command.output().await.map_err(|e| {
                    RmkError::process(format!("Failed to execute {}: {}", cmd.program(), e))
                })?;

                Ok(Output {
                    status: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                    stderr: String::new(),
                })
            }
        }
    }

    /// Runs a helper tool (package manager, `ldd`, compiler probe) and
    /// collects both streams.
    pub async fn query<I, S>(&self, program: &str, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.query_in(None, program, args).await
    }

    /// [`query`](Self::query) run from `dir` instead of the current directory.
    pub async fn query_in<I, S>(&self, dir: Option<&Path>, program: &str, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        log::debug!("Querying {}", program);

        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null());
        if let Some(dir) = dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|e| RmkError::process(format!("Failed to run {}: {}", program, e)))?;

        Ok(Output {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn capture_trims_stdout() {
        let pm = ProcessManager::new();
        let out = pm
            .run(&Cmd::new("echo").arg("  hello ").capture())
            .await
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "hello");
    }

    #[tokio::test]
    async fn non_zero_status_is_not_an_error() {
        let pm = ProcessManager::new();
        let out = pm.run(&Cmd::new("false").quiet()).await.unwrap();
        assert_eq!(out.status, Some(1));
    }

    #[tokio::test]
    async fn query_runs_in_the_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.c"), "").unwrap();

        let pm = ProcessManager::new();
        let out = pm
            .query_in(Some(dir.path()), "ls", ["main.c"])
            .await
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "main.c");
    }

    #[tokio::test]
    async fn missing_program_is_a_process_error() {
        let pm = ProcessManager::new();
        let err = pm
            .query("rmk-definitely-not-installed", ["--version"])
            .await
            .unwrap_err();
        assert!(matches!(err, RmkError::Process(_)));
    }
}
