use crate::result::{RmkError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a live command's standard output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdoutMode {
    #[default]
    Inherit,
    Null,
    Capture,
}

/** Structured command builder used by targets
 *
 * Every argument is kept as its own string, so nothing is re-split or
 * re-quoted on the way to the process. The resolved form that lands in the
 * command log is exactly `program` followed by `args`.
 *
 * # Example
 * ```
 * use rmk::exec::Cmd;
 *
 * let cmd = Cmd::new("gcc").args(["-O2", "-o", "bin/app", "main.c"]).arg("-lm");
 * assert_eq!(cmd.record().to_string(), "gcc -O2 -o bin/app main.c -lm");
 * ```
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    stdout: StdoutMode,
    echo: bool,
    dir: Option<PathBuf>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout: StdoutMode::Inherit,
            echo: true,
            dir: None,
        }
    }

    /// Builds a command from an argv list such as the ones in `Rmk.toml`.
    pub fn from_argv<S: AsRef<str>>(argv: &[S]) -> Result<Self> {
        let (program, rest) = argv
            .split_first()
            .ok_or_else(|| RmkError::config(RmkError::EMPTY_COMMAND))?;

        if program.as_ref().is_empty() {
            return Err(RmkError::config(RmkError::EMPTY_COMMAND));
        }

        Ok(Self::new(program.as_ref()).args(rest.iter().map(|s| s.as_ref())))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Captures stdout into [`Output::stdout`] and stops echoing the command.
    pub fn capture(mut self) -> Self {
        self.stdout = StdoutMode::Capture;
        self.echo = false;
        self
    }

    /// Discards stdout.
    pub fn quiet(mut self) -> Self {
        self.stdout = StdoutMode::Null;
        self
    }

    /// Don't print the command line before running it.
    pub fn silent(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn stdout_mode(&self) -> StdoutMode {
        self.stdout
    }

    pub fn echoes(&self) -> bool {
        self.echo
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn record(&self) -> CommandRecord {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        CommandRecord {
            argv,
            dir: self.dir.clone(),
        }
    }
}

/// One fully-resolved command a target submitted for execution: the argv
/// and the directory it runs in (`None` for the current one).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandRecord {
    argv: Vec<String>,
    dir: Option<PathBuf>,
}

impl CommandRecord {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv, dir: None }
    }

    /// Splits a plain command line on whitespace. No quoting rules apply.
    pub fn parse(line: &str) -> Self {
        Self::new(line.split_whitespace().map(str::to_string).collect())
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// `path` as the command sees it: relative paths are taken from the
    /// command's directory.
    pub fn resolve(&self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        match &self.dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }
}

impl fmt::Display for CommandRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

/// Append-only record of every command submitted during this run.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    records: Vec<CommandRecord>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CommandRecord) {
        self.records.push(record);
    }

    pub fn snapshot(&self) -> Vec<CommandRecord> {
        self.records.clone()
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandRecord> {
        self.records.iter()
    }
}

/** Result of submitting a command
 *
 * Shadow mode hands back `Output::shadow()`: a zero status with empty
 * streams, so target code never needs to branch on the mode.
 */
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Output {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    pub fn shadow() -> Self {
        Self {
            status: Some(0),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}
