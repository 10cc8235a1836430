//! Compiler command lines: which records are compiler invocations, what
//! they produce, and how to turn one into a dependency-listing probe.

use crate::exec::CommandRecord;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Output name the compiler driver uses when no `-o` is given.
pub const DEFAULT_OUTPUT: &str = "a.out";

// Flags that stop the driver before the link step.
const NO_LINK_FLAGS: &[&str] = &["-c", "-S", "-E", "-M", "-MM"];

/// Recognizes compiler invocations by the program name of a record.
#[derive(Debug, Clone)]
pub struct CompilerClassifier {
    drivers: Vec<String>,
}

impl CompilerClassifier {
    pub fn new<I, S>(drivers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            drivers: drivers.into_iter().map(Into::into).collect(),
        }
    }

    /// `gcc` and `/usr/bin/gcc` both match a `gcc` driver.
    pub fn is_compiler(&self, record: &CommandRecord) -> bool {
        let Some(program) = record.program() else {
            return false;
        };

        let name = Path::new(program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(program);

        self.drivers.iter().any(|d| d == name)
    }

    pub fn compiler_invocations<'a>(&self, records: &'a [CommandRecord]) -> Vec<&'a CommandRecord> {
        records.iter().filter(|r| self.is_compiler(r)).collect()
    }

    pub fn linking_invocations<'a>(&self, records: &'a [CommandRecord]) -> Vec<&'a CommandRecord> {
        records
            .iter()
            .filter(|r| self.is_compiler(r) && links_executable(r))
            .collect()
    }
}

impl Default for CompilerClassifier {
    fn default() -> Self {
        Self::new(["gcc"])
    }
}

/// True unless the command stops before linking (`-c`, `-S`, `-E`, `-M`, `-MM`).
pub fn links_executable(record: &CommandRecord) -> bool {
    !record
        .args()
        .iter()
        .any(|arg| NO_LINK_FLAGS.contains(&arg.as_str()))
}

/// The file after `-o` (or glued as `-ofile`), otherwise [`DEFAULT_OUTPUT`],
/// taken relative to the command's directory. A trailing `-o` with nothing
/// after it also yields the default.
pub fn output_artifact(record: &CommandRecord) -> PathBuf {
    record.resolve(output_name(record))
}

fn output_name(record: &CommandRecord) -> &str {
    let mut args = record.args().iter();

    while let Some(arg) = args.next() {
        if arg == "-o" {
            return args.next().map_or(DEFAULT_OUTPUT, String::as_str);
        }
        if let Some(glued) = arg.strip_prefix("-o") {
            if !glued.is_empty() {
                return glued;
            }
        }
    }

    DEFAULT_OUTPUT
}

/** Arguments for re-running `record` as a dependency listing
 *
 * `-M -MF <listing>` goes right after the program and every output option
 * is dropped: with both `-M` and `-o` the driver truncates the real output
 * file.
 */
pub fn include_probe_args(record: &CommandRecord, listing: &Path) -> Vec<String> {
    let mut probe = vec![
        "-M".to_string(),
        "-MF".to_string(),
        listing.to_string_lossy().into_owned(),
    ];

    let mut args = record.args().iter();
    while let Some(arg) = args.next() {
        if arg == "-o" {
            args.next();
            continue;
        }
        if arg.starts_with("-o") && arg.len() > 2 {
            continue;
        }
        probe.push(arg.clone());
    }

    probe
}

/** Absolute paths named in a make-style dependency listing
 *
 * ```text
 * main.o: main.c /usr/include/stdio.h \
 *  /usr/include/foo/foo.h
 * ```
 *
 * One rule is written per source file; all of them are merged. The result
 * is sorted and free of duplicates.
 */
pub fn parse_dependency_listing(listing: &str) -> Vec<PathBuf> {
    listing
        .split_whitespace()
        .filter(|token| *token != "\\" && !token.ends_with(':'))
        .filter(|token| token.starts_with('/'))
        .map(PathBuf::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
