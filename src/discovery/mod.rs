//! Native package dependency discovery.
//!
//! A target is run in shadow mode to harvest the commands it would submit.
//! Compiler invocations among them are then probed: for build dependencies
//! the compiler lists the headers each compilation reads, for run-time
//! dependencies `ldd` lists the libraries each linked executable loads. The
//! files are mapped to packages through the host [`PackageBackend`] and the
//! package set is reduced with [`MinimalSetReducer`].
//!
//! Discovery is advisory and never fails: unknown targets, missing backends,
//! failed probes and unanswered queries are logged and degrade to smaller
//! (or no) reports.

pub mod compiler;
pub mod inspect;
pub mod linked;
pub mod reducer;

pub use compiler::{output_artifact, CompilerClassifier};
pub use inspect::{ArtifactInspector, SystemInspector};
pub use reducer::{MinimalSetReducer, Reduction};

use crate::exec::{CommandRecord, Session};
use crate::package::{PackageBackend, PackageId};
use crate::target::Registry;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Package added to every build report: the toolchain rmk targets are
/// written and built with.
pub const RUNTIME_PACKAGE: &str = "cargo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    /// Program names treated as compiler drivers.
    pub compilers: Vec<String>,
    pub runtime_package: PackageId,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            compilers: vec!["gcc".to_string()],
            runtime_package: PackageId::from(RUNTIME_PACKAGE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepsKind {
    Build,
    Runtime,
}

impl fmt::Display for DepsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepsKind::Build => f.write_str("Build"),
            DepsKind::Runtime => f.write_str("Runtime"),
        }
    }
}

/// Full and minimal package lists for one target or artifact, both sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepsReport {
    pub kind: DepsKind,
    pub subject: String,
    pub full: Vec<PackageId>,
    pub minimal: Vec<PackageId>,
    pub unresolved: Vec<PackageId>,
}

impl DepsReport {
    pub fn new(
        kind: DepsKind,
        subject: impl Into<String>,
        required: BTreeSet<PackageId>,
        reduction: Reduction,
    ) -> Self {
        Self {
            kind,
            subject: subject.into(),
            full: required.into_iter().collect(),
            minimal: reduction.minimal.into_iter().collect(),
            unresolved: reduction.unresolved,
        }
    }

    /** Renders the report the way the CLI prints it
     *
     * ```text
     * Build dependencies (full) for target 'app':
     * cargo libfoo-dev
     *
     * Build dependencies (minimal) for target 'app':
     * cargo libfoo-dev
     * ```
     */
    pub fn render(&self) -> String {
        format!(
            "{kind} dependencies (full) for {subject}:\n{full}\n\n{kind} dependencies (minimal) for {subject}:\n{minimal}\n",
            kind = self.kind,
            subject = self.subject,
            full = self.full.join(" "),
            minimal = self.minimal.join(" "),
        )
    }
}

pub struct DependencyDiscovery<'r> {
    registry: &'r Registry,
    backend: Option<Box<dyn PackageBackend>>,
    inspector: Box<dyn ArtifactInspector>,
    classifier: CompilerClassifier,
    settings: DiscoverySettings,
    show_progress: bool,
}

impl<'r> DependencyDiscovery<'r> {
    pub fn new(
        registry: &'r Registry,
        backend: Option<Box<dyn PackageBackend>>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            registry,
            backend,
            inspector: Box::new(SystemInspector::new()),
            classifier: CompilerClassifier::new(settings.compilers.iter().cloned()),
            settings,
            show_progress: false,
        }
    }

    pub fn with_inspector(mut self, inspector: impl ArtifactInspector + 'static) -> Self {
        self.inspector = Box::new(inspector);
        self
    }

    /// Shows a spinner on stderr while packages are being pruned.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /** Packages needed to build `target`
     *
     * # Returns
     * - `None` when the host has no package backend or no target has that
     *   name
     */
    pub async fn build_deps(&self, target: &str, session: &mut Session) -> Option<DepsReport> {
        let Some(backend) = self.backend.as_deref() else {
            log::info!("No package backend, skipping build dependencies of '{}'", target);
            return None;
        };
        if !self.knows(target) {
            return None;
        }

        let records = self.harvest(target, session).await;

        let mut headers = BTreeSet::new();
        for record in self.classifier.compiler_invocations(&records) {
            match self.inspector.system_includes(record).await {
                Ok(paths) => headers.extend(paths),
                Err(e) => log::warn!("Skipping include probe of '{}': {}", record, e),
            }
        }
        log::info!("Target '{}' reads {} system headers", target, headers.len());

        let headers: Vec<PathBuf> = headers.into_iter().collect();
        let mut required = self.providers(backend, &headers).await;
        required.insert(self.settings.runtime_package.clone());

        let reduction = self.reducer(backend).reduce(&required).await;
        Some(DepsReport::new(
            DepsKind::Build,
            format!("target '{}'", target),
            required,
            reduction,
        ))
    }

    /** Packages needed to run the executables `target` links
     *
     * If the shadow run leaves any linked output missing, the log is
     * discarded and the target is run once for real. Outputs still missing
     * after that are skipped, as are outputs that aren't native binaries.
     *
     * # Returns
     * - One report per inspected executable, empty without a backend or
     *   for an unknown target
     */
    pub async fn run_deps(&self, target: &str, session: &mut Session) -> Vec<DepsReport> {
        let Some(backend) = self.backend.as_deref() else {
            log::info!("No package backend, skipping run-time dependencies of '{}'", target);
            return Vec::new();
        };
        if !self.knows(target) {
            return Vec::new();
        }

        let mut records = self.harvest(target, session).await;
        let mut artifacts: Vec<PathBuf> = Vec::new();

        for attempt in 0..2 {
            let outputs: Vec<PathBuf> = self
                .classifier
                .linking_invocations(&records)
                .into_iter()
                .map(output_artifact)
                .collect();

            if attempt == 0 && outputs.iter().any(|out| !out.exists()) {
                log::info!(
                    "Shadow run of '{}' left linked outputs missing, running it for real",
                    target
                );
                session.reset_log();
                if let Err(e) = self.registry.invoke(target, session).await {
                    log::warn!("Target '{}' failed: {}", target, e);
                }
                records = session.log().snapshot();
                continue;
            }

            for out in outputs {
                if !out.exists() {
                    log::info!("'{}' removes its own output {}, skipping", target, out.display());
                } else if !artifacts.contains(&out) {
                    artifacts.push(out);
                }
            }
            break;
        }

        let mut reports = Vec::new();
        for artifact in artifacts {
            if !self.inspector.is_binary(&artifact).await {
                log::debug!("{} is not a native binary, skipping", artifact.display());
                continue;
            }

            let libraries = match self.inspector.linked_libraries(&artifact).await {
                Ok(libraries) => libraries,
                Err(e) => {
                    log::warn!("Skipping {}: {}", artifact.display(), e);
                    continue;
                }
            };

            let required = self.providers(backend, &libraries).await;
            let reduction = self.reducer(backend).reduce(&required).await;
            reports.push(DepsReport::new(
                DepsKind::Runtime,
                artifact.display().to_string(),
                required,
                reduction,
            ));
        }

        reports
    }

    fn knows(&self, target: &str) -> bool {
        let known = self.registry.contains(target);
        if !known {
            log::warn!("No target named '{}', nothing to discover", target);
        }
        known
    }

    /// Runs `target` in shadow mode and returns the commands it submitted.
    async fn harvest(&self, target: &str, session: &mut Session) -> Vec<CommandRecord> {
        let start = session.log().len();
        if let Err(e) = self.registry.invoke_shadow(target, session).await {
            log::warn!("Shadow run of '{}' failed, using the commands seen so far: {}", target, e);
        }

        let records = session.log().snapshot().split_off(start);
        log::debug!("Shadow run of '{}' submitted {} commands", target, records.len());
        records
    }

    async fn providers(&self, backend: &dyn PackageBackend, files: &[PathBuf]) -> BTreeSet<PackageId> {
        match backend.find_providers(files).await {
            Ok(packages) => packages,
            Err(e) => {
                log::warn!("Provider lookup of {} files failed: {}", files.len(), e);
                BTreeSet::new()
            }
        }
    }

    fn reducer<'b>(&self, backend: &'b dyn PackageBackend) -> MinimalSetReducer<'b> {
        let reducer = MinimalSetReducer::new(backend);
        if !self.show_progress {
            return reducer;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        reducer.with_progress(spinner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_renders_full_then_minimal() {
        let required: BTreeSet<PackageId> = ["libfoo-dev", "cargo", "libbar-dev"]
            .into_iter()
            .map(PackageId::from)
            .collect();
        let reduction = Reduction {
            minimal: ["cargo", "libfoo-dev"].into_iter().map(PackageId::from).collect(),
            ..Reduction::default()
        };

        let report = DepsReport::new(DepsKind::Build, "target 'app'", required, reduction);
        assert_eq!(
            report.render(),
            "Build dependencies (full) for target 'app':\ncargo libbar-dev libfoo-dev\n\n\
             Build dependencies (minimal) for target 'app':\ncargo libfoo-dev\n"
        );
    }

    #[test]
    fn default_settings_use_gcc_and_cargo() {
        let settings = DiscoverySettings::default();
        assert_eq!(settings.compilers, ["gcc"]);
        assert_eq!(settings.runtime_package, "cargo");
    }
}
