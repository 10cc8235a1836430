//! Native package manager backends.
//!
//! Dependency discovery only needs two questions answered by the host's
//! package manager: which packages own a set of files, and what a package's
//! transitive dependency closure is. [`PackageBackend`] is that capability;
//! [`detect_backend`] picks an implementation once at startup from
//! `/etc/os-release`.

pub mod deb;
pub mod host;
pub mod rpm;

pub use deb::DebBackend;
pub use host::{HostFamily, HostRelease};
pub use rpm::RpmBackend;

use crate::result::Result;
use crate::utils::process::ProcessManager;
use async_trait::async_trait;
use smol_str::SmolStr;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Backend-specific package name.
pub type PackageId = SmolStr;

#[async_trait]
pub trait PackageBackend: Send + Sync {
    /// Short name used in log lines ("deb", "rpm").
    fn name(&self) -> &'static str;

    /// Program the backend can't work without.
    fn query_tool(&self) -> &'static str;

    /// Packages owning any of `files`. Files nobody owns are left out.
    async fn find_providers(&self, files: &[PathBuf]) -> Result<BTreeSet<PackageId>>;

    /// Transitive dependency closure of `package`.
    async fn find_dependencies(&self, package: &str) -> Result<BTreeSet<PackageId>>;
}

/// Reads the host identification file and returns the matching backend,
/// or `None` on unknown or unreadable hosts.
pub async fn detect_backend(os_release: &Path) -> Option<Box<dyn PackageBackend>> {
    let release = match HostRelease::load(os_release).await {
        Ok(release) => release,
        Err(e) => {
            log::info!("No package backend: {}", e);
            return None;
        }
    };

    let backend = backend_for(&release)?;
    let tool = backend.query_tool();
    if !ProcessManager::new().has_executable(tool) {
        log::warn!("Host looks like {} but '{}' is not installed", backend.name(), tool);
        return None;
    }
    Some(backend)
}

pub fn backend_for(release: &HostRelease) -> Option<Box<dyn PackageBackend>> {
    match release.family() {
        Some(HostFamily::Debian) => Some(Box::new(DebBackend::new())),
        Some(HostFamily::Rpm) => Some(Box::new(RpmBackend::new())),
        None => {
            log::info!(
                "No package backend for host id '{}' (like: {:?})",
                release.id,
                release.id_like
            );
            None
        }
    }
}

/// Keeps lines that are a bare package name, the way `rpm --queryformat`
/// and `dnf repoquery --qf` print them. Diagnostics contain spaces and are
/// dropped.
pub(crate) fn bare_names(stdout: &str) -> BTreeSet<PackageId> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains(char::is_whitespace))
        .map(PackageId::from)
        .collect()
}
