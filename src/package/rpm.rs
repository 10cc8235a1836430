//! RPM-family backend (`rpm` / `dnf`).

use super::{bare_names, PackageBackend, PackageId};
use crate::result::{RmkError, Result};
use crate::utils::process::ProcessManager;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Default, Clone, Copy)]
pub struct RpmBackend {
    processes: ProcessManager,
}

impl RpmBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PackageBackend for RpmBackend {
    fn name(&self) -> &'static str {
        "rpm"
    }

    fn query_tool(&self) -> &'static str {
        "rpm"
    }

    async fn find_providers(&self, files: &[PathBuf]) -> Result<BTreeSet<PackageId>> {
        if files.is_empty() {
            return Ok(BTreeSet::new());
        }

        let mut args: Vec<OsString> = vec!["-qf".into(), "--queryformat".into(), "%{NAME}\\n".into()];
        args.extend(files.iter().map(|f| f.as_os_str().to_os_string()));

        // Unowned files are reported inline and turn the exit status non-zero
        let output = self.processes.query("rpm", args).await?;
        Ok(bare_names(&output.stdout))
    }

    async fn find_dependencies(&self, package: &str) -> Result<BTreeSet<PackageId>> {
        // --installed: an unrestricted recursive resolve is far too slow
        let args = [
            "repoquery",
            "--qf",
            "%{NAME}",
            "--requires",
            "--resolve",
            "--installed",
            "--recursive",
            package,
        ];

        let output = self.processes.query("dnf", args).await?;
        if !output.success() {
            return Err(RmkError::process(format!(
                "dnf repoquery {} failed: {}",
                package,
                output.stderr.trim()
            )));
        }

        Ok(bare_names(&output.stdout))
    }
}
