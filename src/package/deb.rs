//! Debian-family backend (`dpkg` / `apt-cache`).

use super::{PackageBackend, PackageId};
use crate::result::{RmkError, Result};
use crate::utils::process::ProcessManager;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::PathBuf;

// Relations that don't make a package required at build or run time.
const APT_DEPENDS_FLAGS: &[&str] = &[
    "--recurse",
    "--no-recommends",
    "--no-suggests",
    "--no-conflicts",
    "--no-breaks",
    "--no-replaces",
    "--no-enhances",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct DebBackend {
    processes: ProcessManager,
}

impl DebBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PackageBackend for DebBackend {
    fn name(&self) -> &'static str {
        "deb"
    }

    fn query_tool(&self) -> &'static str {
        "dpkg"
    }

    async fn find_providers(&self, files: &[PathBuf]) -> Result<BTreeSet<PackageId>> {
        if files.is_empty() {
            return Ok(BTreeSet::new());
        }

        let mut args: Vec<OsString> = vec!["-S".into()];
        args.extend(files.iter().map(|f| f.as_os_str().to_os_string()));

        // dpkg -S exits 1 when any path is unowned but still lists the others
        let output = self.processes.query("dpkg", args).await?;
        Ok(parse_dpkg_search(&output.stdout))
    }

    async fn find_dependencies(&self, package: &str) -> Result<BTreeSet<PackageId>> {
        let mut args: Vec<&str> = vec!["depends"];
        args.extend_from_slice(APT_DEPENDS_FLAGS);
        args.push(package);

        let output = self.processes.query("apt-cache", args).await?;
        if !output.success() {
            return Err(RmkError::process(format!(
                "apt-cache depends {} failed: {}",
                package,
                output.stderr.trim()
            )));
        }

        Ok(parse_apt_depends(&output.stdout))
    }
}

/** Extracts owners from `dpkg -S` output
 *
 * ```text
 * libc6-dev:amd64: /usr/include/stdio.h
 * libfoo-dev:amd64, libfoo-dev:i386: /usr/include/foo.h
 * diversion by dash from: /bin/sh
 * ```
 */
pub fn parse_dpkg_search(stdout: &str) -> BTreeSet<PackageId> {
    let mut owners = BTreeSet::new();

    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("diversion by") {
            continue;
        }

        let Some((packages, _path)) = line.split_once(": ") else {
            continue;
        };

        for package in packages.split(", ") {
            let name = package.split(':').next().unwrap_or_default().trim();
            if !name.is_empty() {
                owners.insert(PackageId::from(name));
            }
        }
    }

    owners
}

/** Extracts the dependency names from `apt-cache depends --recurse` output
 *
 * Only `Depends:` and `PreDepends:` relations count; alternatives marked
 * with `|` are included and virtual `<names>` are skipped.
 */
pub fn parse_apt_depends(stdout: &str) -> BTreeSet<PackageId> {
    let mut deps = BTreeSet::new();

    for line in stdout.lines() {
        let line = line.trim().trim_start_matches('|');
        let rest = line
            .strip_prefix("Depends:")
            .or_else(|| line.strip_prefix("PreDepends:"));

        if let Some(name) = rest.map(str::trim) {
            if !name.is_empty() && !name.starts_with('<') {
                deps.insert(PackageId::from(name));
            }
        }
    }

    deps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpkg_search_handles_multiarch_and_diversions() {
        let out = "\
libc6-dev:amd64: /usr/include/stdio.h
libgtk-3-dev:amd64, libgtk-3-dev:i386: /usr/include/gtk-3.0/gtk/gtk.h
diversion by dash from: /bin/sh
libc6-dev:amd64: /usr/include/stdlib.h
";
        let owners: Vec<_> = parse_dpkg_search(out).into_iter().collect();
        assert_eq!(owners, ["libc6-dev", "libgtk-3-dev"]);
    }

    #[test]
    fn apt_depends_keeps_only_hard_relations() {
        let out = "\
libgtk-3-dev
  Depends: libgtk-3-0
 |Depends: libglib2.0-dev
  PreDepends: dpkg
  Depends: <libc-dev>
libgtk-3-0
  Depends: libc6
  Depends: libgtk-3-0
";
        let deps: Vec<_> = parse_apt_depends(out).into_iter().collect();
        assert_eq!(deps, ["dpkg", "libc6", "libglib2.0-dev", "libgtk-3-0"]);
    }
}
