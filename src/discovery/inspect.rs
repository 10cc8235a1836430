use super::compiler::{include_probe_args, parse_dependency_listing};
use super::linked::{is_elf, parse_ldd};
use crate::exec::CommandRecord;
use crate::result::{RmkError, Result};
use crate::utils::process::ProcessManager;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/** Questions discovery asks about compiler commands and their outputs
 *
 * These probes run for real even while the target itself is being run in
 * shadow mode. They only read the build tree and write throwaway temporary
 * files.
 */
#[async_trait]
pub trait ArtifactInspector: Send + Sync {
    /// Absolute header paths the compilation in `record` reads.
    async fn system_includes(&self, record: &CommandRecord) -> Result<Vec<PathBuf>>;

    /// Shared libraries `artifact` loads at run time.
    async fn linked_libraries(&self, artifact: &Path) -> Result<Vec<PathBuf>>;

    /// Whether `artifact` is a native executable worth inspecting.
    async fn is_binary(&self, artifact: &Path) -> bool;
}

/// Inspector backed by the compiler's `-M` mode, `ldd` and ELF headers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInspector {
    processes: ProcessManager,
}

impl SystemInspector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactInspector for SystemInspector {
    async fn system_includes(&self, record: &CommandRecord) -> Result<Vec<PathBuf>> {
        let program = record
            .program()
            .ok_or_else(|| RmkError::process(RmkError::EMPTY_COMMAND))?;

        let listing = tempfile::Builder::new()
            .prefix("rmk-deps-")
            .tempfile()?;
        let args = include_probe_args(record, listing.path());

        let output = self.processes.query_in(record.dir(), program, &args).await?;
        if !output.success() {
            return Err(RmkError::process(format!(
                "Dependency listing for '{}' failed: {}",
                record,
                output.stderr.trim()
            )));
        }

        let content = tokio::fs::read_to_string(listing.path()).await?;
        let headers = parse_dependency_listing(&content);
        log::debug!("'{}' reads {} system headers", record, headers.len());
        Ok(headers)
    }

    async fn linked_libraries(&self, artifact: &Path) -> Result<Vec<PathBuf>> {
        let output = self.processes.query("ldd", [artifact]).await?;
        if !output.success() {
            return Err(RmkError::process(format!(
                "ldd {} failed: {}",
                artifact.display(),
                output.stderr.trim()
            )));
        }

        Ok(parse_ldd(&output.stdout))
    }

    async fn is_binary(&self, artifact: &Path) -> bool {
        is_elf(artifact).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    // Stand-in compiler driver: needs `main.c` in its working directory and
    // writes a make rule to the file after `-MF`.
    const FAKE_CC: &str = r#"#!/bin/sh
listing=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-MF" ]; then listing="$2"; fi
  shift
done
[ -f main.c ] || { echo "main.c: No such file" >&2; exit 1; }
printf 'main.o: main.c /usr/include/stdio.h \\\n /usr/include/foo/foo.h\n' > "$listing"
"#;

    fn install_fake_cc(dir: &Path) -> PathBuf {
        let cc = dir.join("fake-cc");
        std::fs::write(&cc, FAKE_CC).unwrap();
        std::fs::set_permissions(&cc, std::fs::Permissions::from_mode(0o755)).unwrap();
        cc
    }

    #[tokio::test]
    async fn include_listing_round_trip() {
        let tools = tempfile::tempdir().unwrap();
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("main.c"), "int main(void) { return 0; }\n").unwrap();
        let cc = install_fake_cc(tools.path());

        let record = CommandRecord::new(vec![
            cc.to_string_lossy().into_owned(),
            "-o".to_string(),
            "app".to_string(),
            "main.c".to_string(),
        ])
        .with_dir(src.path());

        let headers = SystemInspector::new().system_includes(&record).await.unwrap();
        assert_eq!(
            headers,
            [
                PathBuf::from("/usr/include/foo/foo.h"),
                PathBuf::from("/usr/include/stdio.h"),
            ]
        );
        assert!(!src.path().join("app").exists());
    }

    #[tokio::test]
    async fn failing_include_listing_is_an_error() {
        let tools = tempfile::tempdir().unwrap();
        let empty = tempfile::tempdir().unwrap();
        let cc = install_fake_cc(tools.path());

        let record = CommandRecord::new(vec![cc.to_string_lossy().into_owned(), "main.c".to_string()])
            .with_dir(empty.path());

        let err = SystemInspector::new().system_includes(&record).await.unwrap_err();
        assert!(matches!(err, RmkError::Process(_)));
    }

    #[tokio::test]
    async fn only_elf_files_are_binaries() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("run.sh");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();

        let inspector = SystemInspector::new();
        assert!(!inspector.is_binary(&script).await);
        assert!(!inspector.is_binary(&dir.path().join("missing")).await);
    }
}
