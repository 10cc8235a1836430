//! Shared libraries an executable loads at run time.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

// `libm.so.6 => /lib/libm.so.6 (0x...)` or `/lib64/ld-linux-x86-64.so.2 (0x...)`
static LDD_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*(?:[^ \t]+[ \t]+=>[ \t]+)?(/[^ \t]+)[ \t]+\(0x[0-9a-fA-F]+\)").unwrap()
});

// Injected by the kernel/loader, never backed by a file on disk.
const VIRTUAL_OBJECTS: &[&str] = &["linux-vdso", "linux-gate"];

/** Library paths from `ldd` output
 *
 * Virtual objects and unresolved (`not found`) entries are left out.
 */
pub fn parse_ldd(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .filter(|line| !VIRTUAL_OBJECTS.iter().any(|v| line.contains(v)))
        .filter_map(|line| LDD_LINE_REGEX.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| PathBuf::from(m.as_str())))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Checks the ELF magic number. Unreadable or short files are not binaries.
pub async fn is_elf(path: &Path) -> bool {
    let Ok(mut file) = File::open(path).await else {
        return false;
    };

    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic).await {
        Ok(_) => magic == ELF_MAGIC,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ldd_output_resolves_to_paths() {
        let out = "\
\tlinux-vdso.so.1 (0x00007ffc8a3f2000)
\tlibgtk-3.so.0 => /lib/x86_64-linux-gnu/libgtk-3.so.0 (0x00007f1c2d400000)
\tlibm.so.6 => /lib/x86_64-linux-gnu/libm.so.6 (0x00007f1c2d319000)
\tlibmissing.so.1 => not found
\t/lib64/ld-linux-x86-64.so.2 (0x00007f1c2dc5e000)
";
        assert_eq!(
            parse_ldd(out),
            [
                PathBuf::from("/lib/x86_64-linux-gnu/libgtk-3.so.0"),
                PathBuf::from("/lib/x86_64-linux-gnu/libm.so.6"),
                PathBuf::from("/lib64/ld-linux-x86-64.so.2"),
            ]
        );
    }

    #[test]
    fn static_binaries_have_no_libraries() {
        assert!(parse_ldd("\tstatically linked\n").is_empty());
    }

    #[tokio::test]
    async fn elf_check_reads_the_magic() {
        let dir = tempfile::tempdir().unwrap();
        let elf = dir.path().join("app");
        let script = dir.path().join("run.sh");
        let tiny = dir.path().join("tiny");

        std::fs::write(&elf, [0x7f, b'E', b'L', b'F', 2, 1, 1, 0]).unwrap();
        std::fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();
        std::fs::write(&tiny, [0x7f]).unwrap();

        assert!(is_elf(&elf).await);
        assert!(!is_elf(&script).await);
        assert!(!is_elf(&tiny).await);
        assert!(!is_elf(&dir.path().join("missing")).await);
    }
}
