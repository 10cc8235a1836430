use crate::result::{RmkError, Result};
use std::path::Path;
use tokio::fs;

const DEBIAN_IDS: &[&str] = &["elementary", "ubuntu", "debian"];
const RPM_IDS: &[&str] = &["fedora"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFamily {
    Debian,
    Rpm,
}

/// The `ID` and `ID_LIKE` fields of an os-release file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostRelease {
    pub id: String,
    pub id_like: Vec<String>,
}

impl HostRelease {
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RmkError::not_found(format!(
                "Host identification file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).await?;
        Ok(Self::parse(&content))
    }

    /// Parses os-release content. Unknown keys are ignored and values may be
    /// single- or double-quoted.
    pub fn parse(content: &str) -> Self {
        let mut release = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if let Some(value) = line.strip_prefix("ID=") {
                release.id = unquote(value).to_string();
            } else if let Some(value) = line.strip_prefix("ID_LIKE=") {
                release.id_like = unquote(value)
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
            }
        }

        release
    }

    /// `ID` is checked first, then every `ID_LIKE` entry in order.
    pub fn family(&self) -> Option<HostFamily> {
        std::iter::once(self.id.as_str())
            .chain(self.id_like.iter().map(String::as_str))
            .find_map(|id| {
                if DEBIAN_IDS.contains(&id) {
                    Some(HostFamily::Debian)
                } else if RPM_IDS.contains(&id) {
                    Some(HostFamily::Rpm)
                } else {
                    None
                }
            })
    }
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '"' || c == '\'')
}
