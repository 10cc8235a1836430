use crate::discovery::{DiscoverySettings, RUNTIME_PACKAGE};
use crate::exec::Cmd;
use crate::result::{RmkError, Result};
use crate::target::{CommandTarget, Registry};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const CONFIG_FILE: &str = "Rmk.toml";
pub const DEFAULT_CACHE_DIR: &str = ".rmk";
pub const DEFAULT_OS_RELEASE: &str = "/etc/os-release";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    pub project: Project,
    pub discovery: Discovery,
    pub targets: BTreeMap<SmolStr, TargetSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Project {
    pub default_target: Option<SmolStr>,
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Discovery {
    pub compilers: Vec<String>,
    pub runtime_package: SmolStr,
    pub os_release: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TargetSpec {
    pub description: Option<String>,
    pub dirs: Vec<PathBuf>,
    /// One argv per command, program first.
    pub commands: Vec<Vec<String>>,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            default_target: None,
            cache_dir: DEFAULT_CACHE_DIR.into(),
        }
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self {
            compilers: vec!["gcc".to_string()],
            runtime_package: RUNTIME_PACKAGE.into(),
            os_release: DEFAULT_OS_RELEASE.into(),
        }
    }
}

impl ProjectConfig {
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: ProjectConfig = toml::from_str(&content).inspect_err(|e| {
            log::error!("Invalid {}: {}", path.display(), e);
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reads `path` if it exists, otherwise returns the defaults.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let config = Self::from_file(path).await?;
        log::info!(
            "Loaded {} with {} targets",
            path.display(),
            config.targets.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.project.cache_dir.as_os_str().is_empty() {
            return Err(RmkError::config("Cache directory cannot be empty"));
        }

        if self.discovery.runtime_package.is_empty() {
            return Err(RmkError::config("Runtime package cannot be empty"));
        }

        for (name, spec) in &self.targets {
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(RmkError::config(format!("Invalid target name '{}'", name)));
            }
            if spec.commands.iter().any(|argv| argv.is_empty()) {
                return Err(RmkError::config(format!(
                    "Target '{}' has an empty command",
                    name
                )));
            }
        }

        if let Some(default) = &self.project.default_target {
            if !self.targets.is_empty() && !self.targets.contains_key(default) {
                log::warn!("Default target '{}' is not declared in config", default);
            }
        }

        Ok(())
    }

    pub fn discovery_settings(&self) -> DiscoverySettings {
        DiscoverySettings {
            compilers: self.discovery.compilers.clone(),
            runtime_package: self.discovery.runtime_package.clone(),
        }
    }

    /// Adds every configured target to `registry`. Config targets replace
    /// built-in ones of the same name.
    pub fn register_targets(&self, registry: &mut Registry) -> Result<()> {
        for (name, spec) in &self.targets {
            let commands = spec
                .commands
                .iter()
                .map(|argv| Cmd::from_argv(argv.as_slice()))
                .collect::<Result<Vec<_>>>()?;

            registry.register(
                name.clone(),
                CommandTarget::new(spec.description.clone(), spec.dirs.clone(), commands),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[project]
default_target = "app"

[discovery]
compilers = ["gcc", "cc"]

[targets.app]
description = "Build the demo binary"
dirs = ["bin"]
commands = [["gcc", "-o", "bin/app", "main.c"]]
"#;

    #[test]
    fn parses_sections_and_fills_defaults() {
        let config: ProjectConfig = toml::from_str(SAMPLE).unwrap();
        config.validate().unwrap();

        assert_eq!(config.project.default_target.as_deref(), Some("app"));
        assert_eq!(config.project.cache_dir, PathBuf::from(".rmk"));
        assert_eq!(config.discovery.compilers, ["gcc", "cc"]);
        assert_eq!(config.discovery.runtime_package, "cargo");
        assert_eq!(config.discovery.os_release, PathBuf::from("/etc/os-release"));

        let app = &config.targets["app"];
        assert_eq!(app.dirs, [PathBuf::from("bin")]);
        assert_eq!(app.commands[0], ["gcc", "-o", "bin/app", "main.c"]);
    }

    #[test]
    fn empty_command_is_rejected() {
        let config: ProjectConfig = toml::from_str("[targets.x]\ncommands = [[]]\n").unwrap();
        assert!(matches!(config.validate(), Err(RmkError::Config(_))));
    }

    #[test]
    fn targets_land_in_the_registry() {
        let config: ProjectConfig = toml::from_str(SAMPLE).unwrap();
        let mut registry = Registry::new();
        config.register_targets(&mut registry).unwrap();

        assert!(registry.contains("app"));
        assert_eq!(
            registry.get("app").unwrap().description(),
            Some("Build the demo binary")
        );
    }

    #[tokio::test]
    async fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::load_or_default(&dir.path().join(CONFIG_FILE))
            .await
            .unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[tokio::test]
    async fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[project\n").unwrap();
        assert!(matches!(
            ProjectConfig::from_file(&path).await,
            Err(RmkError::TomlParse(_))
        ));
    }
}
