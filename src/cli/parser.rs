use crate::result::{RmkError, Result};
use std::path::PathBuf;

pub struct CliParser;

impl CliParser {
    pub fn validate_config_path(path: &str) -> Result<PathBuf> {
        let config_path = PathBuf::from(path);

        if !config_path.exists() {
            return Err(RmkError::NotFound(
                format!("Config file not found: {}", path).into(),
            ));
        }

        if !config_path.is_file() {
            return Err(RmkError::Config("Path is not a file".into()));
        }

        Ok(config_path)
    }

    pub fn validate_target_name(name: &str) -> Result<&str> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RmkError::Config("Target name cannot be empty".into()));
        }

        if name.contains(char::is_whitespace) {
            return Err(RmkError::Config(
                format!("Target name '{}' contains whitespace", name).into(),
            ));
        }

        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_must_be_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Rmk.toml");
        std::fs::write(&file, "").unwrap();

        assert!(CliParser::validate_config_path(file.to_str().unwrap()).is_ok());
        assert!(matches!(
            CliParser::validate_config_path(dir.path().to_str().unwrap()),
            Err(RmkError::Config(_))
        ));
        assert!(matches!(
            CliParser::validate_config_path("/nonexistent/Rmk.toml"),
            Err(RmkError::NotFound(_))
        ));
    }

    #[test]
    fn target_names() {
        assert_eq!(CliParser::validate_target_name(" app ").unwrap(), "app");
        assert!(CliParser::validate_target_name("").is_err());
        assert!(CliParser::validate_target_name("two words").is_err());
    }
}
