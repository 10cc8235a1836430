pub mod deps;
pub mod list;
pub mod run;

use crate::build::{ProjectConfig, CONFIG_FILE};
use crate::cli::parser::CliParser;
use crate::exec::Session;
use crate::result::Result;
use crate::target::Registry;
use smol_str::SmolStr;
use std::path::Path;

#[derive(Debug)]
pub enum CommandType {
    Run { target: Option<SmolStr> },
    List,
    BuildDeps { target: SmolStr },
    RunDeps { target: SmolStr },
}

impl CommandType {
    pub async fn execute(self, executor: &mut CommandExecutor) -> Result<()> {
        let CommandExecutor {
            config,
            registry,
            session,
        } = executor;

        match self {
            CommandType::Run { target } => {
                run::execute(config, registry, session, target.as_deref()).await
            }
            CommandType::List => list::execute(config, registry),
            CommandType::BuildDeps { target } => {
                deps::execute_build(config, registry, session, &target).await
            }
            CommandType::RunDeps { target } => {
                deps::execute_run(config, registry, session, &target).await
            }
        }
    }
}

/// Loaded project state every command runs against.
pub struct CommandExecutor {
    config: ProjectConfig,
    registry: Registry,
    session: Session,
}

impl CommandExecutor {
    pub fn new(config: ProjectConfig, registry: Registry, session: Session) -> Self {
        Self {
            config,
            registry,
            session,
        }
    }

    /** Loads the project config, merges its targets into `registry` and
     * opens a live session on the configured cache directory
     *
     * An explicit `config_path` must exist; the default `Rmk.toml` may be
     * absent.
     */
    pub async fn load(config_path: Option<&str>, mut registry: Registry) -> Result<Self> {
        let config = match config_path {
            Some(path) => ProjectConfig::from_file(&CliParser::validate_config_path(path)?).await?,
            None => ProjectConfig::load_or_default(Path::new(CONFIG_FILE)).await?,
        };

        config.register_targets(&mut registry)?;
        let session = Session::open(&config.project.cache_dir).await?;

        Ok(Self::new(config, registry, session))
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn run_target(&mut self, target: Option<String>) -> Result<()> {
        CommandType::Run {
            target: target.map(|s| s.into()),
        }
        .execute(self)
        .await
    }

    pub async fn list_targets(&mut self) -> Result<()> {
        CommandType::List.execute(self).await
    }

    pub async fn build_deps(&mut self, target: String) -> Result<()> {
        CommandType::BuildDeps {
            target: target.into(),
        }
        .execute(self)
        .await
    }

    pub async fn run_deps(&mut self, target: String) -> Result<()> {
        CommandType::RunDeps {
            target: target.into(),
        }
        .execute(self)
        .await
    }
}
