use crate::build::ProjectConfig;
use crate::cli::parser::CliParser;
use crate::exec::Session;
use crate::result::{RmkError, Result};
use crate::target::Registry;
use chrono::Utc;
use smol_str::SmolStr;

pub const LAST_TARGET_KEY: &str = "last_target";
pub const LAST_RUN_AT_KEY: &str = "last_run_at";

/// The requested target, else the configured default, else the target run
/// last time.
pub fn resolve_target(
    requested: Option<&str>,
    config: &ProjectConfig,
    session: &Session,
) -> Result<SmolStr> {
    if let Some(name) = requested {
        return Ok(CliParser::validate_target_name(name)?.into());
    }

    if let Some(default) = &config.project.default_target {
        return Ok(default.clone());
    }

    session
        .recall::<SmolStr>(LAST_TARGET_KEY)
        .ok_or_else(|| RmkError::config(RmkError::NO_DEFAULT_TARGET))
}

pub async fn execute(
    config: &ProjectConfig,
    registry: &Registry,
    session: &mut Session,
    target: Option<&str>,
) -> Result<()> {
    let name = resolve_target(target, config, session)?;
    log::info!("Running target '{}'", name);

    let result = registry.invoke(&name, session).await;

    match &result {
        Ok(_) => {
            log::info!("Target '{}' finished", name);
            if config.project.default_target.as_ref() != Some(&name) {
                session.remember(LAST_TARGET_KEY, &name).await?;
            }
            session
                .remember(LAST_RUN_AT_KEY, Utc::now().to_rfc3339())
                .await?;
        }
        Err(e) => log::error!("Target '{}' failed: {}", name, e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Cmd;
    use crate::target::{task, TargetFuture};

    fn ok(s: &mut Session) -> TargetFuture<'_> {
        task(async move {
            s.ex(&Cmd::new("true")).await?;
            Ok(())
        })
    }

    #[tokio::test]
    async fn successful_run_remembers_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(dir.path()).await.unwrap();
        let config = ProjectConfig::default();
        let mut registry = Registry::new();
        registry.register("check", ok);

        assert!(matches!(
            resolve_target(None, &config, &session),
            Err(RmkError::Config(_))
        ));

        execute(&config, &registry, &mut session, Some("check"))
            .await
            .unwrap();

        assert_eq!(resolve_target(None, &config, &session).unwrap(), "check");
        assert!(session.recall::<String>(LAST_RUN_AT_KEY).is_some());

        let reopened = Session::open(dir.path()).await.unwrap();
        assert_eq!(reopened.recall::<String>(LAST_TARGET_KEY).as_deref(), Some("check"));
    }

    #[tokio::test]
    async fn configured_default_wins_over_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(dir.path()).await.unwrap();
        session.remember(LAST_TARGET_KEY, "old").await.unwrap();

        let mut config = ProjectConfig::default();
        config.project.default_target = Some("app".into());

        assert_eq!(resolve_target(None, &config, &session).unwrap(), "app");
        assert_eq!(resolve_target(Some("lib"), &config, &session).unwrap(), "lib");
    }

    #[tokio::test]
    async fn unknown_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(dir.path()).await.unwrap();
        let result = execute(
            &ProjectConfig::default(),
            &Registry::new(),
            &mut session,
            Some("nope"),
        )
        .await;
        assert!(matches!(result, Err(RmkError::NotFound(_))));
        assert!(session.recall::<String>(LAST_TARGET_KEY).is_none());
    }
}
