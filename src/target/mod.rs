use crate::exec::{Cmd, Session};
use crate::result::{RmkError, Result};
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

/// Future returned by a target handler. Targets run on a single thread, so
/// no `Send` bound.
pub type TargetFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a>>;

/// Boxes a target body. Going through this helper pins the body's output to
/// `Result<()>`, so `?` inside the `async` block needs no annotations.
pub fn task<'a>(body: impl Future<Output = Result<()>> + 'a) -> TargetFuture<'a> {
    Box::pin(body)
}

/** A named build action
 *
 * Plain functions with the right shape are targets already:
 * ```
 * use rmk::exec::{Cmd, Session};
 * use rmk::target::{task, Registry, TargetFuture};
 *
 * fn app(s: &mut Session) -> TargetFuture<'_> {
 *     task(async move {
 *         s.ensure_dir("bin").await?;
 *         s.ex(&Cmd::new("gcc").args(["-o", "bin/app", "main.c"])).await?;
 *         Ok(())
 *     })
 * }
 *
 * let mut registry = Registry::new();
 * registry.register("app", app);
 * assert!(registry.contains("app"));
 * ```
 *
 * A target may be invoked in shadow mode at any time, possibly more than
 * once. Every side effect must go through the [`Session`].
 */
pub trait Target {
    fn run<'a>(&'a self, session: &'a mut Session) -> TargetFuture<'a>;

    fn description(&self) -> Option<&str> {
        None
    }
}

impl<F> Target for F
where
    F: for<'a> Fn(&'a mut Session) -> TargetFuture<'a>,
{
    fn run<'a>(&'a self, session: &'a mut Session) -> TargetFuture<'a> {
        self(session)
    }
}

/// Target declared in `Rmk.toml` as a list of directories and commands.
#[derive(Debug, Clone)]
pub struct CommandTarget {
    description: Option<String>,
    dirs: Vec<PathBuf>,
    commands: Vec<Cmd>,
}

impl CommandTarget {
    pub fn new(description: Option<String>, dirs: Vec<PathBuf>, commands: Vec<Cmd>) -> Self {
        Self {
            description,
            dirs,
            commands,
        }
    }
}

impl Target for CommandTarget {
    fn run<'a>(&'a self, session: &'a mut Session) -> TargetFuture<'a> {
        task(async move {
            for dir in &self.dirs {
                session.ensure_dir(dir).await?;
            }

            for cmd in &self.commands {
                let output = session.ex(cmd).await?;
                if !output.success() {
                    return Err(RmkError::target(format!(
                        "'{}' exited with status {}",
                        cmd.record(),
                        output.status.unwrap_or(-1)
                    )));
                }
            }
            Ok(())
        })
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Name → handler map, populated at startup.
#[derive(Default)]
pub struct Registry {
    targets: BTreeMap<SmolStr, Box<dyn Target>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `target` under `name`, replacing any earlier registration.
    pub fn register(&mut self, name: impl Into<SmolStr>, target: impl Target + 'static) {
        let name = name.into();
        if self.targets.insert(name.clone(), Box::new(target)).is_some() {
            log::warn!("Target '{}' registered twice, keeping the last one", name);
        }
    }

    pub fn get(&self, name: &str) -> Result<&dyn Target> {
        match self.targets.get(name) {
            Some(target) => Ok(target.as_ref()),
            None => Err(RmkError::not_found(format!("No target named '{}'", name))),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    /// Target names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(SmolStr::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Runs the named target with whatever mode `session` is in.
    pub async fn invoke(&self, name: &str, session: &mut Session) -> Result<()> {
        let target = self.get(name)?;
        log::info!("Invoking target '{}' ({:?})", name, session.mode());
        target.run(session).await
    }

    /// Runs the named target in shadow mode and returns to live mode
    /// whatever the outcome.
    pub async fn invoke_shadow(&self, name: &str, session: &mut Session) -> Result<()> {
        let target = self.get(name)?;
        session.enter_shadow();
        log::info!("Invoking target '{}' in shadow mode", name);
        let result = target.run(session).await;
        session.leave_shadow();
        result
    }
}
