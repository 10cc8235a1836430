//! Execution context handed to every target.
//!
//! All side effects a target is allowed to have go through [`Session`]:
//! running commands, creating directories and writing the persistent cache.
//! In [`ExecMode::Shadow`] none of them happen; commands are only recorded
//! in the [`CommandLog`]. Targets that touch the filesystem by other means
//! break shadow mode, and nothing here can detect it.

pub mod command;

pub use command::{Cmd, CommandLog, CommandRecord, Output, StdoutMode};

use crate::cache::PersistentCache;
use crate::result::Result;
use crate::utils::process::ProcessManager;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    Shadow,
    #[default]
    Live,
}

pub struct Session {
    mode: ExecMode,
    log: CommandLog,
    cache: PersistentCache,
    processes: ProcessManager,
}

impl Session {
    pub fn new(cache: PersistentCache) -> Self {
        Self {
            mode: ExecMode::Live,
            log: CommandLog::new(),
            cache,
            processes: ProcessManager::new(),
        }
    }

    /// Opens a live session backed by the cache stored in `cache_dir`.
    pub async fn open(cache_dir: &Path) -> Result<Self> {
        Ok(Self::new(PersistentCache::load(cache_dir).await?))
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    pub fn is_shadow(&self) -> bool {
        self.mode == ExecMode::Shadow
    }

    pub fn enter_shadow(&mut self) {
        log::debug!("Entering shadow mode");
        self.mode = ExecMode::Shadow;
    }

    pub fn leave_shadow(&mut self) {
        log::debug!("Leaving shadow mode");
        self.mode = ExecMode::Live;
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    pub fn reset_log(&mut self) {
        self.log.reset();
    }

    /** Submits a command
     *
     * The command is always appended to the log. In live mode it is echoed
     * (unless silenced) and executed; in shadow mode `Output::shadow()` is
     * returned and nothing runs.
     */
    pub async fn ex(&mut self, cmd: &Cmd) -> Result<Output> {
        let record = cmd.record();
        log::debug!("Submitted: {}", record);
        self.log.push(record.clone());

        if self.is_shadow() {
            return Ok(Output::shadow());
        }

        if cmd.echoes() {
            println!("{}", record);
        }

        self.processes.run(cmd).await
    }

    pub async fn ensure_dir(&self, path: impl AsRef<Path>) -> Result<()> {
        if self.is_shadow() {
            return Ok(());
        }

        let path = path.as_ref();
        if !path.exists() {
            tokio::fs::create_dir_all(path).await?;
            log::info!("Created directory: {}", path.display());
        }
        Ok(())
    }

    /// Reads a cached value. Entries that don't deserialize into `T` read as
    /// missing.
    pub fn recall<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.cache
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Stores `value` under `key` and writes the cache file. A no-op in
    /// shadow mode.
    pub async fn remember<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        if self.is_shadow() {
            return Ok(());
        }

        self.cache.insert(key, serde_json::to_value(value)?);
        self.cache.save().await
    }

    /** Returns the cached value for `key`, storing `default` first if the
     * key is missing
     *
     * In shadow mode the default is returned without being stored.
     */
    pub async fn remember_default<T>(&mut self, key: &str, default: T) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        if let Some(value) = self.recall(key) {
            return Ok(value);
        }

        if !self.is_shadow() {
            self.cache.insert(key, serde_json::to_value(&default)?);
            self.cache.save().await?;
        }
        Ok(default)
    }

    /** Calls `f(&args)` only when `args` differ from the last call made
     * under `name`, otherwise returns the cached result
     *
     * The arguments are stored as `<name>_args` and the result as `<name>`.
     * In shadow mode a changed argument list still calls `f` but nothing is
     * written.
     */
    pub async fn memoize<A, R, F>(&mut self, name: &str, args: A, f: F) -> Result<R>
    where
        A: Serialize,
        R: Serialize + DeserializeOwned,
        F: FnOnce(&A) -> R,
    {
        let args_key = format!("{}_args", name);
        let args_value = serde_json::to_value(&args)?;

        if self.cache.get(&args_key) == Some(&args_value) {
            if let Some(cached) = self.recall::<R>(name) {
                return Ok(cached);
            }
        }

        let result = f(&args);

        if !self.is_shadow() {
            self.cache.insert(args_key, args_value);
            self.cache.insert(name, serde_json::to_value(&result)?);
            self.cache.save().await?;
        }
        Ok(result)
    }

    pub fn cache(&self) -> &PersistentCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn session_in(dir: &Path) -> Session {
        Session::open(&dir.join(".rmk")).await.unwrap()
    }

    #[tokio::test]
    async fn shadow_records_without_running() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("touched");
        let mut session = session_in(dir.path()).await;

        session.enter_shadow();
        let out = session
            .ex(&Cmd::new("touch").arg(marker.to_string_lossy()))
            .await
            .unwrap();
        session.leave_shadow();

        assert_eq!(out, Output::shadow());
        assert!(!marker.exists());
        assert_eq!(session.log().len(), 1);
        assert_eq!(session.mode(), ExecMode::Live);
    }

    #[tokio::test]
    async fn live_commands_are_logged_too() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path()).await;

        let out = session
            .ex(&Cmd::new("echo").arg("hi").capture())
            .await
            .unwrap();
        assert_eq!(out.stdout, "hi");
        assert_eq!(session.log().snapshot()[0].to_string(), "echo hi");
    }

    #[tokio::test]
    async fn remember_writes_through_only_when_live() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path()).await;

        session.enter_shadow();
        session.remember("mode", "release").await.unwrap();
        assert_eq!(session.recall::<String>("mode"), None);
        assert!(!session.cache().path().exists());
        session.leave_shadow();

        session.remember("mode", "release").await.unwrap();
        let reopened = session_in(dir.path()).await;
        assert_eq!(reopened.recall::<String>("mode").as_deref(), Some("release"));
    }

    #[tokio::test]
    async fn remember_default_keeps_existing_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path()).await;

        let first: String = session.remember_default("mode", "debug".into()).await.unwrap();
        let second: String = session
            .remember_default("mode", "release".into())
            .await
            .unwrap();
        assert_eq!(first, "debug");
        assert_eq!(second, "debug");
    }

    #[tokio::test]
    async fn memoize_reruns_only_on_changed_args() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path()).await;
        let mut calls = 0;

        let a: u32 = session
            .memoize("square", 3u32, |x| {
                calls += 1;
                x * x
            })
            .await
            .unwrap();
        let b: u32 = session
            .memoize("square", 3u32, |x| {
                calls += 1;
                x * x
            })
            .await
            .unwrap();
        let c: u32 = session
            .memoize("square", 4u32, |x| {
                calls += 1;
                x * x
            })
            .await
            .unwrap();

        assert_eq!((a, b, c), (9, 9, 16));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn ensure_dir_is_gated() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path()).await;
        let bin = dir.path().join("bin");

        session.enter_shadow();
        session.ensure_dir(&bin).await.unwrap();
        assert!(!bin.exists());

        session.leave_shadow();
        session.ensure_dir(&bin).await.unwrap();
        assert!(bin.is_dir());
    }
}
