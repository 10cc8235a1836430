use std::borrow::Cow;
use thiserror::Error;

/** Main Result type alias for rmk operations
 *
 * # Usage
 * ```no_run
 * use rmk::result::Result;
 *
 * fn read_config() -> Result<String> {
 *     // Function automatically propagates RmkError
 *     Ok(std::fs::read_to_string("Rmk.toml")?)
 * }
 * ```
 */
pub type Result<T> = std::result::Result<T, RmkError>;

/** Error enumeration for the build runner
 *
 * # Error Categories
 * - **Io**: File system and I/O operations
 * - **Process**: External process execution failures
 * - **Config**: Project configuration parsing and validation errors
 * - **NotFound**: Missing targets, files or executables
 * - **Target**: A target handler reported a failure
 * - **TomlParse**: `Rmk.toml` parsing failures
 * - **JsonError**: Persistent cache (de)serialization failures
 *
 * # Design Notes
 * - Uses `Cow<'static, str>` so literal messages don't allocate
 * - Dependency discovery never returns these; failures are logged and
 *   degrade the report
 */
#[derive(Error, Debug)]
pub enum RmkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process error: {0}")]
    Process(Cow<'static, str>),

    #[error("Config error: {0}")]
    Config(Cow<'static, str>),

    #[error("Not found: {0}")]
    NotFound(Cow<'static, str>),

    #[error("Target error: {0}")]
    Target(Cow<'static, str>),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RmkError {
    pub const NO_DEFAULT_TARGET: &'static str =
        "No target given and no default or previously run target is known";
    pub const EMPTY_COMMAND: &'static str = "Command has no program";

    /** Creates a Process error with flexible message input
     *
     * # Example
     * ```ignore
     * RmkError::process("gcc exited with status 1");
     * RmkError::process(format!("Failed to spawn {}", program));
     * ```
     */
    pub fn process(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Process(msg.into())
    }

    pub fn config(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    /** Creates a Target error
     *
     * # Use Cases
     * - A registered handler gave up part way through
     * - A config-defined command exited with a non-zero status
     */
    pub fn target(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Target(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pick_the_matching_variant() {
        assert!(matches!(RmkError::process("x"), RmkError::Process(_)));
        assert!(matches!(RmkError::config("x"), RmkError::Config(_)));
        assert!(matches!(RmkError::not_found("x"), RmkError::NotFound(_)));
        assert!(matches!(RmkError::target("x"), RmkError::Target(_)));
    }

    #[test]
    fn display_carries_the_category() {
        let err = RmkError::not_found(format!("Target '{}'", "app"));
        assert_eq!(err.to_string(), "Not found: Target 'app'");
    }
}
