use clap::Parser;
use dirs::config_dir;
use env_logger::Builder;
use log::LevelFilter;
use rmk::cli::Cli;
use rmk::result::Result;
use rmk::target::Registry;
use std::fs::OpenOptions;

/** Entry point of the rmk binary
 *
 * # Process Flow
 * 1. Initialize file logging
 * 2. Parse command line arguments using Clap
 * 3. Run the command against the target registry
 *
 * Targets come from `Rmk.toml`. Programs embedding rmk as a library
 * register their own targets in the [`Registry`] before calling
 * [`Cli::execute`].
 *
 * # Example
 * ```bash
 * rmk list
 * rmk run app
 * rmk build-deps app
 * ```
 */
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(e.exit_code());
        }
    };

    let result = cli.execute(Registry::new()).await;
    if let Err(e) = &result {
        log::error!("{}", e);
    }
    result
}

/** Initializes the logging system with file-based output
 *
 * # Configuration
 * - Log file location: `<config_dir>/rmk/rmk.log`
 * - Log level: Info and above, `RUST_LOG` overrides
 * - Output: Append mode to preserve historical logs
 *
 * Logging is best effort: if the file can't be opened, logs go to stderr.
 */
fn init_logging() {
    let log_file = get_log_file_path();

    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Info).parse_default_env();

    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_file) {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    log::info!("rmk started");
}

fn get_log_file_path() -> std::path::PathBuf {
    if let Some(config_dir) = config_dir() {
        config_dir.join("rmk").join("rmk.log")
    } else {
        std::env::current_dir()
            .map(|p| p.join("rmk.log"))
            .unwrap_or_else(|_| "rmk.log".into())
    }
}
