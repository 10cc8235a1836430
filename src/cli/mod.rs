pub mod parser;

use crate::commands::CommandExecutor;
use crate::result::Result;
use crate::target::Registry;
use clap::Parser;

#[derive(Parser)]
#[command(name = "rmk")]
#[command(about = "Personal build runner with native dependency discovery")]
#[command(version = "0.1.0")]
#[command(arg_required_else_help = true)]
#[command(
    help_template = "{before-help}{name} v{version}\n\n{about-with-newline}\n{usage-heading} {usage}\n\n{all-args}{after-help}"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Project config file (default: Rmk.toml)")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
pub enum Commands {
    #[command(about = "Run a target")]
    Run {
        #[arg(help = "Target to run (default: configured or last run target)")]
        target: Option<String>,
    },

    #[command(about = "List registered targets")]
    List,

    #[command(name = "build-deps", about = "Show native packages needed to build a target")]
    BuildDeps {
        #[arg(help = "Target to inspect")]
        target: String,
    },

    #[command(name = "run-deps", about = "Show native packages needed to run a target's executables")]
    RunDeps {
        #[arg(help = "Target to inspect")]
        target: String,
    },
}

impl Cli {
    /** Executes the parsed command against `registry`
     *
     * Targets declared in the project config are added to `registry`
     * before the command runs.
     */
    pub async fn execute(self, registry: Registry) -> Result<()> {
        let mut executor = CommandExecutor::load(self.config.as_deref(), registry).await?;

        match self.command {
            Commands::Run { target } => executor.run_target(target).await,
            Commands::List => executor.list_targets().await,
            Commands::BuildDeps { target } => executor.build_deps(target).await,
            Commands::RunDeps { target } => executor.run_deps(target).await,
        }
    }
}
