mod cmd;
mod config;
mod project;
mod toolchain;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use crate::config::{load_config, Config};
use crate::toolchain::Toolchain;
use crate::util::common_options::{ProjectOptions, TaskContext};
use crate::util::logging::{setup_logging, LevelFilter};
use crate::util::shell::{DryRunner, Runner, ShellRunner};

#[derive(clap::Parser)]
#[clap(
    name = "lcs-tasks",
    about = "Build, check, document and flash the LCS firmware projects",
    version
)]
struct Cli {
    /// Location for log file
    #[clap(long, global = true, help_heading = "LOG CONFIGURATION")]
    log_file: Option<PathBuf>,
    /// Log level on stderr. Falls back to `RUST_LOG`, then WARN.
    #[clap(long, global = true, value_enum, help_heading = "LOG CONFIGURATION")]
    log_level: Option<LevelFilter>,

    /// Checkout of the toolchain repository. Without it, all tools are taken from PATH.
    #[clap(long, global = true, env = "TOOLCHAIN_REPO")]
    toolchain_repo: Option<PathBuf>,
    /// Print the commands instead of running them.
    #[clap(long, global = true)]
    dry_run: bool,

    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[derive(clap::Subcommand)]
enum Subcommand {
    /// Build all/specific project
    Build(cmd::build::Cmd),
    /// Clean the build outputs
    Clean(cmd::clean::Cmd),
    /// Format the sources with astyle
    Beautify(cmd::beautify::Cmd),
    /// Static analysis with cppcheck
    Lint(cmd::lint::Cmd),
    /// Show the memory usage of the built image
    Size(cmd::size::Cmd),
    /// Generate the CHM and PDF documentation
    Doxygen(cmd::doxygen::Cmd),
    /// Flash the ELF image to the target board
    Flash(cmd::flash::Cmd),
    /// Analyze the linker map file
    Map(cmd::map::Cmd),
    /// Run the peripheral tests
    Test(cmd::pytest::Cmd),
    /// Show where the tools are resolved from
    Toolchain(cmd::toolchain::Cmd),
}

impl Subcommand {
    /// Project selection of the task, `None` for tasks that are not bound to a project.
    fn project(&self) -> Option<&ProjectOptions> {
        match self {
            Subcommand::Build(cmd) => Some(&cmd.project),
            Subcommand::Clean(cmd) => Some(&cmd.project),
            Subcommand::Beautify(cmd) => Some(&cmd.project),
            Subcommand::Lint(cmd) => Some(&cmd.project),
            Subcommand::Size(cmd) => Some(&cmd.project),
            Subcommand::Doxygen(cmd) => Some(&cmd.project),
            Subcommand::Flash(cmd) => Some(&cmd.project),
            Subcommand::Map(cmd) => Some(&cmd.project),
            Subcommand::Test(cmd) => Some(&cmd.project),
            Subcommand::Toolchain(_) => None,
        }
    }

    fn run(self, ctx: &mut TaskContext<'_>) -> Result<()> {
        match self {
            Subcommand::Build(cmd) => cmd.run(ctx),
            Subcommand::Clean(cmd) => cmd.run(ctx),
            Subcommand::Beautify(cmd) => cmd.run(ctx),
            Subcommand::Lint(cmd) => cmd.run(ctx),
            Subcommand::Size(cmd) => cmd.run(ctx),
            Subcommand::Doxygen(cmd) => cmd.run(ctx),
            Subcommand::Flash(cmd) => cmd.run(ctx),
            Subcommand::Map(cmd) => cmd.run(ctx),
            Subcommand::Test(cmd) => cmd.run(ctx),
            Subcommand::Toolchain(cmd) => cmd.run(ctx),
        }
    }
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("\n{}", "Error:".red().bold());
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    let _logger_guard = setup_logging(cli.log_file.as_deref(), cli.log_level)?;

    if let Some(project) = cli.subcommand.project() {
        project.projects()?;
    }

    let config = load_config().context("Failed to load configuration.")?;
    let repository = toolchain_repository(cli.toolchain_repo, &config);
    let toolchain = Toolchain::resolve(repository.as_deref())?;

    let mut runner: Box<dyn Runner> = if cli.dry_run {
        Box::new(DryRunner)
    } else {
        Box::new(ShellRunner::new()?)
    };
    let mut stdout = std::io::stdout();

    let mut ctx = TaskContext {
        root: std::env::current_dir().context("Unable to determine the current directory.")?,
        config,
        toolchain,
        runner: runner.as_mut(),
        output: &mut stdout,
    };

    cli.subcommand.run(&mut ctx)
}

/// The command line (or `TOOLCHAIN_REPO`) wins over the configuration file.
fn toolchain_repository(cli: Option<PathBuf>, config: &Config) -> Option<PathBuf> {
    cli.or_else(|| config.toolchain_repo.clone())
}
