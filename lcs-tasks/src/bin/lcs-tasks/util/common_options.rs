use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Result;

use crate::config::Config;
use crate::project::{Project, ProjectError, ProjectSelection};
use crate::toolchain::{Tool, Toolchain};
use crate::util::shell::{Invocation, Runner};

/// Project selection shared by every task.
#[derive(Debug, clap::Parser)]
pub struct ProjectOptions {
    /// The project to work on (same as folder name), or `all`.
    #[arg(long, short)]
    pub project: Option<ProjectSelection>,
}

impl ProjectOptions {
    /// The selected projects, in processing order.
    pub fn projects(&self) -> Result<Vec<Project>, ProjectError> {
        self.project
            .map(ProjectSelection::projects)
            .ok_or(ProjectError::Missing)
    }
}

/// Everything a task needs to run: where the repository is, which tools to use and how to
/// spawn them.
pub struct TaskContext<'a> {
    /// Root of the firmware repository. Relative paths in commands are relative to it.
    pub root: PathBuf,
    pub config: Config,
    pub toolchain: Toolchain,
    pub runner: &'a mut dyn Runner,
    /// Destination of user facing reports.
    pub output: &'a mut dyn Write,
}

impl TaskContext<'_> {
    pub fn tool(&self, tool: Tool) -> &Path {
        self.toolchain.path(tool)
    }

    /// Absolute location of a repository relative `path`.
    pub fn repo_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    pub fn run(&mut self, invocation: Invocation) -> Result<()> {
        tracing::info!("Running `{invocation}`");
        self.runner.run(&invocation)
    }

    pub fn read(&mut self, invocation: Invocation) -> Result<String> {
        tracing::info!("Running `{invocation}`");
        self.runner.read(&invocation)
    }

    pub fn is_dry_run(&self) -> bool {
        self.runner.is_dry_run()
    }

    /// Prints a notice for the user, e.g. about a skipped project.
    pub fn notice(&mut self, message: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", message.as_ref())?;
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(clap::Parser)]
    struct Cli {
        #[clap(flatten)]
        project: ProjectOptions,
    }

    #[test]
    fn missing_project_is_an_error() {
        let cli = Cli::parse_from(["lcs-tasks"]);

        assert_eq!(cli.project.projects().unwrap_err(), ProjectError::Missing);
    }

    #[test]
    fn project_flag_accepts_all_and_short_form() {
        let cli = Cli::parse_from(["lcs-tasks", "--project", "all"]);
        assert_eq!(cli.project.projects().unwrap(), Project::ALL.to_vec());

        let cli = Cli::parse_from(["lcs-tasks", "-p", "Bootloader"]);
        assert_eq!(cli.project.projects().unwrap(), vec![Project::Bootloader]);
    }

    #[test]
    fn unsupported_project_is_rejected_while_parsing() {
        let error = Cli::try_parse_from(["lcs-tasks", "--project", "cheetah"])
            .err()
            .unwrap();

        assert!(error.to_string().contains("List of supported projects"));
    }
}
