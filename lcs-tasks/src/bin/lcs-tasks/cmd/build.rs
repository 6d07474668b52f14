use crate::project::Project;
use crate::util::common_options::{ProjectOptions, TaskContext};
use crate::util::shell::Invocation;

pub const MAKE: &str = "make";

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    pub project: ProjectOptions,
    /// Number of parallel make jobs. Defaults to the configured value.
    #[arg(long, short)]
    jobs: Option<u32>,
}

impl Cmd {
    pub fn run(self, ctx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        let projects = self.project.projects()?;
        let jobs = self.jobs.unwrap_or(ctx.config.jobs);
        anyhow::ensure!(jobs > 0, "Please specify at least 1 job for the build.");

        for project in projects {
            ctx.run(make_invocation(project, jobs))?;
        }
        Ok(())
    }
}

/// `make -j<jobs> <project>`
pub fn make_invocation(project: Project, jobs: u32) -> Invocation {
    Invocation::new(MAKE)
        .arg(format!("-j{jobs}"))
        .arg(project.name())
}
