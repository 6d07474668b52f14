use crate::cmd::build::MAKE;
use crate::util::common_options::{ProjectOptions, TaskContext};
use crate::util::shell::Invocation;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    pub project: ProjectOptions,
}

impl Cmd {
    /// The makefile cleans all projects at once, so the project is only validated.
    pub fn run(self, ctx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        self.project.projects()?;
        ctx.run(Invocation::new(MAKE).arg("clean"))
    }
}
