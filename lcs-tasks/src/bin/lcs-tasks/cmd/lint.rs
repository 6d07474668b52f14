use crate::cmd::beautify::source_dir;
use crate::project::Project;
use crate::toolchain::{Tool, Toolchain};
use crate::util::common_options::{ProjectOptions, TaskContext};
use crate::util::shell::Invocation;

/// Runs cppcheck static analysis on a project.
#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    pub project: ProjectOptions,
}

impl Cmd {
    pub fn run(self, ctx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        for project in self.project.projects()? {
            let invocation = cppcheck_invocation(&ctx.toolchain, project);
            ctx.run(invocation)?;
        }
        Ok(())
    }
}

/// `cppcheck --force` over the project sources. The MISRA addon is not enabled.
pub fn cppcheck_invocation(toolchain: &Toolchain, project: Project) -> Invocation {
    Invocation::new(toolchain.path(Tool::Cppcheck))
        .arg("--force")
        .arg(source_dir(project))
}
