use crate::project::Project;
use crate::toolchain::{Tool, Toolchain};
use crate::util::common_options::{ProjectOptions, TaskContext};
use crate::util::shell::Invocation;

/// Style definition handed to astyle, relative to the repository root.
const ASTYLE_OPTIONS: &str = "--options=astyle_c.options.txt";

/// Formats the C sources of a project with astyle (one true brace style).
///
/// Examples:
///
/// ```text
/// lcs-tasks beautify --project loader
/// lcs-tasks beautify --check -p all
/// ```
#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    pub project: ProjectOptions,
    /// Dry run: report badly formatted files without modifying them.
    #[arg(long, short)]
    check: bool,
}

impl Cmd {
    pub fn run(self, ctx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        for project in self.project.projects()? {
            let invocation = astyle_invocation(&ctx.toolchain, project, self.check);
            ctx.run(invocation)?;
        }
        Ok(())
    }
}

/// Source directory of a project, with a trailing separator.
pub fn source_dir(project: Project) -> String {
    if project.is_bootloader() {
        "LCSBoot/".to_string()
    } else {
        format!("LCSApp/{project}/")
    }
}

pub fn astyle_invocation(toolchain: &Toolchain, project: Project, check: bool) -> Invocation {
    let mode: &[&str] = if check {
        &["--dry-run", "--errors-to-stdout"]
    } else {
        &["--formatted"]
    };

    Invocation::new(toolchain.path(Tool::Astyle))
        .arg(ASTYLE_OPTIONS)
        .arg("--recursive")
        .args(mode.iter().copied())
        .arg(format!("{}*.c,*.h", source_dir(project)))
}
