use crate::project::Project;
use crate::util::common_options::{ProjectOptions, TaskContext};
use crate::util::shell::Invocation;

const PYTHON: &str = "python";
const MAP_ANALYZER: &str = "analyze_map.py";

/// Analyzes the GNU linker map file of a project.
#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    pub project: ProjectOptions,
    /// Combine the symbols of each object file into one entry.
    #[arg(long)]
    combine: bool,
}

impl Cmd {
    pub fn run(self, ctx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        for project in self.project.projects()? {
            if !ctx.repo_path(project.map_path()).is_file() {
                ctx.notice(format!("Map file not found : {project}"))?;
                continue;
            }
            ctx.run(map_invocation(project, self.combine))?;
        }
        Ok(())
    }
}

pub fn map_invocation(project: Project, combine: bool) -> Invocation {
    let invocation = Invocation::new(PYTHON).arg(MAP_ANALYZER);
    let invocation = if combine {
        invocation.arg("--combine")
    } else {
        invocation
    };
    invocation.path_arg(&project.map_path())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::project::ProjectSelection;
    use crate::util::common_options::test_support::context;
    use crate::util::shell::RecordingRunner;
    use pretty_assertions::assert_eq;

    #[test]
    fn map_commands() {
        assert_eq!(
            map_invocation(Project::Loader, false).to_string(),
            "python analyze_map.py build/loader/loader.map"
        );
        assert_eq!(
            map_invocation(Project::Bootloader, true).to_string(),
            "python analyze_map.py --combine build/bootloader/bootloader.map"
        );
    }

    #[test]
    fn only_projects_with_a_map_file_are_analyzed() {
        let root = tempfile::tempdir().unwrap();
        let map = root.path().join(Project::Dumper.map_path());
        std::fs::create_dir_all(map.parent().unwrap()).unwrap();
        std::fs::write(&map, "Memory Configuration").unwrap();

        let mut runner = RecordingRunner::default();
        let mut output = Vec::new();
        let mut ctx = context(root.path(), &mut runner, &mut output);

        let cmd = Cmd {
            project: ProjectOptions {
                project: Some(ProjectSelection::All),
            },
            combine: true,
        };
        cmd.run(&mut ctx).unwrap();
        drop(ctx);

        assert_eq!(
            runner.commands(),
            vec!["python analyze_map.py --combine build/dumper/dumper.map"]
        );
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Map file not found : loader"));
        assert!(!output.contains("Map file not found : dumper"));
    }
}
