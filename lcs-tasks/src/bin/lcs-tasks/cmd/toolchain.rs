use std::io::Write;

use crate::toolchain::{Tool, Toolchain, ToolchainSource};
use crate::util::common_options::TaskContext;
use crate::util::table::Table;

/// Shows where every tool resolves to and whether it is installed.
#[derive(clap::Parser)]
pub struct Cmd {}

impl Cmd {
    pub fn run(self, ctx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        print_toolchain(&mut *ctx.output, &ctx.toolchain)
    }
}

pub fn print_toolchain(mut output: impl Write, toolchain: &Toolchain) -> anyhow::Result<()> {
    match toolchain.source() {
        ToolchainSource::SystemPath => writeln!(output, "Toolchain: PATH")?,
        ToolchainSource::Repository(repo) => {
            writeln!(output, "Toolchain: repository at {}", repo.display())?
        }
    }

    let mut table = Table::new(["Tool", "Path", "Status"]);
    for tool in Tool::ALL {
        let (path, status) = match toolchain.locate(tool) {
            Some(found) => (found, "found"),
            None => (toolchain.path(tool).to_path_buf(), "missing"),
        };
        table.push_row(vec![
            tool.executable().to_string(),
            path.display().to_string(),
            status.to_string(),
        ]);
    }
    table.render(output)?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::toolchain::HostPlatform;

    #[test]
    fn lists_every_tool() {
        let repo = tempfile::tempdir().unwrap();
        let toolchain = Toolchain::from_repository(repo.path(), HostPlatform::Linux);

        let mut buffer = Vec::new();
        print_toolchain(&mut buffer, &toolchain).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.starts_with(&format!(
            "Toolchain: repository at {}\n",
            repo.path().display()
        )));
        for tool in Tool::ALL {
            assert!(output.contains(tool.executable()), "{}", tool.executable());
        }
        assert!(output.contains("│ missing │"));
    }
}
