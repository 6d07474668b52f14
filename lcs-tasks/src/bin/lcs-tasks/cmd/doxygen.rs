use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::project::Project;
use crate::toolchain::Tool;
use crate::util::common_options::{ProjectOptions, TaskContext};
use crate::util::shell::Invocation;

/// Generates the HTML help (`.chm`) and PDF documentation of a project.
#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    pub project: ProjectOptions,
}

impl Cmd {
    pub fn run(self, ctx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        for project in self.project.projects()? {
            run_doxygen(ctx, project)?;
        }
        Ok(())
    }
}

/// `<project>/Doxygen`, relative to the repository root.
pub fn doxygen_dir(project: Project) -> PathBuf {
    Path::new(project.name()).join("Doxygen")
}

/// One document produced by a doxygen output folder.
struct Deliverable {
    folder: &'static str,
    file_stem: &'static str,
    extension: &'static str,
}

const CHM: Deliverable = Deliverable {
    folder: "html",
    file_stem: "index",
    extension: "chm",
};

const PDF: Deliverable = Deliverable {
    folder: "latex",
    file_stem: "refman",
    extension: "pdf",
};

impl Deliverable {
    fn file_name(&self) -> String {
        format!("{}.{}", self.file_stem, self.extension)
    }
}

pub fn run_doxygen(ctx: &mut TaskContext<'_>, project: Project) -> anyhow::Result<()> {
    let doxygen_dir = doxygen_dir(project);
    let doxyfile = doxygen_dir.join("Doxyfile");
    if !ctx.repo_path(&doxyfile).is_file() {
        ctx.notice(format!("Doxyfile not found : {project}\n"))?;
        return Ok(());
    }

    let doxygen = Invocation::new(ctx.tool(Tool::Doxygen)).path_arg(&doxyfile);
    ctx.run(doxygen)?;

    let html_dir = ctx.repo_path(doxygen_dir.join(CHM.folder));
    let hhc = Invocation::new(ctx.tool(Tool::Hhc))
        .arg("index.hhp")
        .current_dir(&html_dir);
    ctx.run(hhc)?;

    let latex_dir = ctx.repo_path(doxygen_dir.join(PDF.folder));
    let pdflatex = Invocation::new(ctx.tool(Tool::PdfLatex))
        .arg("refman.tex")
        .current_dir(&latex_dir);

    if ctx.is_dry_run() {
        ctx.run(pdflatex)?;
        tracing::info!("Leaving the doxygen output of {project} in place");
        return Ok(());
    }

    remove_files_except(&html_dir, &CHM.file_name())?;
    ctx.run(pdflatex)?;
    remove_files_except(&latex_dir, &PDF.file_name())?;
    remove_if_exists(&latex_dir.join("Makefile"))?;

    let doxygen_dir = ctx.repo_path(&doxygen_dir);
    publish(&doxygen_dir, project, &CHM)?;
    publish(&doxygen_dir, project, &PDF)?;

    Ok(())
}

/// Deletes every `*.*` file in `dir` except `keep`.
fn remove_files_except(dir: &Path, keep: &str) -> anyhow::Result<()> {
    let pattern = format!("{}/*.*", glob::Pattern::escape(&dir.to_string_lossy()));

    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if !path.is_file() || path.file_name().is_some_and(|name| name == keep) {
            continue;
        }
        tracing::debug!("Removing {}", path.display());
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }

    Ok(())
}

fn remove_if_exists(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Moves the deliverable to `<doxygen_dir>/<project>.<extension>` and drops its output folder.
fn publish(doxygen_dir: &Path, project: Project, deliverable: &Deliverable) -> anyhow::Result<()> {
    let folder = doxygen_dir.join(deliverable.folder);
    let source = folder.join(deliverable.file_name());
    let destination = doxygen_dir.join(format!("{project}.{}", deliverable.extension));

    remove_if_exists(&destination)?;
    fs::rename(&source, &destination).with_context(|| {
        format!(
            "Failed to move {} to {}",
            source.display(),
            destination.display()
        )
    })?;

    fs::remove_dir_all(&folder)
        .with_context(|| format!("Failed to remove {}", folder.display()))?;

    Ok(())
}
