use crate::project::{format_address, Project};
use crate::toolchain::Tool;
use crate::util::common_options::{ProjectOptions, TaskContext};
use crate::util::shell::Invocation;

/// Debug port of the STM32 programmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Interface {
    Swd,
    Usb,
}

/// Writes the ELF image of a project to the target board with STM32CubeProgrammer.
///
/// Examples:
///
/// ```text
/// lcs-tasks flash --project loader --interface swd --config 4000000
/// lcs-tasks flash --project loader --interface usb --config 1
/// lcs-tasks flash --project loader --interface swd --exl
/// ```
#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    pub project: ProjectOptions,
    /// Connection to the target.
    #[arg(long, value_enum, default_value_t = Interface::Swd)]
    interface: Interface,
    /// SWD frequency in Hz, or the USB port number when flashing over USB.
    #[arg(long)]
    config: Option<String>,
    /// Flash through the external loader into the QSPI memory.
    #[arg(long)]
    exl: bool,
}

/// Everything needed to build a programmer command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashOptions {
    pub interface: Interface,
    pub config: Option<String>,
    pub external_loader: Option<String>,
    pub swd_frequency: u32,
}

impl FlashOptions {
    /// The `-c port=...` arguments, or `None` if the USB port was not configured.
    pub fn connection(&self) -> Option<Vec<String>> {
        match self.interface {
            Interface::Usb => {
                let port = self.config.as_ref()?;
                Some(vec!["-c".to_string(), format!("port=usb{port}")])
            }
            Interface::Swd => {
                let frequency = self
                    .config
                    .clone()
                    .unwrap_or_else(|| self.swd_frequency.to_string());
                Some(vec![
                    "-c".to_string(),
                    "port=swd".to_string(),
                    format!("freq={frequency}"),
                    "ap=0".to_string(),
                ])
            }
        }
    }
}

impl Cmd {
    pub fn run(self, ctx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        let projects = self.project.projects()?;
        let options = FlashOptions {
            interface: self.interface,
            config: self.config,
            external_loader: self.exl.then(|| ctx.config.external_loader.clone()),
            swd_frequency: ctx.config.swd_frequency,
        };

        for project in projects {
            run_flash(ctx, project, &options)?;
        }
        Ok(())
    }
}

pub fn run_flash(
    ctx: &mut TaskContext<'_>,
    project: Project,
    options: &FlashOptions,
) -> anyhow::Result<()> {
    let Some(connection) = options.connection() else {
        ctx.notice("Error : Config usb port number")?;
        return Ok(());
    };

    let elf = project.elf_path();
    if !ctx.repo_path(&elf).is_file() {
        ctx.notice(format!("elf file not found : {project}\n"))?;
        return Ok(());
    }

    let layout = project.layout();
    let invocation = Invocation::new(ctx.tool(Tool::Stm32ProgrammerCli))
        .args(connection)
        .arg("-w")
        .path_arg(&elf);

    let invocation = match &options.external_loader {
        Some(loader) => invocation
            .arg(format_address(layout.qspi_start))
            .arg("-el")
            .arg(loader.as_str()),
        None => invocation.arg(format_address(layout.app_start)),
    };

    ctx.run(invocation)
}
