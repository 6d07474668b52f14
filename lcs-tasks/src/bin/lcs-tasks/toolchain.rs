use std::{
    collections::HashMap,
    ffi::OsStr,
    path::{Path, PathBuf},
};

/// Name of the `bin` folder inside every toolchain package.
const BIN: &str = "bin";

#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    #[error("Unsupported platform '{0}'. Toolchains are only packaged for Linux, macOS and Windows.")]
    UnsupportedPlatform(String),
}

/// Operating systems the toolchain repository ships binaries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Linux,
    Darwin,
    Windows,
}

impl HostPlatform {
    pub fn current() -> Result<Self, ToolchainError> {
        Self::from_os(std::env::consts::OS)
    }

    fn from_os(os: &str) -> Result<Self, ToolchainError> {
        match os {
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::Darwin),
            "windows" => Ok(Self::Windows),
            other => Err(ToolchainError::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// An executable the tasks shell out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    ArmGcc,
    ArmReadelf,
    ArmGdb,
    ArmGdbPy,
    Astyle,
    Cppcheck,
    OpenOcd,
    Doxygen,
    Graphviz,
    PdfLatex,
    Hhc,
    Stm32ProgrammerCli,
}

impl Tool {
    pub const ALL: [Tool; 12] = [
        Tool::ArmGcc,
        Tool::ArmReadelf,
        Tool::ArmGdb,
        Tool::ArmGdbPy,
        Tool::Astyle,
        Tool::Cppcheck,
        Tool::OpenOcd,
        Tool::Doxygen,
        Tool::Graphviz,
        Tool::PdfLatex,
        Tool::Hhc,
        Tool::Stm32ProgrammerCli,
    ];

    pub fn executable(self) -> &'static str {
        match self {
            Tool::ArmGcc => "arm-none-eabi-gcc",
            Tool::ArmReadelf => "arm-none-eabi-readelf",
            Tool::ArmGdb => "arm-none-eabi-gdb",
            Tool::ArmGdbPy => "arm-none-eabi-gdb-py",
            Tool::Astyle => "astyle",
            Tool::Cppcheck => "cppcheck",
            Tool::OpenOcd => "openocd",
            Tool::Doxygen => "doxygen",
            Tool::Graphviz => "dot",
            Tool::PdfLatex => "pdflatex",
            Tool::Hhc => "hhc",
            Tool::Stm32ProgrammerCli => "STM32_Programmer_CLI",
        }
    }

    pub fn download_url(self) -> &'static str {
        match self {
            Tool::ArmGcc | Tool::ArmReadelf | Tool::ArmGdb | Tool::ArmGdbPy => {
                "https://developer.arm.com/open-source/gnu-toolchain/gnu-rm/downloads"
            }
            Tool::Astyle => "http://astyle.sourceforge.net",
            Tool::Cppcheck => "http://cppcheck.sourceforge.net",
            Tool::OpenOcd => "http://openocd.org/getting-openocd",
            Tool::Doxygen => "https://www.doxygen.nl/download.html",
            Tool::Graphviz => "https://graphviz.org/download/",
            Tool::PdfLatex => "https://miktex.org/download",
            Tool::Hhc => "https://www.helpndoc.com/step-by-step-guides/how-to-download-and-install-microsofts-html-help-workshop-compiler/",
            Tool::Stm32ProgrammerCli => "https://www.st.com/en/development-tools/stm32cubeprog.html",
        }
    }

    /// Package folder and platform folder of this tool inside the toolchain repository.
    ///
    /// Returns `None` for tools which are not packaged for `host` and have to come from `PATH`.
    fn repository_location(self, host: HostPlatform) -> Option<(&'static str, &'static str)> {
        use HostPlatform::{Darwin, Linux, Windows};

        let location = match (self, host) {
            (Tool::ArmGcc | Tool::ArmReadelf | Tool::ArmGdb | Tool::ArmGdbPy, host) => (
                "embsw-toolchain-armgcc",
                match host {
                    Linux => "gcc-arm-none-eabi-10-2020-q4-major-x86_64-linux",
                    Darwin => "gcc-arm-none-eabi-10-2020-q4-major-osx",
                    Windows => "gcc-arm-none-eabi-10-2020-q4-major-windows",
                },
            ),
            (Tool::Astyle, host) => (
                "embsw-toolchain-astyle",
                match host {
                    Linux => "astyle-linux",
                    Darwin => "astyle-osx",
                    Windows => "astyle-windows",
                },
            ),
            (Tool::Cppcheck, host) => (
                "embsw-toolchain-cppcheck",
                match host {
                    Linux => "cppcheck-linux",
                    Darwin => "cppcheck-osx",
                    Windows => "cppcheck-windows",
                },
            ),
            (Tool::OpenOcd, host) => (
                "embsw-toolchain-openocd",
                match host {
                    Linux => "xpack-openocd-0.10.0-15-linux-x64",
                    Darwin => "xpack-openocd-0.10.0-15-darwin-x64",
                    Windows => "xpack-openocd-0.10.0-15-windows-x64",
                },
            ),
            (Tool::Doxygen, host) => (
                "embsw-toolchain-doxygen",
                match host {
                    Linux => "doxygen-linux",
                    Darwin => "doxygen-osx",
                    Windows => "doxygen-windows",
                },
            ),
            (Tool::Stm32ProgrammerCli, host) => (
                "embsw-toolchain-stm32programmercli",
                match host {
                    Linux => "stm32programmercli-linux",
                    Darwin => "stm32programmercli-osx",
                    Windows => "stm32programmercli-windows",
                },
            ),
            // The documentation helpers are only bundled with the Windows doxygen package.
            (Tool::Graphviz, Windows) => ("embsw-toolchain-doxygen", "graphviz-windows"),
            (Tool::PdfLatex, Windows) => ("embsw-toolchain-doxygen", "miktex-windows"),
            (Tool::Hhc, Windows) => ("embsw-toolchain-doxygen", "hhc-windows"),
            (Tool::Graphviz | Tool::PdfLatex | Tool::Hhc, Linux | Darwin) => return None,
        };

        Some(location)
    }
}

/// Where the executables of a [`Toolchain`] come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainSource {
    /// Bare executable names, looked up in `PATH` when run.
    SystemPath,
    /// Absolute locations inside a checkout of the toolchain repository.
    Repository(PathBuf),
}

/// Resolved locations of every [`Tool`].
#[derive(Debug, Clone)]
pub struct Toolchain {
    source: ToolchainSource,
    paths: HashMap<Tool, PathBuf>,
}

impl Toolchain {
    /// Resolves the toolchain for the running host.
    ///
    /// With a `repository` every packaged tool resolves into it, otherwise all tools are
    /// expected in `PATH` and a warning is emitted for each one that is missing.
    pub fn resolve(repository: Option<&Path>) -> Result<Self, ToolchainError> {
        match repository {
            Some(repository) => {
                tracing::info!(
                    "Using toolchains available from the toolchain repository at {}",
                    repository.display()
                );
                let toolchain = Self::from_repository(repository, HostPlatform::current()?);
                for tool in Tool::ALL {
                    tracing::debug!("{} -> {}", tool.executable(), toolchain.path(tool).display());
                }
                Ok(toolchain)
            }
            None => {
                tracing::info!("No toolchain repository configured, using toolchains from PATH");
                let toolchain = Self::from_system_path();
                toolchain.warn_missing();
                Ok(toolchain)
            }
        }
    }

    pub fn from_system_path() -> Self {
        let paths = Tool::ALL
            .into_iter()
            .map(|tool| (tool, PathBuf::from(tool.executable())))
            .collect();

        Self {
            source: ToolchainSource::SystemPath,
            paths,
        }
    }

    pub fn from_repository(repository: &Path, host: HostPlatform) -> Self {
        let paths = Tool::ALL
            .into_iter()
            .map(|tool| {
                let path = match tool.repository_location(host) {
                    Some((package, platform)) => repository
                        .join(package)
                        .join(platform)
                        .join(BIN)
                        .join(executable_name(tool, host)),
                    None => PathBuf::from(tool.executable()),
                };
                (tool, path)
            })
            .collect();

        Self {
            source: ToolchainSource::Repository(repository.to_path_buf()),
            paths,
        }
    }

    pub fn source(&self) -> &ToolchainSource {
        &self.source
    }

    pub fn path(&self, tool: Tool) -> &Path {
        // Both constructors insert every tool.
        &self.paths[&tool]
    }

    /// Returns where `tool` was found on disk, if anywhere.
    pub fn locate(&self, tool: Tool) -> Option<PathBuf> {
        let path = self.path(tool);
        if path.components().count() > 1 {
            path.is_file().then(|| path.to_path_buf())
        } else {
            find_in_path(path.as_os_str())
        }
    }

    /// Emits a warning for every tool which cannot be found. Missing tools are not fatal,
    /// a task only fails once it actually needs one.
    pub fn warn_missing(&self) -> Vec<Tool> {
        let missing: Vec<_> = Tool::ALL
            .into_iter()
            .filter(|tool| self.locate(*tool).is_none())
            .collect();

        for tool in &missing {
            tracing::warn!(
                "Couldn't find `{}`. This tool can be found here: > {}.",
                tool.executable(),
                tool.download_url()
            );
        }

        missing
    }
}

fn executable_name(tool: Tool, host: HostPlatform) -> String {
    match host {
        HostPlatform::Windows => format!("{}.exe", tool.executable()),
        HostPlatform::Linux | HostPlatform::Darwin => tool.executable().to_string(),
    }
}

fn find_in_path(executable: &OsStr) -> Option<PathBuf> {
    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path).find_map(|dir| {
        let candidate = dir.join(executable);
        if candidate.is_file() {
            return Some(candidate);
        }
        let candidate = candidate.with_extension(std::env::consts::EXE_EXTENSION);
        candidate.is_file().then_some(candidate)
    })
}
