use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Directory the makefile places build outputs in.
const BUILD_DIR: &str = "build";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProjectError {
    #[error("Please mention the project to build.\nList of supported projects: {}", supported_list())]
    Missing,
    #[error("Please mention a supported project, '{0}' is not one.\nList of supported projects: {}", supported_list())]
    Unsupported(String),
}

fn supported_list() -> String {
    Project::ALL
        .iter()
        .map(|project| project.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One of the firmware images living in this repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Project {
    Loader,
    Excavator,
    Tipper,
    Dumper,
    Gtruck,
    Bootloader,
}

impl Project {
    /// Every supported project, in the order `all` processes them.
    pub const ALL: [Project; 6] = [
        Project::Loader,
        Project::Excavator,
        Project::Tipper,
        Project::Dumper,
        Project::Gtruck,
        Project::Bootloader,
    ];

    /// The project name, which is also its make target and folder name.
    pub fn name(self) -> &'static str {
        match self {
            Project::Loader => "loader",
            Project::Excavator => "excavator",
            Project::Tipper => "tipper",
            Project::Dumper => "dumper",
            Project::Gtruck => "gtruck",
            Project::Bootloader => "bootloader",
        }
    }

    pub fn is_bootloader(self) -> bool {
        self == Project::Bootloader
    }

    pub fn layout(self) -> MemoryLayout {
        match self {
            Project::Bootloader => BOOTLOADER_LAYOUT,
            Project::Loader
            | Project::Excavator
            | Project::Tipper
            | Project::Dumper
            | Project::Gtruck => APPLICATION_LAYOUT,
        }
    }

    /// `build/<project>/<project>.<extension>`, relative to the repository root.
    pub fn artifact(self, extension: &str) -> PathBuf {
        Path::new(BUILD_DIR)
            .join(self.name())
            .join(format!("{}.{extension}", self.name()))
    }

    pub fn elf_path(self) -> PathBuf {
        self.artifact("elf")
    }

    pub fn map_path(self) -> PathBuf {
        self.artifact("map")
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Project {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Project::ALL
            .into_iter()
            .find(|project| project.name() == lower)
            .ok_or_else(|| ProjectError::Unsupported(s.to_string()))
    }
}

/// What `--project` selected: a single project or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectSelection {
    All,
    One(Project),
}

impl ProjectSelection {
    pub fn projects(self) -> Vec<Project> {
        match self {
            ProjectSelection::All => Project::ALL.to_vec(),
            ProjectSelection::One(project) => vec![project],
        }
    }
}

impl FromStr for ProjectSelection {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(ProjectSelection::All)
        } else {
            s.parse().map(ProjectSelection::One)
        }
    }
}

/// A memory region of the target microcontroller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Ram,
    Flash,
    Quadspi,
    Sdram,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::Ram, Region::Flash, Region::Quadspi, Region::Sdram];

    pub fn name(self) -> &'static str {
        match self {
            Region::Ram => "RAM",
            Region::Flash => "FLASH",
            Region::Quadspi => "QUADSPI",
            Region::Sdram => "SDRAM",
        }
    }
}

/// A half-open address range `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub start: u32,
    pub end: u32,
}

impl AddressRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn size(&self) -> u64 {
        u64::from(self.end.saturating_sub(self.start))
    }
}

/// Address map of one project image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLayout {
    pub ram: AddressRange,
    pub flash: AddressRange,
    pub quadspi: AddressRange,
    pub sdram: AddressRange,
    /// Where the programmer writes the image without an external loader.
    pub app_start: u32,
    /// Where the programmer writes the image through the external loader.
    pub qspi_start: u32,
}

impl MemoryLayout {
    pub fn region(&self, region: Region) -> AddressRange {
        match region {
            Region::Ram => self.ram,
            Region::Flash => self.flash,
            Region::Quadspi => self.quadspi,
            Region::Sdram => self.sdram,
        }
    }
}

const RAM: AddressRange = AddressRange::new(0x2000_0000, 0x2005_0000);
const QUADSPI: AddressRange = AddressRange::new(0x9000_0000, 0x9100_0000);
const SDRAM: AddressRange = AddressRange::new(0x600B_B804, 0x6100_0000);

const APPLICATION_LAYOUT: MemoryLayout = MemoryLayout {
    ram: RAM,
    flash: AddressRange::new(0x0804_0000, 0x0810_0000),
    quadspi: QUADSPI,
    sdram: SDRAM,
    app_start: 0x0804_0000,
    qspi_start: 0x9000_0000,
};

// The bootloader owns the first 256 KiB of flash, the applications start right after it.
const BOOTLOADER_LAYOUT: MemoryLayout = MemoryLayout {
    ram: RAM,
    flash: AddressRange::new(0x0800_0000, 0x0804_0000),
    quadspi: QUADSPI,
    sdram: SDRAM,
    app_start: 0x0800_0000,
    qspi_start: 0x9000_0000,
};

/// Formats an address the way the linker scripts spell them, e.g. `0x600BB804`.
pub fn format_address(address: u32) -> String {
    format!("0x{address:08X}")
}
