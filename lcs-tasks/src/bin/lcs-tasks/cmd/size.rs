use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;

use crate::project::{format_address, AddressRange, MemoryLayout, Project, Region};
use crate::toolchain::Tool;
use crate::util::common_options::{ProjectOptions, TaskContext};
use crate::util::shell::Invocation;
use crate::util::table::Table;

/// Hexadecimal literals in the `readelf` dump.
static HEX_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)0x[0-9a-f]+").expect("hex literal pattern is valid"));

/// Number of leading characters (`0x` and two digits) an address has to share with a
/// region start to be attributed to that region.
const ADDRESS_PREFIX_LEN: usize = 4;

/// Distance from a segment address to its memory size in a `readelf -l` program header
/// line (`VirtAddr PhysAddr FileSiz MemSiz`).
const SIZE_OFFSET: usize = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SizeError {
    #[error("Region size must not be zero.")]
    EmptyRegion,
    #[error("'{0}' is not a valid hexadecimal size.")]
    InvalidHex(String),
    #[error("The segment sizes of the {0} region add up to more than 64 bits.")]
    Overflow(&'static str),
}

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    pub project: ProjectOptions,
}

impl Cmd {
    pub fn run(self, ctx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        for project in self.project.projects()? {
            run_size(ctx, project)?;
        }
        Ok(())
    }
}

/// Prints the memory usage of the project's ELF image, region by region.
pub fn run_size(ctx: &mut TaskContext<'_>, project: Project) -> anyhow::Result<()> {
    let elf = project.elf_path();
    if !ctx.repo_path(&elf).is_file() {
        ctx.notice(format!("\nELF file not found : {project}\n"))?;
        return Ok(());
    }

    let invocation = Invocation::new(ctx.tool(Tool::ArmReadelf))
        .arg("-l")
        .path_arg(&elf);
    let dump = ctx
        .read(invocation)
        .with_context(|| format!("Failed to read the program headers of {project}"))?;
    if ctx.is_dry_run() {
        return Ok(());
    }

    let tokens = hex_tokens(&dump);
    let report = usage_report(&project.layout(), &tokens)?;

    ctx.notice("")?;
    render_report(&report)?.render(&mut *ctx.output)?;

    Ok(())
}

/// Every hexadecimal literal in `text`, in order of appearance.
pub fn hex_tokens(text: &str) -> Vec<&str> {
    HEX_LITERAL.find_iter(text).map(|m| m.as_str()).collect()
}

fn shares_prefix(token: &str, start: &str) -> bool {
    match (token.get(..ADDRESS_PREFIX_LEN), start.get(..ADDRESS_PREFIX_LEN)) {
        (Some(token), Some(start)) => token.eq_ignore_ascii_case(start),
        _ => false,
    }
}

fn parse_hex(token: &str) -> Result<u64, SizeError> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u64::from_str_radix(digits, 16).map_err(|_| SizeError::InvalidHex(token.to_string()))
}

/// Sums the memory sizes of the segments placed in `region`.
///
/// A token whose leading characters match those of `start` is taken as a segment address
/// and the token three positions later as its size. RAM adds up every match, the other
/// regions only take the first one. Returns `None` if no segment lives in the region.
pub fn find_memory_usage(
    start: u32,
    tokens: &[&str],
    region: Region,
) -> Result<Option<u64>, SizeError> {
    let start = format!("{start:#010x}");
    let mut usage: Option<u64> = None;

    for (index, token) in tokens
        .iter()
        .enumerate()
        .take(tokens.len().saturating_sub(1))
    {
        if !shares_prefix(token, &start) {
            continue;
        }
        let Some(size) = tokens.get(index + SIZE_OFFSET) else {
            break;
        };

        let size = parse_hex(size)?;
        let total = usage
            .unwrap_or(0)
            .checked_add(size)
            .ok_or(SizeError::Overflow(region.name()))?;
        usage = Some(total);

        if region != Region::Ram {
            break;
        }
    }

    Ok(usage)
}

/// `100 * used / max` with two decimals, e.g. `"12.34%"`.
pub fn percentage(used: u64, max: u64) -> Result<String, SizeError> {
    if max == 0 {
        return Err(SizeError::EmptyRegion);
    }

    let pct = 100.0 * (used as f64 / max as f64);
    Ok(format!("{pct:.2}%"))
}

/// Usage of one region of a project image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionUsage {
    pub region: Region,
    pub range: AddressRange,
    pub used: u64,
}

impl RegionUsage {
    pub fn size(&self) -> u64 {
        self.range.size()
    }

    /// Negative if the image overflows the region.
    pub fn free(&self) -> i64 {
        self.size() as i64 - self.used as i64
    }

    pub fn usage(&self) -> Result<String, SizeError> {
        percentage(self.used, self.size())
    }
}

/// Computes the usage of every region found in `tokens`.
///
/// RAM and FLASH are always reported. QUADSPI and SDRAM are left out when the image places
/// nothing in them.
pub fn usage_report(layout: &MemoryLayout, tokens: &[&str]) -> Result<Vec<RegionUsage>, SizeError> {
    let mut report = Vec::new();

    for region in Region::ALL {
        let range = layout.region(region);
        let used = match (find_memory_usage(range.start, tokens, region)?, region) {
            (Some(used), _) => used,
            (None, Region::Ram | Region::Flash) => 0,
            (None, Region::Quadspi | Region::Sdram) => continue,
        };

        report.push(RegionUsage {
            region,
            range,
            used,
        });
    }

    Ok(report)
}

fn render_report(report: &[RegionUsage]) -> Result<Table, SizeError> {
    let mut table = Table::new([
        "Region",
        "Start address",
        "End address",
        "Size",
        "Free",
        "Used",
        "Usage",
    ]);

    for usage in report {
        table.push_row(vec![
            usage.region.name().to_string(),
            format_address(usage.range.start),
            format_address(usage.range.end),
            usage.size().to_string(),
            usage.free().to_string(),
            usage.used.to_string(),
            usage.usage()?,
        ]);
    }

    Ok(table)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::common_options::test_support::context;
    use crate::util::shell::{DryRunner, RecordingRunner};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const READELF_OUTPUT: &str = "
Elf file type is EXEC (Executable file)
Entry point 0x8040a15
There are 3 program headers, starting at offset 52

Program Headers:
  Type           Offset   VirtAddr   PhysAddr   FileSiz MemSiz  Flg Align
  LOAD           0x010000 0x08040000 0x08040000 0x1a2b4 0x1a2b4 R E 0x10000
  LOAD           0x030000 0x20000000 0x0805a2b4 0x00400 0x01000 RW  0x10000
  LOAD           0x031000 0x90000000 0x90000000 0x02000 0x02000 R   0x10000

 Section to Segment mapping:
  Segment Sections...
   00     .isr_vector .text .rodata .ARM.attributes .init_array .fini_array
   01     .data .bss
   02     .qspi
";

    #[test]
    fn extracts_hex_literals_in_order() {
        let tokens = hex_tokens("LOAD 0x010000 0X08040000 offset 52 0xAbC");

        assert_eq!(tokens, vec!["0x010000", "0X08040000", "0xAbC"]);
    }

    #[test]
    fn flash_takes_the_first_segment() {
        let tokens = hex_tokens(READELF_OUTPUT);

        assert_eq!(
            find_memory_usage(0x0804_0000, &tokens, Region::Flash).unwrap(),
            Some(0x1a2b4)
        );
    }

    #[test]
    fn quadspi_stops_after_first_match() {
        let tokens = hex_tokens(READELF_OUTPUT);

        // The physical address matches as well but is never counted.
        assert_eq!(
            find_memory_usage(0x9000_0000, &tokens, Region::Quadspi).unwrap(),
            Some(0x2000)
        );
    }

    #[test]
    fn absent_region_is_none() {
        let tokens = hex_tokens(READELF_OUTPUT);

        assert_eq!(
            find_memory_usage(0x600B_B804, &tokens, Region::Sdram).unwrap(),
            None
        );
    }

    #[test]
    fn ram_accumulates_every_match() {
        let tokens = [
            "0x20000000",
            "0x0",
            "0x0",
            "0x100",
            "0x20001000",
            "0x0",
            "0x0",
            "0x200",
        ];

        assert_eq!(
            find_memory_usage(0x2000_0000, &tokens, Region::Ram).unwrap(),
            Some(0x300)
        );
    }

    #[test_case(Region::Flash)]
    #[test_case(Region::Quadspi)]
    #[test_case(Region::Sdram)]
    fn other_regions_only_count_the_first_match(region: Region) {
        let tokens = [
            "0x20000000",
            "0x0",
            "0x0",
            "0x100",
            "0x20001000",
            "0x0",
            "0x0",
            "0x200",
        ];

        assert_eq!(
            find_memory_usage(0x2000_0000, &tokens, region).unwrap(),
            Some(0x100)
        );
    }

    #[test]
    fn prefix_match_ignores_case() {
        let tokens = ["0X20000000", "0x0", "0x0", "0x40", "0x1"];

        assert_eq!(
            find_memory_usage(0x2000_0000, &tokens, Region::Ram).unwrap(),
            Some(0x40)
        );
    }

    #[test]
    fn last_token_is_never_an_address() {
        assert_eq!(
            find_memory_usage(0x2000_0000, &["0x1", "0x20000000"], Region::Ram).unwrap(),
            None
        );
        assert_eq!(find_memory_usage(0x2000_0000, &[], Region::Ram).unwrap(), None);
    }

    #[test]
    fn match_without_size_is_skipped() {
        assert_eq!(
            find_memory_usage(0x0800_0000, &["0x08000000", "0x1", "0x2"], Region::Flash)
                .unwrap(),
            None
        );
    }

    #[test_case(4096, 327_680, "1.25%")]
    #[test_case(107_188, 786_432, "13.63%")]
    #[test_case(8192, 16_777_216, "0.05%")]
    #[test_case(0, 10, "0.00%")]
    #[test_case(10, 10, "100.00%")]
    #[test_case(15, 10, "150.00%")]
    #[test_case(0x18800, 0x50000, "30.63%")]
    fn percentage_is_rounded_to_two_decimals(used: u64, max: u64, expected: &str) {
        assert_eq!(percentage(used, max).unwrap(), expected);
    }

    #[test]
    fn oversized_literal_is_rejected() {
        let tokens = ["0x08040000", "0x0", "0x0", "0x1ffffffffffffffff"];

        assert_eq!(
            find_memory_usage(0x0804_0000, &tokens, Region::Flash),
            Err(SizeError::InvalidHex("0x1ffffffffffffffff".to_string()))
        );
    }

    #[test]
    fn ram_sum_overflow_is_an_error() {
        let tokens = [
            "0x20000000",
            "0x0",
            "0x0",
            "0xffffffffffffffff",
            "0x20001000",
            "0x0",
            "0x0",
            "0x1",
        ];

        assert_eq!(
            find_memory_usage(0x2000_0000, &tokens, Region::Ram),
            Err(SizeError::Overflow("RAM"))
        );
    }

    #[test]
    fn percentage_of_empty_region_is_an_error() {
        assert_eq!(percentage(1, 0), Err(SizeError::EmptyRegion));
    }

    #[test]
    fn report_drops_absent_external_regions() {
        let tokens = hex_tokens(READELF_OUTPUT);

        let report = usage_report(&Project::Loader.layout(), &tokens).unwrap();

        let regions: Vec<_> = report.iter().map(|usage| usage.region).collect();
        assert_eq!(regions, vec![Region::Ram, Region::Flash, Region::Quadspi]);
        assert_eq!(report[0].used, 0x1000);
        assert_eq!(report[0].free(), 0x50000 - 0x1000);
        assert_eq!(report[1].usage().unwrap(), "13.63%");
    }

    #[test]
    fn report_keeps_ram_and_flash_when_absent() {
        let report = usage_report(&Project::Bootloader.layout(), &[]).unwrap();

        assert_eq!(
            report,
            vec![
                RegionUsage {
                    region: Region::Ram,
                    range: AddressRange::new(0x2000_0000, 0x2005_0000),
                    used: 0,
                },
                RegionUsage {
                    region: Region::Flash,
                    range: AddressRange::new(0x0800_0000, 0x0804_0000),
                    used: 0,
                },
            ]
        );
    }

    #[test]
    fn overflowing_region_has_negative_free_space() {
        let usage = RegionUsage {
            region: Region::Flash,
            range: AddressRange::new(0x0800_0000, 0x0800_0100),
            used: 0x180,
        };

        assert_eq!(usage.free(), -0x80);
        assert_eq!(usage.usage().unwrap(), "150.00%");
    }

    #[test]
    fn size_prints_the_region_table() {
        let root = tempfile::tempdir().unwrap();
        let elf = root.path().join(Project::Loader.elf_path());
        std::fs::create_dir_all(elf.parent().unwrap()).unwrap();
        std::fs::write(&elf, b"\x7fELF").unwrap();

        let mut runner = RecordingRunner::with_output(READELF_OUTPUT);
        let mut output = Vec::new();
        let mut ctx = context(root.path(), &mut runner, &mut output);

        run_size(&mut ctx, Project::Loader).unwrap();
        drop(ctx);

        assert_eq!(
            runner.commands(),
            vec!["arm-none-eabi-readelf -l build/loader/loader.elf"]
        );
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("│ RAM     │ 0x20000000"));
        assert!(output.contains("13.63%"));
        assert!(output.contains("QUADSPI"));
        assert!(!output.contains("SDRAM"));
    }

    #[test]
    fn dry_run_prints_no_report() {
        let root = tempfile::tempdir().unwrap();
        let elf = root.path().join(Project::Tipper.elf_path());
        std::fs::create_dir_all(elf.parent().unwrap()).unwrap();
        std::fs::write(&elf, b"\x7fELF").unwrap();

        let mut runner = DryRunner;
        let mut output = Vec::new();
        let mut ctx = context(root.path(), &mut runner, &mut output);

        run_size(&mut ctx, Project::Tipper).unwrap();
        drop(ctx);

        assert_eq!(String::from_utf8(output).unwrap(), "");
    }

    #[test]
    fn missing_elf_skips_the_project() {
        let root = tempfile::tempdir().unwrap();
        let mut runner = RecordingRunner::default();
        let mut output = Vec::new();
        let mut ctx = context(root.path(), &mut runner, &mut output);

        Cmd::run(
            Cmd {
                project: ProjectOptions {
                    project: Some(crate::project::ProjectSelection::All),
                },
            },
            &mut ctx,
        )
        .unwrap();
        drop(ctx);

        assert!(runner.invocations.is_empty());
        let output = String::from_utf8(output).unwrap();
        for project in Project::ALL {
            assert!(output.contains(&format!("ELF file not found : {project}")));
        }
    }
}
