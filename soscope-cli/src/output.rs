use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use soscope_core::{ArtifactReport, CodeMap, ElfIdentification, ExtractedString, Instruction};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct RegionRow {
    #[tabled(rename = "Region")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Offset")]
    offset: String,
    #[tabled(rename = "Size")]
    size: String,
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn named(raw: impl std::fmt::Display, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{raw} ({name})"),
        None => raw.to_string(),
    }
}

fn identification_rows(id: &ElfIdentification) -> Vec<FieldRow> {
    let optional = |v: Option<u16>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
    vec![
        FieldRow {
            field: "Class",
            value: format!("{:?}", id.class),
        },
        FieldRow {
            field: "Data",
            value: format!("{:?}", id.endianness),
        },
        FieldRow {
            field: "Version",
            value: id.header_version.to_string(),
        },
        FieldRow {
            field: "OS/ABI",
            value: named(id.os_abi, id.os_abi_name()),
        },
        FieldRow {
            field: "ABI version",
            value: id.abi_version.to_string(),
        },
        FieldRow {
            field: "Type",
            value: match id.object_type_name() {
                Some(name) => named(optional(id.object_type), Some(name)),
                None => optional(id.object_type),
            },
        },
        FieldRow {
            field: "Machine",
            value: match id.architecture() {
                Some(arch) => named(optional(id.machine), Some(&arch.to_string())),
                None => optional(id.machine),
            },
        },
    ]
}

pub fn identification(id: &ElfIdentification) {
    println!("{}", Table::new(identification_rows(id)).with(Style::modern()));
}

pub fn strings(found: &[ExtractedString], offsets: bool) {
    for s in found {
        if offsets {
            println!("{:>8x} {}", s.offset, s.text);
        } else {
            println!("{}", s.text);
        }
    }
}

pub fn regions(map: &CodeMap) {
    if map.regions.is_empty() {
        println!("No executable regions found.");
        return;
    }
    if map.from_segments {
        println!("{}", "Stripped binary; showing executable segments".yellow());
    }
    let rows = map.regions.iter().map(|r| RegionRow {
        name: r.name.clone(),
        address: format!("{:#x}", r.address),
        offset: format!("{:#x}", r.file_offset),
        size: format!("{:#x}", r.size),
    });
    println!("{}", Table::new(rows).with(Style::modern()));
}

pub fn instructions(insns: impl Iterator<Item = Instruction>) {
    let mut total = 0usize;
    let mut unknown = 0usize;
    for insn in insns {
        total += 1;
        if insn.is_unknown() {
            unknown += 1;
            println!("{}", insn.to_string().red());
        } else {
            println!("{insn}");
        }
    }
    if unknown > 0 {
        println!(
            "{}",
            format!("{unknown} of {total} entries could not be decoded").dimmed()
        );
    }
}

pub fn report(report: &ArtifactReport) {
    println!("{} {}", "File:".bold(), report.path);
    println!("{} {} bytes", "Size:".bold(), report.size);
    println!("{} {}", "SHA-256:".bold(), report.sha256);
    println!("{} {}", "Strings:".bold(), report.string_count);

    match &report.elf {
        Some(id) => {
            println!("{}", "ELF identification".bold());
            println!("{}", Table::new(identification_rows(id)).with(Style::modern()));
        }
        None => println!("{}", "Not an ELF image".yellow()),
    }

    if let Some(arch) = report.architecture {
        println!("{} {}", "Architecture:".bold(), arch);
    }
    for region in &report.code_regions {
        println!(
            "  {:<20} 0x{:<16x} {:<10x}",
            region.name, region.address, region.size
        );
    }
}
