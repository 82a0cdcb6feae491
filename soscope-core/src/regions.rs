use crate::disasm::Architecture;
use crate::error::{InspectError, Result};
use goblin::elf::program_header::{PF_X, PT_LOAD};
use goblin::elf::section_header::{SHF_EXECINSTR, SHT_NOBITS};
use goblin::elf::{Elf, ProgramHeader, SectionHeader};
use serde::Serialize;

/// A span of the file that holds machine code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeRegion {
    pub name: String,
    /// Virtual address of the first byte.
    pub address: u64,
    pub file_offset: u64,
    pub size: u64,
}

impl CodeRegion {
    /// The region's bytes within `buffer`, or `None` if the region does not
    /// fit in it.
    pub fn bytes<'a>(&self, buffer: &'a [u8]) -> Option<&'a [u8]> {
        let start = usize::try_from(self.file_offset).ok()?;
        let size = usize::try_from(self.size).ok()?;
        buffer.get(start..start.checked_add(size)?)
    }

    fn from_goblin_sh(sh: &SectionHeader, elf: &Elf) -> Self {
        CodeRegion {
            name: elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("").to_string(),
            address: sh.sh_addr,
            file_offset: sh.sh_offset,
            size: sh.sh_size,
        }
    }

    fn from_goblin_ph(index: usize, ph: &ProgramHeader) -> Self {
        CodeRegion {
            name: format!(".segment_{}", index),
            address: ph.p_vaddr,
            file_offset: ph.p_offset,
            size: ph.p_filesz,
        }
    }
}

/// Executable regions of an ELF image plus the architecture it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeMap {
    pub architecture: Option<Architecture>,
    pub regions: Vec<CodeRegion>,
    /// True when section headers were missing and segments were used instead.
    pub from_segments: bool,
}

impl CodeMap {
    pub fn find(&self, name: &str) -> Option<&CodeRegion> {
        self.regions.iter().find(|r| r.name == name)
    }
}

/// Lists the executable sections of an ELF image.
///
/// Stripped images without section headers fall back to executable `PT_LOAD`
/// segments. Regions that run past the end of `buffer` are skipped.
pub fn code_regions(buffer: &[u8]) -> Result<CodeMap> {
    let elf = Elf::parse(buffer).map_err(|e| InspectError::MalformedHeader(e.to_string()))?;
    let architecture = Architecture::from_elf_machine(elf.header.e_machine);

    let mut regions: Vec<CodeRegion> = elf
        .section_headers
        .iter()
        .filter(|sh| sh.sh_flags & SHF_EXECINSTR as u64 != 0 && sh.sh_type != SHT_NOBITS)
        .filter(|sh| sh.sh_size > 0)
        .map(|sh| CodeRegion::from_goblin_sh(sh, &elf))
        .collect();

    let from_segments = regions.is_empty();
    if from_segments {
        log::warn!("No executable sections; using program headers");
        regions = elf
            .program_headers
            .iter()
            .enumerate()
            .filter(|(_, ph)| ph.p_type == PT_LOAD && ph.p_flags & PF_X != 0 && ph.p_filesz > 0)
            .map(|(i, ph)| CodeRegion::from_goblin_ph(i, ph))
            .collect();
    }

    regions.retain(|region| {
        let fits = region.bytes(buffer).is_some();
        if !fits {
            log::warn!(
                "{} at {:#x}+{:#x} runs past end of file; skipped",
                region.name,
                region.file_offset,
                region.size
            );
        }
        fits
    });

    log::info!("Found {} code regions", regions.len());
    Ok(CodeMap {
        architecture,
        regions,
        from_segments,
    })
}
