use crate::disasm::Architecture;
use crate::error::{InspectError, Result};
use byteorder::{ReadBytesExt, BE, LE};
use serde::Serialize;
use std::io::Cursor;

/// `0x7F 'E' 'L' 'F'`, the first four bytes of `e_ident`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// `e_ident` (16 bytes) plus `e_type` and `e_machine`. The layout is the same
/// for ELF32 and ELF64.
pub const IDENT_LEN: usize = 20;

/// `e_ident[EI_CLASS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileClass {
    Elf32,
    Elf64,
    Invalid(u8),
}

impl From<u8> for FileClass {
    fn from(raw: u8) -> Self {
        match raw {
            1 => FileClass::Elf32,
            2 => FileClass::Elf64,
            other => FileClass::Invalid(other),
        }
    }
}

/// `e_ident[EI_DATA]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Endianness {
    Little,
    Big,
    Invalid(u8),
}

impl From<u8> for Endianness {
    fn from(raw: u8) -> Self {
        match raw {
            1 => Endianness::Little,
            2 => Endianness::Big,
            other => Endianness::Invalid(other),
        }
    }
}

/// Identification fields from the start of an ELF file.
///
/// Only the first [`IDENT_LEN`] bytes are read. Program headers, section
/// headers and symbols are not interpreted here.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElfIdentification {
    /// 32-bit or 64-bit object (`EI_CLASS`).
    pub class: FileClass,

    /// Byte order of the remaining header fields (`EI_DATA`).
    pub endianness: Endianness,

    /// `EI_VERSION`, normally `EV_CURRENT` = 1.
    pub header_version: u8,

    /// Target OS ABI (`EI_OSABI`).
    ///
    /// Common values:
    /// - `ELFOSABI_SYSV` (0)
    /// - `ELFOSABI_LINUX` (3)
    pub os_abi: u8,

    /// `EI_ABIVERSION`.
    pub abi_version: u8,

    /// `e_type`, or `None` when the byte order is unknown.
    ///
    /// Common values:
    /// - `ET_EXEC` (2): Executable file
    /// - `ET_DYN` (3): Shared object
    pub object_type: Option<u16>,

    /// `e_machine`, or `None` when the byte order is unknown.
    ///
    /// Common values:
    /// - `EM_X86_64` (62)
    /// - `EM_AARCH64` (183)
    pub machine: Option<u16>,
}

/// Parses the identification region of an ELF file.
///
/// Fails with [`InspectError::InvalidInput`] when fewer than [`IDENT_LEN`]
/// bytes are available and with [`InspectError::MalformedHeader`] when the
/// magic does not match. A failed parse returns nothing partial.
pub fn parse_identification(buffer: &[u8]) -> Result<ElfIdentification> {
    if buffer.len() < IDENT_LEN {
        return Err(InspectError::InvalidInput {
            needed: IDENT_LEN,
            actual: buffer.len(),
        });
    }
    if buffer[..4] != ELF_MAGIC {
        return Err(InspectError::MalformedHeader(format!(
            "bad ELF magic {:02x?}",
            &buffer[..4]
        )));
    }

    let endianness = Endianness::from(buffer[5]);
    let mut cur = Cursor::new(&buffer[16..IDENT_LEN]);
    let (object_type, machine) = match endianness {
        Endianness::Little => (Some(cur.read_u16::<LE>()?), Some(cur.read_u16::<LE>()?)),
        Endianness::Big => (Some(cur.read_u16::<BE>()?), Some(cur.read_u16::<BE>()?)),
        Endianness::Invalid(raw) => {
            log::debug!("EI_DATA {raw} is not a known byte order; skipping e_type/e_machine");
            (None, None)
        }
    };

    Ok(ElfIdentification {
        class: FileClass::from(buffer[4]),
        endianness,
        header_version: buffer[6],
        os_abi: buffer[7],
        abi_version: buffer[8],
        object_type,
        machine,
    })
}

impl ElfIdentification {
    pub fn os_abi_name(&self) -> Option<&'static str> {
        let name = match self.os_abi {
            0 => "UNIX - System V",
            1 => "HP-UX",
            2 => "NetBSD",
            3 => "Linux",
            4 => "GNU Hurd",
            6 => "Solaris",
            7 => "AIX",
            8 => "IRIX",
            9 => "FreeBSD",
            10 => "Tru64",
            11 => "Novell Modesto",
            12 => "OpenBSD",
            97 => "ARM",
            255 => "Standalone",
            _ => return None,
        };
        Some(name)
    }

    pub fn object_type_name(&self) -> Option<&'static str> {
        let name = match self.object_type? {
            0 => "NONE",
            1 => "REL",
            2 => "EXEC",
            3 => "DYN",
            4 => "CORE",
            _ => return None,
        };
        Some(name)
    }

    /// The decoder matching `e_machine`, if there is one.
    pub fn architecture(&self) -> Option<Architecture> {
        self.machine.and_then(Architecture::from_elf_machine)
    }
}
