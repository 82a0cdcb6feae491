use crate::error::InspectError;
use serde::Serialize;
use std::fmt;

/// Instruction encodings the decoder can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    Arm64, // AArch64, fixed 4-byte
    Arm,   // A32, fixed 4-byte
    Thumb, // T32, 2 or 4 bytes
    X86,
    X86_64,
}

impl Architecture {
    pub const ALL: [Architecture; 5] = [
        Architecture::Arm64,
        Architecture::Arm,
        Architecture::Thumb,
        Architecture::X86,
        Architecture::X86_64,
    ];

    /// Maps an ELF `e_machine` value to the matching encoding.
    pub fn from_elf_machine(machine: u16) -> Option<Self> {
        match machine {
            3 => Some(Architecture::X86),       // EM_386
            40 => Some(Architecture::Arm),      // EM_ARM
            62 => Some(Architecture::X86_64),   // EM_X86_64
            183 => Some(Architecture::Arm64),   // EM_AARCH64
            _ => None,
        }
    }
}

impl std::str::FromStr for Architecture {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            "arm" | "arm32" | "a32" => Ok(Architecture::Arm),
            "thumb" | "t32" => Ok(Architecture::Thumb),
            "x86" | "i386" | "i686" => Ok(Architecture::X86),
            "x86_64" | "x86-64" | "amd64" | "x64" => Ok(Architecture::X86_64),
            _ => Err(InspectError::UnsupportedArchitecture(s.to_string())),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Architecture::Arm64 => "arm64",
            Architecture::Arm => "arm",
            Architecture::Thumb => "thumb",
            Architecture::X86 => "x86",
            Architecture::X86_64 => "x86_64",
        };
        write!(f, "{}", name)
    }
}
