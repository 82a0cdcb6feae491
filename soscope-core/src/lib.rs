pub mod artifact;
pub mod digest;
pub mod disasm;
pub mod error;
pub mod header;
pub mod regions;
pub mod strings;

pub use artifact::*;
pub use digest::*;
pub use disasm::*;
pub use error::{InspectError, Result};
pub use header::elf::{parse_identification, ElfIdentification, Endianness, FileClass};
pub use regions::*;
pub use strings::*;
