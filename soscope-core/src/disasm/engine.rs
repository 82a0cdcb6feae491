use super::{Architecture, Decoded, Engine, InstructionSet};
use crate::error::{InspectError, Result};
use capstone::arch::{self, BuildsCapstone, BuildsCapstoneSyntax};
use capstone::{Capstone, CsResult};

/// Instruction set backed by a Capstone handle.
#[derive(Debug, Clone, Copy)]
pub struct CapstoneSet {
    architecture: Architecture,
}

impl CapstoneSet {
    pub fn new(architecture: Architecture) -> Self {
        Self { architecture }
    }
}

impl InstructionSet for CapstoneSet {
    fn architecture(&self) -> Architecture {
        self.architecture
    }

    fn min_width(&self) -> usize {
        match self.architecture {
            Architecture::Arm64 | Architecture::Arm => 4,
            Architecture::Thumb => 2,
            Architecture::X86 | Architecture::X86_64 => 1,
        }
    }

    fn engine(&self) -> Result<Box<dyn Engine>> {
        let cs = build(self.architecture)
            .map_err(|e| InspectError::Engine(format!("{}: {e}", self.architecture)))?;
        Ok(Box::new(CapstoneEngine { cs }))
    }
}

fn build(architecture: Architecture) -> CsResult<Capstone> {
    match architecture {
        Architecture::Arm64 => Capstone::new()
            .arm64()
            .mode(arch::arm64::ArchMode::Arm)
            .build(),
        Architecture::Arm => Capstone::new()
            .arm()
            .mode(arch::arm::ArchMode::Arm)
            .build(),
        Architecture::Thumb => Capstone::new()
            .arm()
            .mode(arch::arm::ArchMode::Thumb)
            .build(),
        Architecture::X86 => Capstone::new()
            .x86()
            .mode(arch::x86::ArchMode::Mode32)
            .syntax(arch::x86::ArchSyntax::Intel)
            .build(),
        Architecture::X86_64 => Capstone::new()
            .x86()
            .mode(arch::x86::ArchMode::Mode64)
            .syntax(arch::x86::ArchSyntax::Intel)
            .build(),
    }
}

struct CapstoneEngine {
    cs: Capstone,
}

impl Engine for CapstoneEngine {
    fn decode_one(&mut self, code: &[u8], address: u64) -> Option<Decoded> {
        // Capstone reports an undecodable first instruction either as an
        // empty result or as an error, depending on the handle's errno.
        let insns = self.cs.disasm_count(code, address, 1).ok()?;
        let insn = insns.iter().next()?;
        Some(Decoded {
            mnemonic: insn.mnemonic().unwrap_or_default().to_string(),
            operands: insn.op_str().unwrap_or_default().to_string(),
            len: insn.len(),
        })
    }
}
