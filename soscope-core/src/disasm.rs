pub mod arch;
pub mod engine;
pub mod registry;

pub use arch::*;
pub use engine::CapstoneSet;
pub use registry::DecoderRegistry;

use crate::error::Result;
use serde::Serialize;
use std::fmt;

/// Mnemonic of the placeholder emitted where nothing could be decoded.
pub const UNKNOWN_MNEMONIC: &str = "(bad)";

/// One decoded (or undecodable) instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub address: u64,
    pub mnemonic: String,
    pub operands: String,
    pub raw_bytes: Vec<u8>,
}

impl Instruction {
    /// Number of bytes consumed. Never zero.
    pub fn size(&self) -> usize {
        self.raw_bytes.len()
    }

    pub fn is_unknown(&self) -> bool {
        self.mnemonic == UNKNOWN_MNEMONIC
    }

    fn unknown(address: u64, raw: &[u8]) -> Self {
        let operands = raw
            .iter()
            .map(|b| format!("{b:#04x}"))
            .collect::<Vec<_>>()
            .join(", ");
        Instruction {
            address,
            mnemonic: UNKNOWN_MNEMONIC.to_string(),
            operands: format!(".byte {operands}"),
            raw_bytes: raw.to_vec(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self
            .raw_bytes
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{:#010x}:  {:<24} {}", self.address, bytes, self.mnemonic)?;
        if !self.operands.is_empty() {
            write!(f, " {}", self.operands)?;
        }
        Ok(())
    }
}

/// What an [`Engine`] reports for a single successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub mnemonic: String,
    pub operands: String,
    pub len: usize,
}

/// Decodes one instruction at a time.
pub trait Engine {
    /// Decodes the instruction at the start of `code`, which sits at `address`.
    ///
    /// Returns `None` when the bytes are not a valid instruction.
    fn decode_one(&mut self, code: &[u8], address: u64) -> Option<Decoded>;
}

/// An architecture the decoder can walk.
pub trait InstructionSet: Send + Sync {
    fn architecture(&self) -> Architecture;

    /// Smallest instruction size, in bytes. Also the step taken past
    /// undecodable bytes.
    fn min_width(&self) -> usize;

    /// Creates a fresh engine for one decoding pass.
    fn engine(&self) -> Result<Box<dyn Engine>>;
}

/// Lazy, linear sweep over a code buffer.
///
/// Every byte up to the last whole minimum-width unit ends up in exactly one
/// instruction. Bytes that fail to decode become [`UNKNOWN_MNEMONIC`] entries
/// one minimum width long, and a tail shorter than the minimum width is
/// dropped.
pub struct Instructions<'a> {
    engine: Box<dyn Engine>,
    code: &'a [u8],
    offset: usize,
    base_address: u64,
    min_width: usize,
    architecture: Architecture,
}

impl<'a> Instructions<'a> {
    pub(crate) fn new(
        engine: Box<dyn Engine>,
        code: &'a [u8],
        base_address: u64,
        min_width: usize,
        architecture: Architecture,
    ) -> Self {
        Self {
            engine,
            code,
            offset: 0,
            base_address,
            min_width: min_width.max(1),
            architecture,
        }
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn accepts(&self, decoded: &Decoded, remaining: usize) -> bool {
        decoded.len > 0 && decoded.len <= remaining && decoded.len % self.min_width == 0
    }
}

impl Iterator for Instructions<'_> {
    type Item = Instruction;

    fn next(&mut self) -> Option<Instruction> {
        let code = self.code;
        let rest = &code[self.offset..];
        if rest.len() < self.min_width {
            return None;
        }

        let address = self.base_address.wrapping_add(self.offset as u64);
        let insn = match self.engine.decode_one(rest, address) {
            Some(d) if self.accepts(&d, rest.len()) => Instruction {
                address,
                mnemonic: d.mnemonic,
                operands: d.operands,
                raw_bytes: rest[..d.len].to_vec(),
            },
            _ => {
                log::trace!("undecodable {} bytes at {:#x}", self.architecture, address);
                Instruction::unknown(address, &rest[..self.min_width])
            }
        };

        self.offset += insn.size();
        Some(insn)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.code.len() - self.offset;
        (0, Some(remaining / self.min_width))
    }
}

/// Decodes `code` as `architecture`, with the first byte at `base_address`,
/// using the built-in decoders.
///
/// Fails before reading any byte when no decoder is registered for the
/// architecture or its engine cannot start. Calling it again restarts the
/// sweep from the beginning.
pub fn decode(
    code: &[u8],
    base_address: u64,
    architecture: Architecture,
) -> Result<Instructions<'_>> {
    DecoderRegistry::default().decode(code, base_address, architecture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm64_sweep_is_contiguous() {
        let code = [
            0xfd, 0x7b, 0xbf, 0xa9, // stp x29, x30, [sp, #-0x10]!
            0x1f, 0x20, 0x03, 0xd5, // nop
            0xc0, 0x03, 0x5f, 0xd6, // ret
        ];
        let insns: Vec<_> = decode(&code, 0x4000, Architecture::Arm64).unwrap().collect();
        let mnemonics: Vec<_> = insns.iter().map(|i| i.mnemonic.as_str()).collect();
        assert_eq!(mnemonics, vec!["stp", "nop", "ret"]);
        assert_eq!(insns[0].address, 0x4000);
        assert_eq!(insns[1].address, 0x4004);
        assert_eq!(insns[2].address, 0x4008);
        assert!(insns.iter().all(|i| i.size() == 4));
    }

    #[test]
    fn trailing_partial_word_is_dropped() {
        let code = [0xc0, 0x03, 0x5f, 0xd6, 0x1f, 0x20];
        let insns: Vec<_> = decode(&code, 0, Architecture::Arm64).unwrap().collect();
        assert_eq!(insns.len(), 1);
        assert_eq!(insns[0].mnemonic, "ret");
    }

    #[test]
    fn truncated_thumb2_instruction_becomes_sentinel() {
        // bx lr, then the first half of a 32-bit bl
        let code = [0x70, 0x47, 0xf0, 0xf7];
        let insns: Vec<_> = decode(&code, 0x8000, Architecture::Thumb).unwrap().collect();
        assert_eq!(insns.len(), 2);
        assert_eq!(insns[0].mnemonic, "bx");
        assert_eq!(insns[0].operands, "lr");
        assert!(insns[1].is_unknown());
        assert_eq!(insns[1].address, 0x8002);
        assert_eq!(insns[1].raw_bytes, vec![0xf0, 0xf7]);
        assert_eq!(insns[1].operands, ".byte 0xf0, 0xf7");
    }

    #[test]
    fn bad_byte_does_not_abort_x86_64() {
        let code = [0x55, 0x06, 0xc3];
        let insns: Vec<_> = decode(&code, 0x1000, Architecture::X86_64).unwrap().collect();
        assert_eq!(insns.len(), 3);
        assert_eq!(insns[0].mnemonic, "push");
        assert!(insns[1].is_unknown());
        assert_eq!(insns[1].address, 0x1001);
        assert_eq!(insns[1].raw_bytes, vec![0x06]);
        assert_eq!(insns[1].operands, ".byte 0x06");
        assert_eq!(insns[2].mnemonic, "ret");
        assert_eq!(insns[2].address, 0x1002);
    }

    #[test]
    fn decoding_restarts_from_scratch() {
        let code = [0x55, 0xc3];
        let first: Vec<_> = decode(&code, 0, Architecture::X86_64).unwrap().collect();
        let second: Vec<_> = decode(&code, 0, Architecture::X86_64).unwrap().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        assert_eq!(decode(&[], 0, Architecture::Arm64).unwrap().count(), 0);
    }

    #[test]
    fn display_lists_bytes_and_operands() {
        let insn = Instruction {
            address: 0x10,
            mnemonic: "bx".to_string(),
            operands: "lr".to_string(),
            raw_bytes: vec![0x70, 0x47],
        };
        let text = insn.to_string();
        assert!(text.starts_with("0x00000010:  70 47"));
        assert!(text.ends_with("bx lr"));
    }
}
