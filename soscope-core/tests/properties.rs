//! Property checks for the scanner, ELF parser, digest and decoder.

use proptest::prelude::*;

use soscope_core::{
    decode, digest, parse_identification, scan_printable_runs, Architecture, DecoderRegistry,
    InstructionSet,
};

fn elf_prefix() -> Vec<u8> {
    let mut buf = vec![0x7f, b'E', b'L', b'F', 2, 1, 1, 0, 0];
    buf.extend_from_slice(&[0u8; 11]);
    buf
}

/// Bytes skewed towards printable text, NULs and a few control bytes.
fn arb_mixed_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![
            6 => 0x20u8..=0x7e,
            2 => Just(0u8),
            1 => any::<u8>(),
        ],
        0..256,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any buffer with the magic and at least 20 bytes parses.
    #[test]
    fn elf_with_magic_parses(tail in prop::collection::vec(any::<u8>(), 16..128)) {
        let mut buf = b"\x7fELF".to_vec();
        buf.extend_from_slice(&tail);
        prop_assert!(parse_identification(&buf).is_ok());
    }

    /// Short buffers never parse, even with the magic.
    #[test]
    fn short_buffers_fail(len in 0usize..20) {
        let buf = elf_prefix();
        prop_assert!(parse_identification(&buf[..len]).is_err());
    }

    /// Corrupting any one magic byte flips the result to failure.
    #[test]
    fn magic_corruption_fails(index in 0usize..4, delta in 1u8..=255) {
        let mut buf = elf_prefix();
        buf[index] = buf[index].wrapping_add(delta);
        prop_assert!(parse_identification(&buf).is_err());
    }

    /// Every extracted string is long enough, printable and NUL-terminated.
    #[test]
    fn scanned_strings_are_terminated(buf in arb_mixed_bytes(), min in 0usize..8) {
        for s in scan_printable_runs(&buf, min) {
            prop_assert!(s.len() >= min.max(1));
            prop_assert!(s.text.bytes().all(|b| (0x20..=0x7e).contains(&b)));
            prop_assert_eq!(&buf[s.offset..s.offset + s.len()], s.text.as_bytes());
            prop_assert_eq!(buf.get(s.offset + s.len()), Some(&0u8));
        }
    }

    /// Results are ordered and never overlap.
    #[test]
    fn scanned_strings_are_ordered(buf in arb_mixed_bytes()) {
        let found = scan_printable_runs(&buf, 1);
        for pair in found.windows(2) {
            prop_assert!(pair[0].offset + pair[0].len() < pair[1].offset);
        }
    }

    /// Digests are deterministic, 64 lowercase hex chars, and tell inputs apart.
    #[test]
    fn digest_shape(a in prop::collection::vec(any::<u8>(), 0..512),
                    b in prop::collection::vec(any::<u8>(), 0..512)) {
        let hex = digest(&a).to_hex();
        prop_assert_eq!(hex.len(), 64);
        prop_assert!(hex.bytes().all(|c| c.is_ascii_digit() || (b'a'..=b'f').contains(&c)));
        prop_assert_eq!(digest(&a), digest(&a));
        if a != b {
            prop_assert_ne!(digest(&a), digest(&b));
        }
    }

    /// The raw bytes of a sweep rebuild the buffer up to the last whole unit.
    #[test]
    fn sweep_covers_prefix(code in prop::collection::vec(any::<u8>(), 0..96),
                           base in any::<u64>(),
                           arch_index in 0usize..Architecture::ALL.len()) {
        let architecture = Architecture::ALL[arch_index];
        let registry = DecoderRegistry::default();
        let width = registry.get(architecture).unwrap().min_width();

        let mut rebuilt = Vec::new();
        let mut expected_address = base;
        for insn in registry.decode(&code, base, architecture).unwrap() {
            prop_assert_eq!(insn.address, expected_address);
            prop_assert!(insn.size() > 0);
            expected_address = expected_address.wrapping_add(insn.size() as u64);
            rebuilt.extend_from_slice(&insn.raw_bytes);
        }
        let covered = code.len() - code.len() % width;
        prop_assert_eq!(&rebuilt[..], &code[..covered]);
    }
}

#[test]
fn empty_digest_matches_published_vector() {
    assert_eq!(
        digest(&[]).to_string(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn zero_filled_arm64_terminates() {
    let code = vec![0u8; 64 * 1024 + 3];
    let insns: Vec<_> = decode(&code, 0, Architecture::Arm64).unwrap().collect();
    assert_eq!(insns.len(), 16 * 1024);
    assert!(insns.iter().all(|i| i.size() == 4));
}

#[test]
fn scenario_strings() {
    assert!(scan_printable_runs(&[72, 105, 0, 33], 3).is_empty());
    let found = scan_printable_runs(&[72, 105, 33, 0], 2);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].text, "Hi!");
}
