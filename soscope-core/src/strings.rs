use serde::Serialize;

/// How the scanner treats a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    /// Printable ASCII, `0x20..=0x7e`.
    Printable,
    /// The NUL byte that ends a C string.
    Terminator,
    /// Anything else. Breaks the current run.
    Other,
}

impl ByteClass {
    pub fn of(byte: u8) -> Self {
        match byte {
            0 => ByteClass::Terminator,
            0x20..=0x7e => ByteClass::Printable,
            _ => ByteClass::Other,
        }
    }
}

/// A NUL-terminated run of printable ASCII found in a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedString {
    /// Offset of the first character in the scanned buffer.
    pub offset: usize,
    pub text: String,
}

impl ExtractedString {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Extracts every NUL-terminated printable run of at least `min_length` bytes.
///
/// Runs broken by a non-printable, non-NUL byte are dropped whatever their
/// length, and so is a run still open when the buffer ends. Only strings laid
/// out the way a compiler emits literals are reported. Results are in order of
/// their start offset.
pub fn scan_printable_runs(buffer: &[u8], min_length: usize) -> Vec<ExtractedString> {
    let min_length = min_length.max(1);
    let mut strings = Vec::new();
    let mut start = 0usize;
    let mut current = String::new();

    for (i, &byte) in buffer.iter().enumerate() {
        match ByteClass::of(byte) {
            ByteClass::Printable => {
                if current.is_empty() {
                    start = i;
                }
                current.push(byte as char);
            }
            ByteClass::Terminator if current.len() >= min_length => {
                strings.push(ExtractedString {
                    offset: start,
                    text: std::mem::take(&mut current),
                });
            }
            ByteClass::Terminator | ByteClass::Other => current.clear(),
        }
    }

    if !current.is_empty() {
        log::debug!(
            "dropping unterminated run of {} bytes at offset {:#x}",
            current.len(),
            start
        );
    }
    strings
}
