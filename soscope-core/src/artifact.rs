use crate::digest::Digest;
use crate::disasm::Architecture;
use crate::error::Result;
use crate::header::elf::{parse_identification, ElfIdentification};
use crate::regions::{code_regions, CodeRegion};
use crate::strings::scan_printable_runs;
use serde::Serialize;
use std::io::Read;

/// A binary loaded into memory for inspection.
pub struct Artifact {
    pub path: String,
    data: Vec<u8>,
}

/// Everything the inspector can say about an artifact in one pass.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactReport {
    pub path: String,
    pub size: usize,
    pub sha256: Digest,
    pub elf: Option<ElfIdentification>,
    pub architecture: Option<Architecture>,
    pub string_count: usize,
    pub code_regions: Vec<CodeRegion>,
}

impl Artifact {
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let mut file = std::fs::File::open(&path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        log::info!("Loaded {} bytes from {}", data.len(), path.as_ref().display());

        Ok(Self {
            path: path.as_ref().display().to_string(),
            data,
        })
    }

    pub fn from_bytes(path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn digest(&self) -> Digest {
        Digest::of(&self.data)
    }

    pub fn identification(&self) -> Result<ElfIdentification> {
        parse_identification(&self.data)
    }

    pub fn report(&self, min_string_len: usize) -> ArtifactReport {
        let elf = match self.identification() {
            Ok(id) => Some(id),
            Err(e) => {
                log::info!("{} is not an ELF image: {e}", self.path);
                None
            }
        };

        let (architecture, regions) = if elf.is_some() {
            match code_regions(&self.data) {
                Ok(map) => (map.architecture, map.regions),
                Err(e) => {
                    log::warn!("Could not map code regions: {e}");
                    (elf.and_then(|id| id.architecture()), Vec::new())
                }
            }
        } else {
            (None, Vec::new())
        };

        ArtifactReport {
            path: self.path.clone(),
            size: self.data.len(),
            sha256: self.digest(),
            elf,
            architecture,
            string_count: scan_printable_runs(&self.data, min_string_len).len(),
            code_regions: regions,
        }
    }
}
