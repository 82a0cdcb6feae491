use super::{Architecture, CapstoneSet, InstructionSet, Instructions};
use crate::error::{InspectError, Result};
use std::collections::HashMap;

/// Maps architecture tags to the instruction sets that decode them.
///
/// The sweep in [`Instructions`] only talks to the [`InstructionSet`] trait,
/// so registering a new set is all it takes to support another encoding.
pub struct DecoderRegistry {
    sets: HashMap<Architecture, Box<dyn InstructionSet>>,
}

impl DecoderRegistry {
    pub fn empty() -> Self {
        Self {
            sets: HashMap::new(),
        }
    }

    /// Registry with a Capstone-backed set for every [`Architecture`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for architecture in Architecture::ALL {
            registry.register(Box::new(CapstoneSet::new(architecture)));
        }
        registry
    }

    /// Adds `set`, returning the one it replaces.
    pub fn register(&mut self, set: Box<dyn InstructionSet>) -> Option<Box<dyn InstructionSet>> {
        self.sets.insert(set.architecture(), set)
    }

    pub fn get(&self, architecture: Architecture) -> Option<&dyn InstructionSet> {
        self.sets.get(&architecture).map(|set| set.as_ref())
    }

    pub fn supports(&self, architecture: Architecture) -> bool {
        self.sets.contains_key(&architecture)
    }

    pub fn architectures(&self) -> Vec<Architecture> {
        let mut archs: Vec<_> = self.sets.keys().copied().collect();
        archs.sort();
        archs
    }

    pub fn decode<'a>(
        &self,
        code: &'a [u8],
        base_address: u64,
        architecture: Architecture,
    ) -> Result<Instructions<'a>> {
        let set = self
            .get(architecture)
            .ok_or_else(|| InspectError::UnsupportedArchitecture(architecture.to_string()))?;
        let engine = set.engine()?;
        log::debug!(
            "decoding {} bytes as {} from {:#x}",
            code.len(),
            architecture,
            base_address
        );
        Ok(Instructions::new(
            engine,
            code,
            base_address,
            set.min_width(),
            architecture,
        ))
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
