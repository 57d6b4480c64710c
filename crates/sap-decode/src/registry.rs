use std::collections::BTreeMap;

use sap_core::errors::{ErrorInfo, SapError};

use crate::decoder::Decoder;
use crate::decoders::{DurationMorseDecoder, PhaseDeltaDecoder, SpectralStabilityDecoder};

/// Lookup from `method_id` to decoder instance.
///
/// A pure identity mapping: it performs no applicability checks and no
/// parameter validation. Methods declared in a matrix but absent here are
/// expected; [`DecoderRegistry::lookup`] returns `None` for them.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: BTreeMap<String, Box<dyn Decoder>>,
}

impl DecoderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in decoder.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        let builtin: [Box<dyn Decoder>; 3] = [
            Box::new(DurationMorseDecoder),
            Box::new(SpectralStabilityDecoder),
            Box::new(PhaseDeltaDecoder),
        ];
        for decoder in builtin {
            let method_id = decoder.method_id().to_string();
            registry.decoders.insert(method_id, decoder);
        }
        registry
    }

    /// Registers a decoder under its own `method_id`.
    pub fn register(&mut self, decoder: Box<dyn Decoder>) -> Result<(), SapError> {
        let method_id = decoder.method_id().to_string();
        if self.decoders.contains_key(&method_id) {
            return Err(SapError::Config(
                ErrorInfo::new(
                    "sap_decode.duplicate_decoder",
                    "a decoder is already registered for this method",
                )
                .with_context("method_id", method_id),
            ));
        }
        self.decoders.insert(method_id, decoder);
        Ok(())
    }

    /// Returns the decoder for `method_id`, or `None` when none is implemented.
    pub fn lookup(&self, method_id: &str) -> Option<&dyn Decoder> {
        self.decoders.get(method_id).map(|decoder| decoder.as_ref())
    }

    /// Registered decoders as `method_id -> version`.
    pub fn list(&self) -> BTreeMap<String, String> {
        self.decoders
            .iter()
            .map(|(method_id, decoder)| (method_id.clone(), decoder.version().to_string()))
            .collect()
    }

    /// Number of registered decoders.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.list()).finish()
    }
}
