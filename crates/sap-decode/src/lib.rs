#![deny(missing_docs)]
#![doc = "Decoder capability contract, registry and built-in decoders for SAP²."]

/// Decoder trait, channel views and hypotheses.
pub mod decoder;
/// Built-in decoders.
pub mod decoders;
/// Method to decoder lookup.
pub mod registry;

pub use decoder::{
    json_f64, param_f64, param_usize, ChannelView, Decoder, DecoderParams, Hypothesis,
    HypothesisLevel,
};
pub use decoders::{DurationMorseDecoder, PhaseDeltaDecoder, SpectralStabilityDecoder};
pub use registry::DecoderRegistry;
