
mod morse;
mod phase;
mod spectral;

pub use morse::DurationMorseDecoder;
pub use phase::PhaseDeltaDecoder;
pub use spectral::SpectralStabilityDecoder;
