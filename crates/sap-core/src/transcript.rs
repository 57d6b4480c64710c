//! Transcript input: one [`Channel`] per declared channel name.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::errors::{ErrorInfo, SapError};
use crate::hash::stable_hash_string;

/// Per-channel extracted representations for a captured signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Transcript {
    /// Where the transcript came from; carried into run provenance.
    #[serde(default)]
    pub source: String,
    /// Channels keyed by name.
    #[serde(default)]
    pub channels: BTreeMap<String, Channel>,
}

impl Transcript {
    /// Builds a transcript from channels, keying each by its own name.
    pub fn from_channels(source: impl Into<String>, channels: Vec<Channel>) -> Self {
        Self {
            source: source.into(),
            channels: channels
                .into_iter()
                .map(|channel| (channel.name.clone(), channel))
                .collect(),
        }
    }

    /// Looks up a channel by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Stable fingerprint of the transcript contents.
    pub fn content_hash(&self) -> Result<String, SapError> {
        stable_hash_string(&self.channels)
    }

    fn normalise_names(&mut self) {
        for (name, channel) in self.channels.iter_mut() {
            channel.name = name.clone();
        }
    }
}

/// Parses a transcript from JSON bytes. `source` is used when the document carries none.
pub fn parse_transcript(bytes: &[u8], source: &str) -> Result<Transcript, SapError> {
    let mut transcript: Transcript = serde_json::from_slice(bytes).map_err(|err| {
        SapError::Transcript(
            ErrorInfo::new("sap_core.transcript_parse", err.to_string())
                .with_context("source", source.to_string()),
        )
    })?;
    if transcript.source.is_empty() {
        transcript.source = source.to_string();
    }
    transcript.normalise_names();
    Ok(transcript)
}

/// Loads a transcript JSON document from disk.
pub fn load_transcript<P: AsRef<Path>>(path: P) -> Result<Transcript, SapError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| {
        SapError::Transcript(
            ErrorInfo::new("sap_core.transcript_read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    let transcript = parse_transcript(&bytes, &path.display().to_string())?;
    tracing::debug!(
        path = %path.display(),
        channels = transcript.channels.len(),
        "loaded transcript"
    );
    Ok(transcript)
}
