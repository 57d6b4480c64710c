use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sap_core::errors::{ErrorInfo, SapError};
use sap_core::hash::stable_hash_string;
use sap_core::serde::{from_yaml_slice, to_yaml_string};
use sap_decode::DecoderParams;
use sap_matrix::ApplicabilityParams;
use serde::{Deserialize, Serialize};

use crate::dispatch::{CancelToken, RunOpts};
use crate::orchestrate::PartialPolicy;

const DEFAULT_REPORT_TITLE: &str = "SAP² Analysis Report";

/// Worker pool and dispatch policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Number of worker threads.
    #[serde(default = "ExecutionConfig::default_concurrency")]
    pub concurrency: usize,
    /// Dispatch `partially_applicable` units with degraded inputs.
    #[serde(default)]
    pub invoke_partially_applicable: bool,
    /// Wall-clock budget for the decoding phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl ExecutionConfig {
    fn default_concurrency() -> usize {
        1
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            concurrency: Self::default_concurrency(),
            invoke_partially_applicable: false,
            timeout_ms: None,
        }
    }
}

/// A pipeline run description loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Transcript JSON document.
    pub transcript: PathBuf,
    /// Matrix YAML file or directory.
    pub matrix: PathBuf,
    /// Output directory for exported artefacts.
    #[serde(default = "RunConfig::default_out_dir")]
    pub out_dir: PathBuf,
    /// Title of the markdown report.
    #[serde(default = "RunConfig::default_report_title")]
    pub report_title: String,
    /// Global applicability thresholds.
    #[serde(default)]
    pub applicability: ApplicabilityParams,
    /// Decoder parameter overrides keyed by `method_id`.
    #[serde(default)]
    pub decoders: BTreeMap<String, DecoderParams>,
    /// Worker pool and dispatch policy.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Directory containing the configuration on disk.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl RunConfig {
    fn default_out_dir() -> PathBuf {
        PathBuf::from("out")
    }

    fn default_report_title() -> String {
        DEFAULT_REPORT_TITLE.to_string()
    }

    /// Minimal configuration with every default applied.
    pub fn new(transcript: impl Into<PathBuf>, matrix: impl Into<PathBuf>) -> Self {
        Self {
            transcript: transcript.into(),
            matrix: matrix.into(),
            out_dir: Self::default_out_dir(),
            report_title: Self::default_report_title(),
            applicability: ApplicabilityParams::default(),
            decoders: BTreeMap::new(),
            execution: ExecutionConfig::default(),
            base_dir: PathBuf::new(),
        }
    }

    /// Rejects zero thresholds and an empty worker pool.
    pub fn validate(&self) -> Result<(), SapError> {
        self.applicability.validate()?;
        if self.execution.concurrency == 0 {
            return Err(SapError::Config(
                ErrorInfo::new("sap_engine.invalid_concurrency", "concurrency must be >= 1")
                    .with_hint("set execution.concurrency to a positive worker count"),
            ));
        }
        if self.execution.timeout_ms == Some(0) {
            return Err(SapError::Config(ErrorInfo::new(
                "sap_engine.invalid_timeout",
                "timeout_ms must be positive when set",
            )));
        }
        Ok(())
    }

    /// Transcript path resolved against the configuration directory.
    pub fn transcript_path(&self) -> PathBuf {
        self.resolve(&self.transcript)
    }

    /// Matrix path resolved against the configuration directory.
    pub fn matrix_path(&self) -> PathBuf {
        self.resolve(&self.matrix)
    }

    /// Output directory resolved against the configuration directory.
    pub fn out_dir_path(&self) -> PathBuf {
        self.resolve(&self.out_dir)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Dispatch options derived from the execution block.
    pub fn run_opts(&self) -> RunOpts {
        RunOpts {
            concurrency: self.execution.concurrency,
            policy: PartialPolicy::from_flag(self.execution.invoke_partially_applicable),
            timeout: self.execution.timeout_ms.map(Duration::from_millis),
            cancel: CancelToken::new(),
        }
    }

    /// Canonical YAML form.
    pub fn to_yaml_string(&self) -> Result<String, SapError> {
        to_yaml_string(self)
    }

    /// Deterministic hash of the configuration contents.
    pub fn config_hash(&self) -> Result<String, SapError> {
        stable_hash_string(self)
    }
}

/// Loads and validates a run configuration.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, SapError> {
    let config_path = path.as_ref();
    let bytes = fs::read(config_path)
        .map_err(|err| SapError::io("sap_engine.config_read", config_path, err))?;
    let mut config: RunConfig = from_yaml_slice(&bytes).map_err(|err| {
        SapError::Config(
            ErrorInfo::new("sap_engine.config_malformed", err.info().message.clone())
                .with_context("path", config_path.display().to_string()),
        )
    })?;
    config.base_dir = config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    config.validate()?;
    tracing::debug!(path = %config_path.display(), "loaded run configuration");
    Ok(config)
}
