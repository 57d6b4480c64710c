use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use sap_core::errors::{ErrorInfo, SapError};
use sap_core::serde::from_yaml_slice;
use sap_core::{stable_hash_string, InputKind};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::params::ThresholdOverrides;

/// File name of the index inside a matrix directory.
pub const MATRIX_INDEX_FILE: &str = "_index.yaml";

fn config_error(code: &str, message: impl Into<String>) -> SapError {
    SapError::Config(ErrorInfo::new(code, message))
}

/// Declared decoding method and its input requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodSpec {
    /// Identifier unique across the matrix; decoders register under the same key.
    pub method_id: String,
    /// Optional grouping label such as `time_domain` or `inter_channel`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// Free-form description carried through for reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Input kinds that must be present and stable.
    pub required_inputs: Vec<InputKind>,
    /// Input kinds consumed when available; they never affect status.
    #[serde(default)]
    pub optional_inputs: Vec<InputKind>,
    /// Thresholds overriding the global defaults for this method.
    #[serde(default, skip_serializing_if = "ThresholdOverrides::is_empty")]
    pub thresholds: ThresholdOverrides,
}

impl MethodSpec {
    /// Creates a method requiring the given kinds with no optional inputs or overrides.
    pub fn new(method_id: impl Into<String>, required_inputs: Vec<InputKind>) -> Self {
        Self {
            method_id: method_id.into(),
            family: None,
            description: None,
            required_inputs,
            optional_inputs: Vec::new(),
            thresholds: ThresholdOverrides::default(),
        }
    }

    /// Adds optional input kinds.
    pub fn with_optional(mut self, optional_inputs: Vec<InputKind>) -> Self {
        self.optional_inputs = optional_inputs;
        self
    }

    /// Sets per-method thresholds.
    pub fn with_thresholds(mut self, thresholds: ThresholdOverrides) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Required followed by optional kinds, deduplicated.
    pub fn declared_kinds(&self) -> Vec<InputKind> {
        let mut kinds = self.required_inputs.clone();
        for kind in &self.optional_inputs {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        kinds
    }

    /// Checks structural well-formedness of the declaration.
    pub fn validate(&self) -> Result<(), SapError> {
        if self.method_id.trim().is_empty() {
            return Err(config_error(
                "sap_matrix.empty_method_id",
                "method_id must not be empty",
            ));
        }
        if self.required_inputs.is_empty() {
            return Err(SapError::Config(
                ErrorInfo::new(
                    "sap_matrix.no_required_inputs",
                    "method declares no required inputs",
                )
                .with_context("method_id", self.method_id.clone()),
            ));
        }
        let mut seen = Vec::new();
        for kind in self.required_inputs.iter().chain(&self.optional_inputs) {
            if seen.contains(kind) {
                return Err(SapError::Config(
                    ErrorInfo::new(
                        "sap_matrix.repeated_input",
                        format!("input `{kind}` is declared more than once"),
                    )
                    .with_context("method_id", self.method_id.clone())
                    .with_hint("list each kind once, as either required or optional"),
                ));
            }
            seen.push(*kind);
        }
        self.thresholds.validate().map_err(|err| match err {
            SapError::Config(info) => {
                SapError::Config(info.with_context("method_id", self.method_id.clone()))
            }
            other => other,
        })
    }
}

/// In-memory catalog of declared methods keyed by `method_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicabilityMatrix {
    schema_version: String,
    methods: BTreeMap<String, MethodSpec>,
}

impl ApplicabilityMatrix {
    /// Builds a matrix, rejecting malformed specs and duplicate identifiers.
    pub fn new(
        schema_version: impl Into<String>,
        methods: Vec<MethodSpec>,
    ) -> Result<Self, SapError> {
        let schema_version = schema_version.into();
        if schema_version.trim().is_empty() {
            return Err(config_error(
                "sap_matrix.missing_schema_version",
                "matrix schema_version must not be empty",
            ));
        }
        let mut by_id = BTreeMap::new();
        for method in methods {
            method.validate()?;
            if by_id.contains_key(&method.method_id) {
                return Err(SapError::Config(
                    ErrorInfo::new("sap_matrix.duplicate_method", "method_id declared twice")
                        .with_context("method_id", method.method_id.clone()),
                ));
            }
            by_id.insert(method.method_id.clone(), method);
        }
        Ok(Self {
            schema_version,
            methods: by_id,
        })
    }

    /// Schema version carried into run provenance.
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Looks up a declared method.
    pub fn method(&self, method_id: &str) -> Option<&MethodSpec> {
        self.methods.get(method_id)
    }

    /// True when `method_id` is declared.
    pub fn contains(&self, method_id: &str) -> bool {
        self.methods.contains_key(method_id)
    }

    /// Declared methods ordered by `method_id`.
    pub fn methods(&self) -> impl ExactSizeIterator<Item = &MethodSpec> + '_ {
        self.methods.values()
    }

    /// Declared identifiers ordered lexically.
    pub fn method_ids(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.methods.keys().map(String::as_str)
    }

    /// Number of declared methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// True when no methods are declared.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Stable fingerprint of the declared catalog.
    pub fn content_hash(&self) -> Result<String, SapError> {
        stable_hash_string(self)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MatrixDocument {
    #[serde(default)]
    schema_version: Option<String>,
    #[serde(default)]
    methods: Vec<MethodSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MatrixIndex {
    schema_version: String,
    #[serde(default)]
    files: Vec<PathBuf>,
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SapError> {
    let bytes = fs::read(path).map_err(|err| SapError::io("sap_matrix.read", path, err))?;
    from_yaml_slice(&bytes).map_err(|err| {
        SapError::Config(
            ErrorInfo::new("sap_matrix.malformed", err.info().message.clone())
                .with_context("path", path.display().to_string()),
        )
    })
}

/// Parses a single-document matrix (`schema_version` plus `methods`).
pub fn parse_matrix(bytes: &[u8]) -> Result<ApplicabilityMatrix, SapError> {
    let document: MatrixDocument = from_yaml_slice(bytes)
        .map_err(|err| config_error("sap_matrix.malformed", err.info().message.clone()))?;
    let schema_version = document.schema_version.ok_or_else(|| {
        config_error(
            "sap_matrix.missing_schema_version",
            "matrix document has no schema_version",
        )
    })?;
    ApplicabilityMatrix::new(schema_version, document.methods)
}

/// Loads a matrix from a YAML file or from a directory holding `_index.yaml`.
///
/// The index lists member files explicitly; when it lists none, every other
/// `*.yaml`/`*.yml` file in the directory is loaded in lexical order.
pub fn load_matrix<P: AsRef<Path>>(path: P) -> Result<ApplicabilityMatrix, SapError> {
    let path = path.as_ref();
    let matrix = if path.is_dir() {
        load_matrix_dir(path)?
    } else {
        let bytes = fs::read(path).map_err(|err| SapError::io("sap_matrix.read", path, err))?;
        parse_matrix(&bytes).map_err(|err| match err {
            SapError::Config(info) => {
                SapError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })?
    };
    tracing::debug!(
        path = %path.display(),
        schema_version = matrix.schema_version(),
        methods = matrix.len(),
        "loaded applicability matrix"
    );
    Ok(matrix)
}

fn load_matrix_dir(dir: &Path) -> Result<ApplicabilityMatrix, SapError> {
    let index: MatrixIndex = read_yaml(&dir.join(MATRIX_INDEX_FILE))?;
    let files = if index.files.is_empty() {
        discover_member_files(dir)?
    } else {
        index.files.iter().map(|file| dir.join(file)).collect()
    };

    let mut methods = Vec::new();
    let mut origin: BTreeMap<String, PathBuf> = BTreeMap::new();
    for file in files {
        let document: MatrixDocument = read_yaml(&file)?;
        if let Some(version) = &document.schema_version {
            if version != &index.schema_version {
                return Err(SapError::Config(
                    ErrorInfo::new(
                        "sap_matrix.schema_mismatch",
                        "member file schema_version differs from the index",
                    )
                    .with_context("path", file.display().to_string())
                    .with_context("expected", index.schema_version.clone())
                    .with_context("actual", version.clone()),
                ));
            }
        }
        for method in document.methods {
            if let Some(first) = origin.get(&method.method_id) {
                return Err(SapError::Config(
                    ErrorInfo::new("sap_matrix.duplicate_method", "method_id declared twice")
                        .with_context("method_id", method.method_id.clone())
                        .with_context("first", first.display().to_string())
                        .with_context("second", file.display().to_string()),
                ));
            }
            origin.insert(method.method_id.clone(), file.clone());
            methods.push(method);
        }
    }
    ApplicabilityMatrix::new(index.schema_version, methods)
}

fn discover_member_files(dir: &Path) -> Result<Vec<PathBuf>, SapError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| SapError::io("sap_matrix.walk", dir, err))?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        let is_index = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(|stem| stem == "_index")
            .unwrap_or(false);
        if is_yaml && !is_index {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}
