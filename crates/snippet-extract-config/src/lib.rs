//! Configuration loader for snippet-extract.
//!
//! Settings resolve through the precedence stack
//! override flag → working directory → git root → built-in defaults,
//! with later layers winning. The only tunable today is the set of comment
//! prefixes that introduce snippet markers.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use snippet_extract::{CommentPrefixes, Extractor, PrefixError, DEFAULT_COMMENT_PREFIXES};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".snippet-extract.toml";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub markers: MarkerSettings,
    pub sources: ConfigSources,
}

/// Marker recognition settings.
#[derive(Clone, Debug)]
pub struct MarkerSettings {
    pub comment_prefixes: CommentPrefixes,
}

impl MarkerSettings {
    pub fn extractor(&self) -> Result<Extractor, PrefixError> {
        Extractor::new(self.comment_prefixes.clone())
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    fn builtin() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: Some(path),
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::builtin();
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(default_source.clone()));

        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let markers = merged.finalize().map_err(ConfigError::Validation)?;
        tracing::debug!(
            prefixes = %markers.comment_prefixes,
            layers = source_layers.len(),
            "resolved snippet-extract configuration"
        );

        Ok(Config {
            markers,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    PartialConfig {
        comment_prefixes: Some(Located::new(default_prefixes(), source)),
        extra_comment_prefixes: Vec::new(),
    }
}

fn default_prefixes() -> Vec<String> {
    DEFAULT_COMMENT_PREFIXES
        .iter()
        .map(|prefix| prefix.to_string())
        .collect()
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    comment_prefixes: Option<Located<Vec<String>>>,
    extra_comment_prefixes: Vec<Located<Vec<String>>>,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        // A replacement set discards extras inherited from lower layers.
        if let Some(prefixes) = other.comment_prefixes {
            self.comment_prefixes = Some(prefixes);
            self.extra_comment_prefixes.clear();
        }
        self.extra_comment_prefixes.extend(other.extra_comment_prefixes);
    }

    fn finalize(self) -> Result<MarkerSettings, ConfigValidationErrors> {
        let mut errors = Vec::new();

        let base = self
            .comment_prefixes
            .unwrap_or_else(|| Located::new(default_prefixes(), ConfigSource::builtin()));

        let mut prefixes = match CommentPrefixes::new(base.value) {
            Ok(prefixes) => Some(prefixes),
            Err(err) => {
                errors.push(
                    ConfigValidationError::new(Some(base.source), err.to_string())
                        .with_context("markers.comment_prefixes"),
                );
                None
            }
        };

        for extra in self.extra_comment_prefixes {
            let Some(current) = prefixes.take() else {
                break;
            };
            match current.extend(extra.value) {
                Ok(extended) => prefixes = Some(extended),
                Err(err) => errors.push(
                    ConfigValidationError::new(Some(extra.source), err.to_string())
                        .with_context("markers.extra_comment_prefixes"),
                ),
            }
        }

        match prefixes {
            Some(comment_prefixes) if errors.is_empty() => {
                Ok(MarkerSettings { comment_prefixes })
            }
            _ => Err(ConfigValidationErrors(errors)),
        }
    }
}

/// Collection of validation failures.
#[derive(Clone, Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    markers: Option<RawMarkers>,
}

#[derive(Debug, Deserialize)]
struct RawMarkers {
    #[serde(default)]
    comment_prefixes: Option<Vec<String>>,
    #[serde(default)]
    extra_comment_prefixes: Option<Vec<String>>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        let Some(markers) = self.markers else {
            return PartialConfig::default();
        };

        PartialConfig {
            comment_prefixes: markers
                .comment_prefixes
                .map(|prefixes| Located::new(prefixes, source.clone())),
            extra_comment_prefixes: markers
                .extra_comment_prefixes
                .map(|prefixes| vec![Located::new(prefixes, source)])
                .unwrap_or_default(),
        }
    }
}
