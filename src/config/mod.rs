//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `VERITY_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS, DEFAULT_CONTRADICTION_THRESHOLD,
    DEFAULT_INFERENCE_TIMEOUT_SECS, DEFAULT_MAX_CLAIMS, DEFAULT_MAX_INPUT_CHARS,
    DEFAULT_RATE_LIMIT_PER_MINUTE, DEFAULT_REFUTATION_FLOOR, DEFAULT_REFUTATION_MIN_RELEVANCE,
    DEFAULT_TOP_K, DEFAULT_TRUTH_THRESHOLD, DEFAULT_WORKER_POOL_SIZE,
};
use crate::hashing::NormalizationPolicy;
use crate::pipeline::{DecisionThresholds, PipelineOptions};

/// Default embedding model identifier (informational; the weights come from
/// `VERITY_EMBED_MODEL_PATH`).
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `VERITY_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8000`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Serialized vector index artifact. Default: `./data/kb.index`.
    pub index_path: PathBuf,

    /// JSON array of `{snippet, source}` records. Default: `./data/kb_snippets.json`.
    pub snippets_path: PathBuf,

    /// Sentence encoder directory (BERT + tokenizer). `None` runs the stub encoder.
    pub embed_model_path: Option<PathBuf>,

    /// Entailment model directory (BERT/RoBERTa + tokenizer). `None` runs the stub scorer.
    pub nli_model_path: Option<PathBuf>,

    /// Embedding model identifier, reported in logs.
    pub embedding_model: String,

    /// Evidence snippets retrieved per claim. Default: `5`.
    pub top_k: usize,

    pub truth_threshold: f32,
    pub contradiction_threshold: f32,
    pub refutation_floor: f32,
    pub refutation_min_relevance: f32,

    /// Prefix hypotheses with a fixed framing phrase. Default: `true`.
    pub use_nli_context: bool,

    /// Degrade a failing claim to neutral instead of failing the request. Default: `true`.
    pub degrade_failed_claims: bool,

    /// Result cache TTL in seconds. Default: `300`.
    pub cache_ttl_secs: u64,

    /// Max entries in the result cache. Default: `1_000`.
    pub cache_capacity: u64,

    /// Fingerprint normalization policy. Default: `whitespace`.
    pub cache_normalization: NormalizationPolicy,

    /// Hard wall-clock bound on one inference task. Default: `45`.
    pub inference_timeout_secs: u64,

    /// Concurrent inference tasks. Default: `1` (serialized inference).
    pub worker_pool_size: usize,

    /// Classification requests per client per minute. Default: `10`.
    pub rate_limit_per_minute: u32,

    pub max_input_chars: usize,
    pub max_claims: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            index_path: PathBuf::from("./data/kb.index"),
            snippets_path: PathBuf::from("./data/kb_snippets.json"),
            embed_model_path: None,
            nli_model_path: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            top_k: DEFAULT_TOP_K,
            truth_threshold: DEFAULT_TRUTH_THRESHOLD,
            contradiction_threshold: DEFAULT_CONTRADICTION_THRESHOLD,
            refutation_floor: DEFAULT_REFUTATION_FLOOR,
            refutation_min_relevance: DEFAULT_REFUTATION_MIN_RELEVANCE,
            use_nli_context: true,
            degrade_failed_claims: true,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_normalization: NormalizationPolicy::default(),
            inference_timeout_secs: DEFAULT_INFERENCE_TIMEOUT_SECS,
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            max_claims: DEFAULT_MAX_CLAIMS,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "VERITY_PORT";
    const ENV_BIND_ADDR: &'static str = "VERITY_BIND_ADDR";
    const ENV_INDEX_PATH: &'static str = "VERITY_INDEX_PATH";
    const ENV_SNIPPETS_PATH: &'static str = "VERITY_SNIPPETS_PATH";
    const ENV_EMBED_MODEL_PATH: &'static str = "VERITY_EMBED_MODEL_PATH";
    const ENV_NLI_MODEL_PATH: &'static str = "VERITY_NLI_MODEL_PATH";
    const ENV_EMBEDDING_MODEL: &'static str = "VERITY_EMBEDDING_MODEL";
    const ENV_TOP_K: &'static str = "VERITY_TOP_K";
    const ENV_TRUTH_THRESHOLD: &'static str = "VERITY_TRUTH_THRESHOLD";
    const ENV_CONTRADICTION_THRESHOLD: &'static str = "VERITY_CONTRADICTION_THRESHOLD";
    const ENV_REFUTATION_FLOOR: &'static str = "VERITY_REFUTATION_FLOOR";
    const ENV_REFUTATION_MIN_RELEVANCE: &'static str = "VERITY_REFUTATION_MIN_RELEVANCE";
    const ENV_USE_NLI_CONTEXT: &'static str = "VERITY_USE_NLI_CONTEXT";
    const ENV_DEGRADE_FAILED_CLAIMS: &'static str = "VERITY_DEGRADE_FAILED_CLAIMS";
    const ENV_CACHE_TTL_SECS: &'static str = "VERITY_CACHE_TTL_SECS";
    const ENV_CACHE_CAPACITY: &'static str = "VERITY_CACHE_CAPACITY";
    const ENV_CACHE_NORMALIZE: &'static str = "VERITY_CACHE_NORMALIZE";
    const ENV_INFERENCE_TIMEOUT_SECS: &'static str = "VERITY_INFERENCE_TIMEOUT_SECS";
    const ENV_WORKER_POOL_SIZE: &'static str = "VERITY_WORKER_POOL_SIZE";
    const ENV_RATE_LIMIT_PER_MINUTE: &'static str = "VERITY_RATE_LIMIT_PER_MINUTE";
    const ENV_MAX_INPUT_CHARS: &'static str = "VERITY_MAX_INPUT_CHARS";
    const ENV_MAX_CLAIMS: &'static str = "VERITY_MAX_CLAIMS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            port: Self::parse_port_from_env(defaults.port)?,
            bind_addr: Self::parse_bind_addr_from_env(defaults.bind_addr)?,
            index_path: Self::parse_path_from_env(Self::ENV_INDEX_PATH, defaults.index_path),
            snippets_path: Self::parse_path_from_env(
                Self::ENV_SNIPPETS_PATH,
                defaults.snippets_path,
            ),
            embed_model_path: Self::parse_optional_path_from_env(Self::ENV_EMBED_MODEL_PATH),
            nli_model_path: Self::parse_optional_path_from_env(Self::ENV_NLI_MODEL_PATH),
            embedding_model: Self::parse_string_from_env(
                Self::ENV_EMBEDDING_MODEL,
                defaults.embedding_model,
            ),
            top_k: Self::parse_from_env(Self::ENV_TOP_K, defaults.top_k)?,
            truth_threshold: Self::parse_from_env(
                Self::ENV_TRUTH_THRESHOLD,
                defaults.truth_threshold,
            )?,
            contradiction_threshold: Self::parse_from_env(
                Self::ENV_CONTRADICTION_THRESHOLD,
                defaults.contradiction_threshold,
            )?,
            refutation_floor: Self::parse_from_env(
                Self::ENV_REFUTATION_FLOOR,
                defaults.refutation_floor,
            )?,
            refutation_min_relevance: Self::parse_from_env(
                Self::ENV_REFUTATION_MIN_RELEVANCE,
                defaults.refutation_min_relevance,
            )?,
            use_nli_context: Self::parse_bool_from_env(
                Self::ENV_USE_NLI_CONTEXT,
                defaults.use_nli_context,
            )?,
            degrade_failed_claims: Self::parse_bool_from_env(
                Self::ENV_DEGRADE_FAILED_CLAIMS,
                defaults.degrade_failed_claims,
            )?,
            cache_ttl_secs: Self::parse_from_env(
                Self::ENV_CACHE_TTL_SECS,
                defaults.cache_ttl_secs,
            )?,
            cache_capacity: Self::parse_from_env(
                Self::ENV_CACHE_CAPACITY,
                defaults.cache_capacity,
            )?,
            cache_normalization: Self::parse_from_env(
                Self::ENV_CACHE_NORMALIZE,
                defaults.cache_normalization,
            )?,
            inference_timeout_secs: Self::parse_from_env(
                Self::ENV_INFERENCE_TIMEOUT_SECS,
                defaults.inference_timeout_secs,
            )?,
            worker_pool_size: Self::parse_from_env(
                Self::ENV_WORKER_POOL_SIZE,
                defaults.worker_pool_size,
            )?,
            rate_limit_per_minute: Self::parse_from_env(
                Self::ENV_RATE_LIMIT_PER_MINUTE,
                defaults.rate_limit_per_minute,
            )?,
            max_input_chars: Self::parse_from_env(
                Self::ENV_MAX_INPUT_CHARS,
                defaults.max_input_chars,
            )?,
            max_claims: Self::parse_from_env(Self::ENV_MAX_CLAIMS, defaults.max_claims)?,
        })
    }

    /// Validates paths and basic invariants (does not touch artifact contents).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.index_path, &self.snippets_path] {
            if path.exists() && !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        for path in [&self.embed_model_path, &self.nli_model_path]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        for (name, value) in [
            (Self::ENV_TRUTH_THRESHOLD, self.truth_threshold),
            (Self::ENV_CONTRADICTION_THRESHOLD, self.contradiction_threshold),
            (Self::ENV_REFUTATION_FLOOR, self.refutation_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name,
                    value: value.to_string(),
                    expected: "0.0..=1.0",
                });
            }
        }

        if !(-1.0..=1.0).contains(&self.refutation_min_relevance) {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_REFUTATION_MIN_RELEVANCE,
                value: self.refutation_min_relevance.to_string(),
                expected: "-1.0..=1.0",
            });
        }

        for (name, value) in [
            (Self::ENV_TOP_K, self.top_k as u64),
            (Self::ENV_WORKER_POOL_SIZE, self.worker_pool_size as u64),
            (Self::ENV_INFERENCE_TIMEOUT_SECS, self.inference_timeout_secs),
            (Self::ENV_CACHE_TTL_SECS, self.cache_ttl_secs),
            (Self::ENV_RATE_LIMIT_PER_MINUTE, self.rate_limit_per_minute as u64),
            (Self::ENV_MAX_INPUT_CHARS, self.max_input_chars as u64),
            (Self::ENV_MAX_CLAIMS, self.max_claims as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    value: value.to_string(),
                    expected: ">= 1",
                });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    /// Decision thresholds for the per-claim verdict.
    pub fn thresholds(&self) -> DecisionThresholds {
        DecisionThresholds {
            truth: self.truth_threshold,
            contradiction: self.contradiction_threshold,
            refutation_floor: self.refutation_floor,
            refutation_min_relevance: self.refutation_min_relevance,
        }
    }

    /// Pipeline options derived from this configuration.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            top_k: self.top_k,
            use_nli_context: self.use_nli_context,
            degrade_failed_claims: self.degrade_failed_claims,
            max_claims: self.max_claims,
            thresholds: self.thresholds(),
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) if !value.trim().is_empty() => {
                value
                    .trim()
                    .parse()
                    .map_err(|e: T::Err| ConfigError::InvalidValue {
                        name: var_name,
                        value,
                        reason: e.to_string(),
                    })
            }
            _ => Ok(default),
        }
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match env::var(var_name) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "" => Ok(default),
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    name: var_name,
                    value,
                    reason: "expected a boolean (true/false/1/0)".to_string(),
                }),
            },
            Err(_) => Ok(default),
        }
    }
}
