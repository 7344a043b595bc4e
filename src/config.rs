// src/config.rs
use crate::constants::{
    ALLOWED_SUBMITTER_ENV_PREFIX, IMPROVEMENTS_ENV, MINIMAL_MODE_ENV, SIDE_RECORDS_ENV,
};
use crate::error::AppError;
use crate::types::DocumentType;
use clap::Parser;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Data hash from the submission event (32 bytes, hex, optional 0x)
    pub data_hash: String,

    /// Property hash from the submission event (defaults to the data hash)
    #[arg(long)]
    pub property_hash: Option<String>,

    /// Submitter address (defaults to the first allowed submitter)
    #[arg(long)]
    pub submitter: Option<String>,

    /// Chain the event was observed on
    #[arg(long, default_value_t = 137)]
    pub chain_id: u64,

    /// Block timestamp of the event, seconds since epoch (defaults to now)
    #[arg(long)]
    pub timestamp: Option<i64>,

    /// Replay documents from a directory of `{cid}.json` files instead of gateways
    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    /// Write the materialized records to this file as JSON (stdout otherwise)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Treat the event as a heartbeat instead of a data submission
    #[arg(long, default_value_t = false)]
    pub heartbeat: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// ---------------------------------------------------------------------------
// Gateway endpoints
// ---------------------------------------------------------------------------

/// Environment key groups for gateway endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndpointKey {
    Property,
    Address,
    SalesHistory,
    Tax,
    Improvement,
}

impl EndpointKey {
    pub const ALL: [EndpointKey; 5] = [
        Self::Property,
        Self::Address,
        Self::SalesHistory,
        Self::Tax,
        Self::Improvement,
    ];

    fn env_stem(&self) -> &'static str {
        match self {
            Self::Property => "PROPERTY",
            Self::Address => "ADDRESS",
            Self::SalesHistory => "SALES_HISTORY",
            Self::Tax => "TAX",
            Self::Improvement => "IMPROVEMENT",
        }
    }

    pub fn gateway_var(&self) -> String {
        format!("ENVIO_{}_IPFS_GATEWAY", self.env_stem())
    }

    pub fn token_var(&self) -> String {
        format!("ENVIO_{}_GATEWAY_TOKEN", self.env_stem())
    }

    /// Whether startup must fail without this endpoint.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Property | Self::Address)
    }

    /// The endpoint group a document type is fetched from.
    ///
    /// `None` in the second slot means there is no fallback.
    fn route(doc_type: DocumentType) -> (EndpointKey, Option<EndpointKey>) {
        use DocumentType as D;
        match doc_type {
            D::Address => (Self::Address, None),
            D::SalesHistory => (Self::SalesHistory, None),
            D::Tax => (Self::Tax, None),
            D::Improvement | D::Inspection | D::File | D::Company | D::Person => {
                (Self::Improvement, Some(Self::Property))
            }
            _ => (Self::Property, None),
        }
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.env_stem().to_ascii_lowercase())
    }
}

/// One gateway: where to send requests and how to authenticate them.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: Url,
    pub token: Option<String>,
}

impl Endpoint {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            AppError::InvalidConfiguration {
                key: base_url.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// The URL string the rate limiter is keyed by.
    pub fn limiter_key(&self) -> &str {
        self.base_url.as_str()
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Per-document-type gateway endpoints, validated at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    endpoints: BTreeMap<EndpointKey, Endpoint>,
}

impl GatewayConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(std::env::vars())
    }

    /// Reads the configuration from explicit variables.
    ///
    /// Fails when the property or address endpoint is missing.
    pub fn from_vars<I>(vars: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let mut endpoints = BTreeMap::new();

        for key in EndpointKey::ALL {
            let Some(gateway) = vars.get(&key.gateway_var()).filter(|v| !v.trim().is_empty())
            else {
                if key.is_required() {
                    return Err(AppError::MissingConfiguration(format!(
                        "{} gateway is required: set {} (and {} if the gateway needs a token)",
                        key,
                        key.gateway_var(),
                        key.token_var()
                    )));
                }
                log::info!("{} documents disabled (missing {})", key, key.gateway_var());
                continue;
            };

            let endpoint = Endpoint::new(gateway.trim(), vars.get(&key.token_var()).cloned())?;
            log::info!("{} documents enabled with gateway {}", key, endpoint.base_url);
            endpoints.insert(key, endpoint);
        }

        Ok(Self { endpoints })
    }

    /// Builds a configuration directly, still enforcing required keys.
    pub fn from_endpoints(
        endpoints: impl IntoIterator<Item = (EndpointKey, Endpoint)>,
    ) -> Result<Self, AppError> {
        let endpoints: BTreeMap<_, _> = endpoints.into_iter().collect();
        if let Some(missing) = EndpointKey::ALL
            .iter()
            .find(|k| k.is_required() && !endpoints.contains_key(k))
        {
            return Err(AppError::MissingConfiguration(format!(
                "{} gateway is required",
                missing
            )));
        }
        Ok(Self { endpoints })
    }

    /// Every document type routed to one endpoint.
    pub fn single(endpoint: Endpoint) -> Self {
        Self {
            endpoints: EndpointKey::ALL
                .iter()
                .map(|k| (*k, endpoint.clone()))
                .collect(),
        }
    }

    pub fn endpoint(&self, key: EndpointKey) -> Option<&Endpoint> {
        self.endpoints.get(&key)
    }

    /// The endpoint serving a document type, if that type is enabled.
    pub fn endpoint_for(&self, doc_type: DocumentType) -> Option<&Endpoint> {
        let (primary, fallback) = EndpointKey::route(doc_type);
        self.endpoints
            .get(&primary)
            .or_else(|| fallback.and_then(|k| self.endpoints.get(&k)))
    }

    pub fn is_enabled(&self, doc_type: DocumentType) -> bool {
        self.endpoint_for(doc_type).is_some()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = (&EndpointKey, &Endpoint)> {
        self.endpoints.iter()
    }
}

// ---------------------------------------------------------------------------
// Indexer behaviour
// ---------------------------------------------------------------------------

/// Submitters allowed to trigger resolution, compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    submitters: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(submitters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut submitters: Vec<String> = submitters
            .into_iter()
            .map(|s| s.as_ref().trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        submitters.sort();
        submitters.dedup();
        Self { submitters }
    }

    pub fn permits(&self, submitter: &str) -> bool {
        let submitter = submitter.trim().to_ascii_lowercase();
        self.submitters.iter().any(|s| *s == submitter)
    }

    pub fn first(&self) -> Option<&str> {
        self.submitters.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.submitters.is_empty()
    }
}

/// What the submission processor does with an accepted event.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub allowed_submitters: AllowList,
    /// Record the submission summary only, without walking the graph.
    pub minimal_mode: bool,
    /// Materialize structure, utility, layout and lot records in phase 1.
    pub side_records: bool,
    /// Materialize improvements with their inspections, files and contractors.
    pub improvements: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            allowed_submitters: AllowList::default(),
            minimal_mode: false,
            side_records: false,
            improvements: true,
        }
    }
}

impl IndexerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(std::env::vars())
    }

    /// Fails when no allowed submitter is configured.
    pub fn from_vars<I>(vars: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        let allowed_submitters = AllowList::new(
            vars.iter()
                .filter(|(k, _)| k.starts_with(ALLOWED_SUBMITTER_ENV_PREFIX))
                .map(|(_, v)| v),
        );
        if allowed_submitters.is_empty() {
            return Err(AppError::MissingConfiguration(format!(
                "no allowed submitters: set at least one {}* variable",
                ALLOWED_SUBMITTER_ENV_PREFIX
            )));
        }

        let defaults = Self::default();
        Ok(Self {
            allowed_submitters,
            minimal_mode: flag(&vars, MINIMAL_MODE_ENV)?.unwrap_or(defaults.minimal_mode),
            side_records: flag(&vars, SIDE_RECORDS_ENV)?.unwrap_or(defaults.side_records),
            improvements: flag(&vars, IMPROVEMENTS_ENV)?.unwrap_or(defaults.improvements),
        })
    }
}

fn flag(vars: &HashMap<String, String>, key: &str) -> Result<Option<bool>, AppError> {
    let Some(raw) = vars.get(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => Err(AppError::InvalidConfiguration {
            key: key.to_string(),
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}

// ---------------------------------------------------------------------------
// Binary configuration
// ---------------------------------------------------------------------------

/// Where documents come from for a CLI run.
#[derive(Debug, Clone)]
pub enum SourceSelection {
    Gateways(GatewayConfig),
    Fixtures(PathBuf),
}

/// Resolved configuration for one CLI run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: SourceSelection,
    pub indexer: IndexerConfig,
    pub data_hash: String,
    pub property_hash: String,
    pub submitter: String,
    pub chain_id: u64,
    pub timestamp: i64,
    pub output: Option<PathBuf>,
    pub heartbeat: bool,
    pub verbose: bool,
}

impl PipelineConfig {
    /// Resolves a complete configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        Self::resolve_with_vars(cli, std::env::vars())
    }

    pub fn resolve_with_vars<I>(cli: CommandLineInput, vars: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();

        let source = match cli.fixtures {
            Some(dir) => SourceSelection::Fixtures(dir),
            None => SourceSelection::Gateways(GatewayConfig::from_vars(vars.clone())?),
        };
        let indexer = IndexerConfig::from_vars(vars)?;

        let submitter = match cli.submitter {
            Some(s) => s,
            None => indexer
                .allowed_submitters
                .first()
                .map(str::to_string)
                .ok_or_else(|| AppError::MissingConfiguration("submitter".to_string()))?,
        };

        Ok(Self {
            source,
            indexer,
            property_hash: cli.property_hash.unwrap_or_else(|| cli.data_hash.clone()),
            data_hash: cli.data_hash,
            submitter,
            chain_id: cli.chain_id,
            timestamp: cli
                .timestamp
                .unwrap_or_else(|| chrono::Utc::now().timestamp()),
            output: cli.output,
            heartbeat: cli.heartbeat,
            verbose: cli.verbose,
        })
    }
}
