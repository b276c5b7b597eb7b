use thiserror::Error;

/// Failure to split a `category/name-version[-rN]` string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Missing category in '{0}'")]
    MissingCategory(String),

    #[error("Invalid version in '{0}'")]
    InvalidVersion(String),

    #[error("Invalid package name in '{0}'")]
    InvalidName(String),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid package index: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Package index lock poisoned")]
    LockPoisoned,
}

/// SRC_URI declarations that cannot be expanded into a location map
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("{cpv}: unbalanced parentheses in SRC_URI")]
    UnbalancedParens { cpv: String },

    #[error("{cpv}: '->' without a preceding URI")]
    DanglingArrow { cpv: String },

    #[error("{cpv}: '->' must be followed by a file name")]
    MissingRenameTarget { cpv: String },

    #[error("{cpv}: rename target '{target}' must not contain '/'")]
    InvalidRenameTarget { cpv: String, target: String },

    #[error("{cpv}: conditional '{flag}' is not followed by a group")]
    ConditionalWithoutGroup { cpv: String, flag: String },
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid url: {0}")]
    InvalidUrl(String),
}

/// A handler error tagged with the handler that raised it
#[derive(Debug, Error)]
#[error("[{handler}] {source}")]
pub struct HandlerFault {
    pub handler: String,
    #[source]
    pub source: HandlerError,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid blacklist rule '{0}'")]
    InvalidRule(String),
}

/// Reasons a scan ends without a result set
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("No package matching '{0}'")]
    NotFound(String),

    #[error("Package '{0}' only have a dev version (9999)")]
    DevOnly(String),

    #[error("Package '{0}' is blacklisted")]
    Blacklisted(String),

    #[error("Invalid SRC_URI for '{cpv}': {source}")]
    Metadata {
        cpv: String,
        #[source]
        source: MetadataError,
    },

    #[error("Package query failed: {0}")]
    Query(#[from] QueryError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}
