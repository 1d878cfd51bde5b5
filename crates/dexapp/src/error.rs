use std::fmt;
use thiserror::Error;

/// Why a persisted or imported payload was rejected.
///
/// `path` points at the offending field (`"[3].id"`, `"pages.home.itemsPerPage"`),
/// or is empty when the whole payload is at fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn whole(reason: impl Into<String>) -> Self {
        Self::new("", reason)
    }

    /// Prefix the path with an outer field or index.
    pub fn within(mut self, outer: impl AsRef<str>) -> Self {
        let outer = outer.as_ref();
        let inner = std::mem::take(&mut self.path);
        self.path = if outer.is_empty() {
            inner
        } else if inner.is_empty() {
            outer.to_string()
        } else if inner.starts_with('[') {
            format!("{}{}", outer, inner)
        } else {
            format!("{}.{}", outer, inner)
        };
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Error, Debug)]
pub enum DexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Storage quota exceeded writing {key}: needs {needed} bytes, limit is {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("Invalid data: {0}")]
    Validation(#[from] ValidationError),

    #[error("Import rejected: {0}")]
    Import(String),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, DexError>;
