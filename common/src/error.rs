use thiserror::Error;

/// Problems found while reading operator-supplied specifications.
///
/// All of these are raised before any scanning starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("invalid port specification '{0}'")]
    InvalidPortSpec(String),

    #[error("port '{value}' in '{spec}' is outside 1-65535")]
    PortOutOfRange { spec: String, value: String },

    #[error("ambiguous port specification '{0}': ',' lists and '-' ranges cannot be combined")]
    AmbiguousPortSpec(String),

    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("unsupported address specification '{spec}': {reason}")]
    UnsupportedAddress { spec: String, reason: &'static str },

    #[error("address range '{0}' is empty")]
    EmptyRange(String),

    #[error("'{spec}' expands to {count} addresses, more than the limit of {limit}")]
    TooManyHosts { spec: String, count: u64, limit: usize },

    #[error("no valid targets in '{0}'")]
    NoTargets(String),

    #[error("concurrency must be at least 1")]
    InvalidConcurrency,
}

impl SpecError {
    /// Whether lenient parsing may drop the offending element and carry on.
    pub fn is_droppable(&self) -> bool {
        matches!(
            self,
            SpecError::InvalidAddress(_)
                | SpecError::UnsupportedAddress { .. }
                | SpecError::EmptyRange(_)
        )
    }
}
