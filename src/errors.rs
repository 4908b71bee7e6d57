use crate::abi::AbiError;
use thiserror::Error;

/// Errors surfaced by every resolution operation.
///
/// `UnregisteredDomain` is an expected outcome rather than a failure, and is
/// the only error that lets the layer orchestrator fall back from L2 to L1.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The token id of the domain has no owner
    #[error("Domain {0} is not registered")]
    UnregisteredDomain(String),

    /// No naming service handles this domain
    #[error("Domain {0} is not supported")]
    UnsupportedDomain(String),

    /// The requested network is not configured
    #[error("Network {0} is not supported")]
    UnsupportedNetwork(String),

    /// The domain is owned but has no resolver configured
    #[error("Domain {0} does not have a configured resolver")]
    UnspecifiedResolver(String),

    /// The resolver has no value for the requested key
    #[error("No record {key} found for domain {domain}")]
    RecordNotFound {
        /// Domain that was queried
        domain: String,
        /// Record key that was missing
        key: String,
    },

    /// The naming service cannot store this kind of record
    #[error("Record {0} is not supported")]
    RecordNotSupported(String),

    /// The address has no reverse record on any layer
    #[error("Reverse resolution is not specified for {0}")]
    ReverseResolutionNotSpecified(String),

    /// The adapter was built without a ProxyReader contract
    #[error("Proxy reader is not initialized")]
    ProxyReaderNotInitialized,

    /// A batch request mixed domains from different naming services
    #[error("Domains in a batch must belong to the same naming service: {0}")]
    InconsistentDomainArray(String),

    /// A batch response carried more entries than were requested
    #[error("Expected at most {expected} responses, got {got}")]
    TooManyResponses {
        /// Number of requests sent
        expected: usize,
        /// Number of responses received
        got: usize,
    },

    /// The provider rejected the request because of rate limiting
    #[error("Request was rate limited by {0}")]
    RateLimited(String),

    /// The provider rejected the request credentials
    #[error("Request was not authenticated by {0}")]
    Unauthenticated(String),

    /// The contract call reverted
    #[error("Execution reverted: {0}")]
    ExecutionReverted(String),

    /// The request or response was malformed at the JSON-RPC level
    #[error("Bad request or response: {0}")]
    BadRequestOrResponse(String),

    /// The response data did not decode against the contract interface
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// The function or event is absent from the contract interface
    #[error("Wrong contract interface: {0}")]
    WrongInterface(String),

    /// The naming service does not implement this operation
    #[error("Method {method} is not supported by {service}")]
    MethodNotSupported {
        /// Operation name
        method: &'static str,
        /// Naming service name
        service: &'static str,
    },

    /// Any failure not covered by the variants above
    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl ResolutionError {
    /// Whether this error is the "not registered" outcome.
    pub fn is_unregistered(&self) -> bool {
        matches!(self, ResolutionError::UnregisteredDomain(_))
    }
}

impl From<AbiError> for ResolutionError {
    fn from(err: AbiError) -> Self {
        match err {
            AbiError::WrongInterface(name) => ResolutionError::WrongInterface(name),
            AbiError::CouldNotEncode(msg) => ResolutionError::BadRequestOrResponse(msg),
            AbiError::CouldNotDecode(msg) => ResolutionError::DecodingError(msg),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T, E = ResolutionError> = std::result::Result<T, E>;
