/// All error types that can occur when discovering or controlling ESPHome lights.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// A request did not complete within the configured timeout.
    #[error("request to {address}{path} timed out")]
    Timeout { address: String, path: String },

    /// The HTTP request failed before a response was received.
    #[error("request to {address}{path} failed: {err}")]
    Http {
        address: String,
        path: String,
        err: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    /// The device answered with a non-success HTTP status.
    #[error("request to {address}{path} returned status {status}")]
    Status {
        address: String,
        path: String,
        status: u16,
    },

    /// The device answered, but the body did not have the expected shape.
    #[error("malformed response from {path}: {reason}")]
    MalformedResponse { path: String, reason: String },

    /// No light channel on the device answered during classification.
    #[error("device at {0} exposes no recognized light channel")]
    UnrecognizedDevice(String),

    /// The beacon answered with a protocol tag this adapter does not speak.
    #[error("device at {address} reports unknown protocol tag {tag:?}")]
    UnknownProtocol { address: String, tag: String },

    /// The beacon payload could not be split into its identity fields.
    #[error("invalid beacon payload: {0}")]
    InvalidBeacon(String),

    /// The requested device is not in the registry.
    #[error("device {0} not found")]
    DeviceNotFound(String),
}

impl Error {
    /// Create a new timeout error
    pub fn timeout(address: &str, path: &str) -> Self {
        Error::Timeout {
            address: address.to_string(),
            path: path.to_string(),
        }
    }

    /// Create a new HTTP failure error
    pub fn http(address: &str, path: &str, err: reqwest::Error) -> Self {
        Error::Http {
            address: address.to_string(),
            path: path.to_string(),
            err,
        }
    }

    /// Create a new HTTP status error
    pub fn status(address: &str, path: &str, status: u16) -> Self {
        Error::Status {
            address: address.to_string(),
            path: path.to_string(),
            status,
        }
    }

    /// Create a new malformed response error
    pub fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Error::MalformedResponse {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a new unknown protocol error
    pub fn unknown_protocol(address: &str, tag: &str) -> Self {
        Error::UnknownProtocol {
            address: address.to_string(),
            tag: tag.to_string(),
        }
    }

    /// True for failures of a single read or write request, including
    /// answers whose payload could not be understood.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Error::Timeout { .. }
                | Error::Http { .. }
                | Error::Status { .. }
                | Error::MalformedResponse { .. }
                | Error::JsonLoad(_)
        )
    }

    /// True when the device answered but does not serve the endpoint.
    pub fn is_absent_endpoint(&self) -> bool {
        matches!(self, Error::Status { .. })
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
