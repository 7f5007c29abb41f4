//! The seam between the directory and the external geographic database.
//!
//! [`BusinessSource`] is synchronous so the sync orchestrator stays
//! embeddable in synchronous contexts; the HTTP implementation in
//! `annuaire-data` bridges its async client internally.

use geo::Coord;
use thiserror::Error;

use crate::business::{SourceRef, Tags};

/// One element fetched from the external source, reduced to what the sync
/// orchestrator needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceElement {
    /// Identity in the external source.
    pub source: SourceRef,
    /// Resolved position, when the element carries one directly or via its
    /// computed centre. `x = longitude`, `y = latitude`.
    pub location: Option<Coord<f64>>,
    /// The element's tag map.
    pub tags: Tags,
}

impl SourceElement {
    /// The element's display name, when tagged.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.tags.get("name").map(String::as_str)
    }
}

/// Errors raised when fetching elements from the external source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not reach the service.
    #[error("failed to reach {url}: {message}")]
    Network {
        /// Endpoint that was contacted.
        url: String,
        /// Transport-level failure description.
        message: String,
    },
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Endpoint that was contacted.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status.
    #[error("{url} answered with HTTP status {status}")]
    Status {
        /// Endpoint that was contacted.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The response body could not be decoded.
    #[error("failed to decode source response: {message}")]
    Decode {
        /// Decoding failure description.
        message: String,
    },
}

/// Fetch named business elements from the external source.
///
/// Implementations return only elements that carry tags including a `name`;
/// coordinate resolution may still fail per element, which the orchestrator
/// handles by skipping the element.
pub trait BusinessSource {
    /// Fetch all candidate elements for one sync run.
    fn fetch_businesses(&self) -> Result<Vec<SourceElement>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::SourceKind;

    #[test]
    fn name_reads_the_name_tag() {
        let element = SourceElement {
            source: SourceRef::new(SourceKind::Node, 1),
            location: None,
            tags: Tags::from([("name".into(), "Boulangerie Muller".into())]),
        };
        assert_eq!(element.name(), Some("Boulangerie Muller"));
    }
}
