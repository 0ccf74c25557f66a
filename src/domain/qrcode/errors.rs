use thiserror::Error;

/// Step of the relay that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Decode,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "Upload",
            Self::Decode => "Decode",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What exactly was wrong with a malformed upstream body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// Body did not parse as a JSON object.
    NotJson,
    /// Body parsed and reported success but lacked the expected payload field.
    MissingField(&'static str),
}

impl std::fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotJson => f.write_str("non-JSON"),
            Self::MissingField(field) => write!(f, "JSON without {field}"),
        }
    }
}

/// Closed set of failures the relay can report.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Upstream answered with something that is not the expected JSON document.
    /// `excerpt` holds the head of the raw body.
    #[error("{stage} API returned {kind}: {excerpt}")]
    UpstreamMalformed {
        stage: Stage,
        kind: MalformedKind,
        excerpt: String,
    },

    /// Upstream answered with JSON whose status field signals failure.
    #[error("{0}")]
    UpstreamRejected(String),

    /// Upstream could not be reached at all.
    #[error("{stage} API unreachable: {reason}")]
    TransportFailure { stage: Stage, reason: String },
}
