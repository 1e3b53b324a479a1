use thiserror::Error;

/// Failure modes of a single quote lookup. The `QuoteSource` impl folds every one of them into
/// the no-data snapshot; only `TwseQuoteClient::try_fetch` hands them out.
#[derive(Debug, Error)]
pub enum QuoteFetchError {
    #[error("quote http client could not be built: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("quote request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("quote provider returned status {status}")]
    Status { status: u16 },
    #[error("quote response body could not be read: {0}")]
    Body(#[source] reqwest::Error),
    #[error("quote response body is not valid provider json: {0}")]
    Decode(#[from] serde_json::Error),
}

impl QuoteFetchError {
    /// Short stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClientBuild(_) => "client_build",
            Self::Transport(error) if error.is_timeout() => "timeout",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Body(_) => "body",
            Self::Decode(_) => "decode",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::QuoteFetchError;

    #[test]
    fn status_error_reports_code_and_kind() {
        let error = QuoteFetchError::Status { status: 503 };
        assert_eq!(error.to_string(), "quote provider returned status 503");
        assert_eq!(error.kind(), "status");
    }

    #[test]
    fn decode_error_converts_from_serde() {
        let source = serde_json::from_str::<serde_json::Value>("{not json")
            .expect_err("input is not json");
        let error = QuoteFetchError::from(source);
        assert_eq!(error.kind(), "decode");
        assert!(error.to_string().starts_with("quote response body is not valid provider json"));
    }
}
