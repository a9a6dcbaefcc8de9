use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("upstream request timed out")]
    UpstreamTimeout,
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),
    #[error("malformed upstream response: {0}")]
    UpstreamMalformed(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::UpstreamTimeout
        } else {
            Self::UpstreamUnreachable(value.to_string())
        }
    }
}

impl From<simd_json::Error> for FeedError {
    fn from(value: simd_json::Error) -> Self {
        Self::UpstreamMalformed(value.to_string())
    }
}
