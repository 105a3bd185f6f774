use thiserror::Error;

/// Failure taxonomy for the monitor pipeline.
///
/// Steps 1–2 of a cycle abort on the first four variants; store and
/// dispatch failures are best-effort and surface as booleans at the call
/// site, with these variants used only for reporting.
#[derive(Debug, Error)]
pub enum Error {
    #[error("market data unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("classifier unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),

    #[error("store write failed: {0}")]
    StoreWriteFailed(String),

    #[error("alert dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
