use thiserror::Error;

#[derive(Error, Debug)]
pub enum PingError {
    /* PARSE ERROR */
    #[error("ping statistics not found")]
    StatsHeadlineNotFound,
    #[error("ping statistics is empty")]
    EmptyStatistics,
    #[error("statistics line mismatch: {line}")]
    StatsLineMismatch { line: String },
    #[error("rtt line mismatch: {line}")]
    RttLineMismatch { line: String },
    #[error("parse int error")]
    ParseIntError(#[from] std::num::ParseIntError),
    #[error("parse float error")]
    ParseFloatError(#[from] std::num::ParseFloatError),
    #[error("regex error")]
    RegexError(#[from] regex::Error),

    /* TRANSMITTER ERROR */
    #[error("empty destination")]
    EmptyDestination,
    #[error("count must be greater than zero")]
    InvalidCount,
    #[error("deadline must be greater than zero")]
    InvalidDeadline,
    #[error("timeout must be greater than zero")]
    InvalidTimeout,
    #[error("interface required to ping to ipv6 link local address")]
    InterfaceRequired,

    /* OTHER ERROR */
    #[error("std io error")]
    IOError(#[from] std::io::Error),
    #[error("serde json error")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("set subscriber error")]
    SetSubscriberError(#[from] tracing::subscriber::SetGlobalDefaultError),
}
