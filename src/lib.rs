//! Parse ping command output into normalized statistics.
//!
//! The parser understands the output dialects of iputils ping (glibc
//! Linux), busybox ping (musl/Alpine Linux), BSD derived ping (macOS) and
//! Windows ping, tries them in a fixed order and returns the first match
//! as a [`PingStats`] record with per-reply details and derived metrics.
//! The [`PingTransmitter`] runs the OS built-in ping command with an
//! OS-appropriate option spelling so its captured output can be fed
//! straight back into the parser.
//!
//! ```rust
//! use pingstats::PingParser;
//!
//! let transcript = "\
//! PING google.com (216.58.196.238) 56(84) bytes of data.
//!
//! --- google.com ping statistics ---
//! 60 packets transmitted, 60 received, 0% packet loss, time 59153ms
//! rtt min/avg/max/mdev = 61.425/99.731/212.597/27.566 ms
//! ";
//! let mut parser = PingParser::new();
//! let stats = parser.parse(transcript).unwrap();
//! assert_eq!(stats.destination.as_deref(), Some("google.com"));
//! assert_eq!(stats.packet_receive, Some(60));
//! assert_eq!(stats.packet_loss_rate(), Some(0.0));
//! ```
use tracing::Level;

mod cmd;
mod error;
mod parse;
mod stats;
mod transmitter;

pub use crate::cmd::DEFAULT_DEADLINE_SEC;
pub use crate::cmd::HostOs;
pub use crate::cmd::PingCmdMaker;
pub use crate::cmd::PingCommand;
pub use crate::error::PingError;
pub use crate::parse::PingParser;
pub use crate::parse::dialect::PingDialect;
pub use crate::stats::IcmpReply;
pub use crate::stats::PingStats;
pub use crate::transmitter::PingResult;
pub use crate::transmitter::PingTransmitter;

/// Diagnostics level of the crate. `None` keeps the crate silent, the
/// other values install a global tracing subscriber at that level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingLogger {
    None,
    Debug,
    Info,
    Warn,
}

impl PingLogger {
    pub fn init(self) -> Result<(), PingError> {
        let level = match self {
            PingLogger::None => return Ok(()),
            PingLogger::Debug => Level::DEBUG,
            PingLogger::Info => Level::INFO,
            PingLogger::Warn => Level::WARN,
        };
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(())
    }
}
