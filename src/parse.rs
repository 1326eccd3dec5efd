use chrono::FixedOffset;
use tracing::debug;

use crate::error::PingError;
use crate::stats::PingStats;
use crate::transmitter::PingResult;

pub mod dialect;
pub(crate) mod reply;
pub(crate) mod trailer;

use dialect::PingDialect;

// Fixed trial order, the glibc Linux format is by far the most common.
const DIALECT_ORDER: [PingDialect; 4] = [
    PingDialect::Linux,
    PingDialect::Windows,
    PingDialect::MacOs,
    PingDialect::AlpineLinux,
];

/// Parser for ping command output.
///
/// Tries every known dialect in a fixed order and returns the first
/// successful parse. A headline miss or a statistics-line mismatch moves
/// on to the next dialect, an empty statistics body and a malformed Linux
/// RTT line surface to the caller. When no dialect matches at all the
/// result is an all-absent [`PingStats`], never an error.
///
/// ```rust
/// use pingstats::PingParser;
///
/// let transcript = "\
/// PING google.com (216.58.196.238) 56(84) bytes of data.
///
/// --- google.com ping statistics ---
/// 60 packets transmitted, 60 received, 0% packet loss, time 59153ms
/// rtt min/avg/max/mdev = 61.425/99.731/212.597/27.566 ms
/// ";
/// let mut parser = PingParser::new();
/// let stats = parser.parse(transcript).unwrap();
/// assert_eq!(stats.packet_transmit, Some(60));
/// assert_eq!(stats.packet_loss_rate(), Some(0.0));
/// assert_eq!(parser.parser_name(), "Linux");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PingParser {
    timezone: Option<FixedOffset>,
    dialect: Option<PingDialect>,
}

impl PingParser {
    pub fn new() -> PingParser {
        PingParser::default()
    }

    /// Timezone used to interpret bracketed reply timestamps, UTC when
    /// not set.
    pub fn with_timezone(timezone: FixedOffset) -> PingParser {
        PingParser {
            timezone: Some(timezone),
            dialect: None,
        }
    }

    /// The dialect the last `parse` call matched, for diagnostics.
    pub fn dialect(&self) -> Option<PingDialect> {
        self.dialect
    }

    /// Name of the dialect the last `parse` call matched, `"null"` when
    /// none did.
    pub fn parser_name(&self) -> &'static str {
        match self.dialect {
            Some(dialect) => dialect.name(),
            None => "null",
        }
    }

    /// Parse ping command output.
    pub fn parse(&mut self, ping_message: &str) -> Result<PingStats, PingError> {
        self.dialect = None;

        if ping_message.trim().is_empty() {
            debug!("ping message is empty");
            return Ok(PingStats::default());
        }

        let lines: Vec<&str> = ping_message.lines().collect();
        for dialect in DIALECT_ORDER {
            match dialect.parse(&lines, self.timezone) {
                Ok(stats) => {
                    self.dialect = Some(dialect);
                    return Ok(stats);
                }
                Err(PingError::StatsHeadlineNotFound) => continue,
                Err(PingError::StatsLineMismatch { line }) => {
                    debug!("dialect {} rejected line: {}", dialect.name(), line);
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(PingStats::default())
    }

    /// Parse the captured output of a ping process run, an absent stdout
    /// reads as empty input.
    pub fn parse_result(&mut self, ping_result: &PingResult) -> Result<PingStats, PingError> {
        let stdout = ping_result.stdout.as_deref().unwrap_or("");
        self.parse(stdout)
    }
}
