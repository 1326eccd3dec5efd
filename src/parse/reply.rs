use chrono::DateTime;
use chrono::FixedOffset;
use chrono::TimeZone;
use chrono::Utc;
use regex::Regex;

use crate::error::PingError;
use crate::parse::dialect::PingDialect;
use crate::stats::IcmpReply;

// Shared sub-patterns, the dialect reply patterns are composed from these.
pub(crate) const DEST_PATTERN: &str = r"(?P<destination>[a-zA-Z0-9:\-\.\(\)% ]+)";
const BYTES_PATTERN: &str = r"\s*(?P<bytes>[0-9]+) bytes";
const ICMP_SEQ_PATTERN: &str = r"\s*icmp_seq=(?P<icmp_seq>\d+)";
const TTL_PATTERN: &str = r"\s*ttl=(?P<ttl>\d+)";
const TIME_PATTERN: &str = r"\s*time[=<](?P<time>[0-9\.]+)";
const TIMESTAMP_PATTERN: &str = r"(?P<timestamp>\[[0-9\.]+\])";
const DUPLICATE_PATTERN: &str = r".+ \(DUP!\)$";

/// Per-dialect reply-line pattern set, compiled fresh for every parse
/// call. The reply and no-answer patterns are case-insensitive, the
/// duplicate-marker pattern is not.
pub(crate) struct ReplyGrammar {
    reply: Regex,
    /// Only the Linux dialect emits "no answer yet" lines (ping -O).
    no_answer: Option<Regex>,
    duplicate: Regex,
}

impl ReplyGrammar {
    pub(crate) fn compile(dialect: PingDialect) -> Result<ReplyGrammar, PingError> {
        let reply_pattern = match dialect {
            PingDialect::Linux => format!(
                "(?i){TIMESTAMP_PATTERN}?{BYTES_PATTERN}\\s+from {DEST_PATTERN}:{ICMP_SEQ_PATTERN}{TTL_PATTERN}{TIME_PATTERN}"
            ),
            PingDialect::Windows => format!(
                "(?i) from {DEST_PATTERN}:\\s*bytes=(?P<bytes>[0-9]+){TIME_PATTERN}ms{TTL_PATTERN}"
            ),
            PingDialect::MacOs => format!(
                "(?i){BYTES_PATTERN}\\s+from {DEST_PATTERN}:{ICMP_SEQ_PATTERN}{TTL_PATTERN}{TIME_PATTERN}"
            ),
            PingDialect::AlpineLinux => format!(
                "(?i){BYTES_PATTERN}\\s+from {DEST_PATTERN}: seq=(?P<icmp_seq>\\d+) {TTL_PATTERN}{TIME_PATTERN}"
            ),
        };
        let no_answer = match dialect {
            PingDialect::Linux => Some(Regex::new(&format!(
                "(?i)(?P<timestamp>\\[[0-9\\.]+\\]) no answer yet for{ICMP_SEQ_PATTERN}"
            ))?),
            _ => None,
        };
        Ok(ReplyGrammar {
            reply: Regex::new(&reply_pattern)?,
            no_answer,
            duplicate: Regex::new(DUPLICATE_PATTERN)?,
        })
    }

    /// Scan every line and collect the replies it recognizes. Lines that
    /// match neither the reply nor the no-answer pattern contribute
    /// nothing.
    pub(crate) fn parse_lines(
        &self,
        lines: &[&str],
        timezone: Option<FixedOffset>,
    ) -> Result<Vec<IcmpReply>, PingError> {
        let mut replies = Vec::new();
        for line in lines {
            let caps = match self.reply.captures(line) {
                Some(caps) => caps,
                None => match &self.no_answer {
                    Some(no_answer) => match no_answer.captures(line) {
                        Some(caps) => caps,
                        None => continue,
                    },
                    None => continue,
                },
            };

            let mut reply = IcmpReply::default();
            if let Some(m) = caps.name("destination") {
                reply.destination = Some(m.as_str().to_string());
            }
            if let Some(m) = caps.name("bytes") {
                reply.bytes = Some(m.as_str().parse()?);
            }
            if let Some(m) = caps.name("timestamp") {
                reply.timestamp = timestamp_to_datetime(m.as_str(), timezone);
            }
            if let Some(m) = caps.name("icmp_seq") {
                reply.icmp_seq = Some(m.as_str().parse()?);
            }
            if let Some(m) = caps.name("ttl") {
                reply.ttl = Some(m.as_str().parse()?);
            }
            if let Some(m) = caps.name("time") {
                reply.time = Some(m.as_str().parse()?);
            }
            reply.duplicate = self.duplicate.is_match(line);
            replies.push(reply);
        }
        Ok(replies)
    }
}

/// Convert a bracketed unix epoch capture (seconds with an optional
/// fraction) into an instant in the given timezone, UTC when none is
/// supplied. A malformed capture leaves the timestamp absent.
fn timestamp_to_datetime(
    raw: &str,
    timezone: Option<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    let epoch = raw.trim_start_matches('[').trim_end_matches(']');
    let (secs, frac) = match epoch.split_once('.') {
        Some((secs, frac)) => (secs, frac),
        None => (epoch, ""),
    };
    let secs: i64 = secs.parse().ok()?;
    let nanos: u32 = if frac.is_empty() {
        0
    } else {
        let frac = &frac[..frac.len().min(9)];
        let scale = 10u32.pow(9 - frac.len() as u32);
        frac.parse::<u32>().ok()?.checked_mul(scale)?
    };
    match timezone {
        Some(tz) => tz.timestamp_opt(secs, nanos).single(),
        None => Utc
            .timestamp_opt(secs, nanos)
            .single()
            .map(|dt| dt.fixed_offset()),
    }
}
