use chrono::FixedOffset;
use regex::Regex;
use tracing::debug;

use crate::error::PingError;
use crate::parse::reply::ReplyGrammar;
use crate::parse::trailer;
use crate::stats::PingStats;

/// The ping output dialects this crate understands. The set is closed,
/// every variant supplies its own reply and trailer grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingDialect {
    /// iputils ping as shipped by glibc based distributions.
    Linux,
    Windows,
    /// BSD derived ping, macOS wording.
    MacOs,
    /// busybox ping as shipped by musl based distributions.
    AlpineLinux,
}

impl PingDialect {
    pub fn name(self) -> &'static str {
        match self {
            PingDialect::Linux => "Linux",
            PingDialect::Windows => "Windows",
            PingDialect::MacOs => "macOS",
            PingDialect::AlpineLinux => "AlpineLinux",
        }
    }

    /// Run the full parse for this dialect: find the statistics headline,
    /// slice the trailer body, collect the ICMP replies from every line
    /// and extract the aggregate counts.
    ///
    /// `StatsHeadlineNotFound` is the recoverable try-the-next-dialect
    /// signal, `EmptyStatistics` is terminal.
    pub(crate) fn parse(
        self,
        lines: &[&str],
        timezone: Option<FixedOffset>,
    ) -> Result<PingStats, PingError> {
        debug!("parsing as {} ping result format", self.name());

        let grammar = ReplyGrammar::compile(self)?;
        let icmp_replies = grammar.parse_lines(lines, timezone)?;

        let headline = trailer::headline_regex(self)?;
        let headline_idx = match lines.iter().position(|line| headline.is_match(line)) {
            Some(idx) => idx,
            None => return Err(PingError::StatsHeadlineNotFound),
        };
        let body = &lines[headline_idx + 1..];
        if body.is_empty() {
            return Err(PingError::EmptyStatistics);
        }

        let destination = parse_destination(&headline, lines[headline_idx]);
        let packet_line = body[0];
        let (packet_transmit, packet_receive) = trailer::parse_packet_counts(self, packet_line)?;
        let duplicates = trailer::parse_duplicates(self, packet_line)?;
        let rtt = trailer::parse_rtt(self, body)?;

        Ok(PingStats {
            destination: Some(destination),
            packet_transmit: Some(packet_transmit),
            packet_receive: Some(packet_receive),
            rtt_min: rtt.min,
            rtt_avg: rtt.avg,
            rtt_max: rtt.max,
            rtt_mdev: rtt.mdev,
            duplicates,
            icmp_replies,
        })
    }
}

fn parse_destination(headline: &Regex, line: &str) -> String {
    match headline.captures(line) {
        Some(caps) => caps
            .name("destination")
            .map_or("unknown", |m| m.as_str())
            .trim_matches(':')
            .to_string(),
        None => String::from("unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_trailing_colon_stripped() {
        let headline = trailer::headline_regex(PingDialect::Windows).unwrap();
        let destination = parse_destination(&headline, "Ping statistics for 216.58.196.238:");
        assert_eq!(destination, "216.58.196.238");
    }

    #[test]
    fn test_destination_ipv6_zone_kept() {
        let headline = trailer::headline_regex(PingDialect::Linux).unwrap();
        let destination = parse_destination(&headline, "--- ff02::2%usb0 ping statistics ---");
        assert_eq!(destination, "ff02::2%usb0");
    }

    #[test]
    fn test_headline_not_found() {
        let lines = ["PING google.com (216.58.196.238) 56(84) bytes of data."];
        let ret = PingDialect::Linux.parse(&lines, None);
        assert!(matches!(ret, Err(PingError::StatsHeadlineNotFound)));
    }

    #[test]
    fn test_empty_statistics_body() {
        let lines = [
            "PING 192.168.0.1 (192.168.0.1) 56(84) bytes of data.",
            "--- 192.168.0.1 ping statistics ---",
        ];
        let ret = PingDialect::Linux.parse(&lines, None);
        assert!(matches!(ret, Err(PingError::EmptyStatistics)));
    }

    #[test]
    fn test_packet_line_mismatch_is_fatal_per_dialect() {
        // headline matches the Linux pattern but the body carries the BSD
        // wording
        let lines = [
            "--- google.com ping statistics ---",
            "5 packets transmitted, 5 packets received, 0.0% packet loss",
        ];
        let ret = PingDialect::Linux.parse(&lines, None);
        assert!(matches!(ret, Err(PingError::StatsLineMismatch { .. })));
    }
}
