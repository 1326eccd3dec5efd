use regex::Regex;

use crate::error::PingError;
use crate::parse::dialect::PingDialect;
use crate::parse::reply::DEST_PATTERN;

/// Aggregate round trip times extracted from the trailer, all absent when
/// the transcript reports none.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RttValues {
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
    pub mdev: Option<f64>,
}

pub(crate) fn headline_regex(dialect: PingDialect) -> Result<Regex, PingError> {
    let pattern = match dialect {
        PingDialect::Windows => format!("^Ping statistics for {DEST_PATTERN}"),
        _ => format!("--- {DEST_PATTERN} ping statistics ---"),
    };
    Ok(Regex::new(&pattern)?)
}

/// Extract transmit/receive counts from the first trailer body line. A
/// mismatch after a matched headline is fatal for this dialect attempt.
pub(crate) fn parse_packet_counts(
    dialect: PingDialect,
    line: &str,
) -> Result<(u64, u64), PingError> {
    let pattern = match dialect {
        PingDialect::Linux => r"^\s*(?P<transmit>\d+)\s+packets transmitted,\s+(?P<receive>\d+)\s+received,",
        PingDialect::MacOs | PingDialect::AlpineLinux => {
            r"^\s*(?P<transmit>\d+)\s+packets transmitted,\s+(?P<receive>\d+)\s+packets received,"
        }
        PingDialect::Windows => r"^\s*Packets: Sent = (?P<transmit>\d+), Received = (?P<receive>\d+)",
    };
    let re = Regex::new(pattern)?;
    let caps = match re.captures(line) {
        Some(caps) => caps,
        None => {
            return Err(PingError::StatsLineMismatch {
                line: line.to_string(),
            });
        }
    };
    let transmit = caps.name("transmit").map_or("", |m| m.as_str()).parse()?;
    let receive = caps.name("receive").map_or("", |m| m.as_str()).parse()?;
    Ok((transmit, receive))
}

/// Extract the duplicate count embedded in the packet-count line.
/// Dialects that report duplicates default to 0 when the token is absent,
/// Windows has no duplicate concept and always reports `None`.
pub(crate) fn parse_duplicates(
    dialect: PingDialect,
    line: &str,
) -> Result<Option<u64>, PingError> {
    let pattern = match dialect {
        PingDialect::Windows => return Ok(None),
        // iputils and BSD ping print a literal plus sign
        PingDialect::Linux | PingDialect::MacOs => r"\+?(?P<duplicates>\d+) duplicates,",
        PingDialect::AlpineLinux => r"(?P<duplicates>\d+) duplicates,",
    };
    let re = Regex::new(pattern)?;
    match re.captures(line) {
        Some(caps) => Ok(Some(
            caps.name("duplicates").map_or("", |m| m.as_str()).parse()?,
        )),
        None => Ok(Some(0)),
    }
}

/// Extract the aggregate RTT line at the dialect's body offset. A missing
/// or blank line yields absent values. A Linux line that fails the grammar
/// is accepted only when it is the `pipe N` diagnostic, anything else is a
/// hard error, while the other dialects report a mismatch the dispatcher
/// treats as a wrong-dialect signal.
pub(crate) fn parse_rtt(dialect: PingDialect, body: &[&str]) -> Result<RttValues, PingError> {
    // Windows prints an "Approximate round trip times" stanza line first.
    let offset = match dialect {
        PingDialect::Windows => 2,
        _ => 1,
    };
    let rtt_line = match body.get(offset) {
        Some(line) => line.trim(),
        None => return Ok(RttValues::default()),
    };
    if rtt_line.is_empty() {
        return Ok(RttValues::default());
    }

    match dialect {
        PingDialect::Linux => {
            let re = Regex::new(
                r"^rtt min/avg/max/mdev = (?P<min>[0-9\.]+)/(?P<avg>[0-9\.]+)/(?P<max>[0-9\.]+)/(?P<mdev>[0-9\.]+) ms",
            )?;
            match re.captures(rtt_line) {
                Some(caps) => Ok(RttValues {
                    min: Some(caps.name("min").map_or("", |m| m.as_str()).parse()?),
                    avg: Some(caps.name("avg").map_or("", |m| m.as_str()).parse()?),
                    max: Some(caps.name("max").map_or("", |m| m.as_str()).parse()?),
                    mdev: Some(caps.name("mdev").map_or("", |m| m.as_str()).parse()?),
                }),
                None => {
                    let pipe = Regex::new(r"\s*pipe \d+")?;
                    if pipe.is_match(rtt_line) {
                        Ok(RttValues::default())
                    } else {
                        Err(PingError::RttLineMismatch {
                            line: rtt_line.to_string(),
                        })
                    }
                }
            }
        }
        PingDialect::MacOs => {
            let re = Regex::new(
                r"^round-trip min/avg/max/stddev = (?P<min>[0-9\.]+)/(?P<avg>[0-9\.]+)/(?P<max>[0-9\.]+)/(?P<mdev>[0-9\.]+) ms",
            )?;
            match re.captures(rtt_line) {
                Some(caps) => Ok(RttValues {
                    min: Some(caps.name("min").map_or("", |m| m.as_str()).parse()?),
                    avg: Some(caps.name("avg").map_or("", |m| m.as_str()).parse()?),
                    max: Some(caps.name("max").map_or("", |m| m.as_str()).parse()?),
                    mdev: Some(caps.name("mdev").map_or("", |m| m.as_str()).parse()?),
                }),
                None => Err(PingError::StatsLineMismatch {
                    line: rtt_line.to_string(),
                }),
            }
        }
        PingDialect::AlpineLinux => {
            let re = Regex::new(
                r"^round-trip min/avg/max = (?P<min>[0-9\.]+)/(?P<avg>[0-9\.]+)/(?P<max>[0-9\.]+) ms",
            )?;
            match re.captures(rtt_line) {
                Some(caps) => Ok(RttValues {
                    min: Some(caps.name("min").map_or("", |m| m.as_str()).parse()?),
                    avg: Some(caps.name("avg").map_or("", |m| m.as_str()).parse()?),
                    max: Some(caps.name("max").map_or("", |m| m.as_str()).parse()?),
                    mdev: None,
                }),
                None => Err(PingError::StatsLineMismatch {
                    line: rtt_line.to_string(),
                }),
            }
        }
        PingDialect::Windows => {
            let re = Regex::new(
                r"^Minimum = (?P<min>\d+)ms, Maximum = (?P<max>\d+)ms, Average = (?P<avg>\d+)ms",
            )?;
            match re.captures(rtt_line) {
                Some(caps) => Ok(RttValues {
                    min: Some(caps.name("min").map_or("", |m| m.as_str()).parse()?),
                    avg: Some(caps.name("avg").map_or("", |m| m.as_str()).parse()?),
                    max: Some(caps.name("max").map_or("", |m| m.as_str()).parse()?),
                    mdev: None,
                }),
                None => Err(PingError::StatsLineMismatch {
                    line: rtt_line.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headline() {
        let re = headline_regex(PingDialect::Linux).unwrap();
        let caps = re.captures("--- google.com ping statistics ---").unwrap();
        assert_eq!(caps.name("destination").unwrap().as_str(), "google.com");

        let re = headline_regex(PingDialect::Windows).unwrap();
        let caps = re.captures("Ping statistics for 216.58.196.238:").unwrap();
        assert_eq!(caps.name("destination").unwrap().as_str(), "216.58.196.238:");
        assert!(!re.is_match("--- google.com ping statistics ---"));
    }

    #[test]
    fn test_packet_counts() {
        let (transmit, receive) = parse_packet_counts(
            PingDialect::Linux,
            "60 packets transmitted, 60 received, 0% packet loss, time 59153ms",
        )
        .unwrap();
        assert_eq!((transmit, receive), (60, 60));

        let (transmit, receive) = parse_packet_counts(
            PingDialect::MacOs,
            "5 packets transmitted, 5 packets received, 0.0% packet loss",
        )
        .unwrap();
        assert_eq!((transmit, receive), (5, 5));

        let (transmit, receive) = parse_packet_counts(
            PingDialect::Windows,
            "    Packets: Sent = 10, Received = 9, Lost = 1 (10% los",
        )
        .unwrap();
        assert_eq!((transmit, receive), (10, 9));
    }

    #[test]
    fn test_packet_counts_mismatch() {
        // BSD wording does not fit the Linux grammar
        let ret = parse_packet_counts(
            PingDialect::Linux,
            "5 packets transmitted, 5 packets received, 0.0% packet loss",
        );
        assert!(matches!(ret, Err(PingError::StatsLineMismatch { .. })));
    }

    #[test]
    fn test_duplicates() {
        let line = "1688 packets transmitted, 1553 received, +1 duplicates, 7% packet loss, time 2987ms";
        assert_eq!(parse_duplicates(PingDialect::Linux, line).unwrap(), Some(1));

        let line = "10 packets transmitted, 9 packets received, 2 duplicates, 10% packet loss";
        assert_eq!(
            parse_duplicates(PingDialect::AlpineLinux, line).unwrap(),
            Some(2)
        );

        // no duplicate token defaults to zero, not absent
        let line = "5 packets transmitted, 0 received, +5 errors, 100% packet loss, time 4003ms";
        assert_eq!(parse_duplicates(PingDialect::Linux, line).unwrap(), Some(0));

        // absent concept on Windows
        let line = "    Packets: Sent = 10, Received = 10, Lost = 0 (0% loss),";
        assert_eq!(parse_duplicates(PingDialect::Windows, line).unwrap(), None);
    }

    #[test]
    fn test_rtt_linux() {
        let body = [
            "60 packets transmitted, 60 received, 0% packet loss, time 59153ms",
            "rtt min/avg/max/mdev = 61.425/99.731/212.597/27.566 ms",
        ];
        let rtt = parse_rtt(PingDialect::Linux, &body).unwrap();
        assert_eq!(rtt.min, Some(61.425));
        assert_eq!(rtt.avg, Some(99.731));
        assert_eq!(rtt.max, Some(212.597));
        assert_eq!(rtt.mdev, Some(27.566));
    }

    #[test]
    fn test_rtt_linux_pipe_diagnostic() {
        let body = [
            "5 packets transmitted, 0 received, +5 errors, 100% packet loss, time 811ms",
            "pipe 5",
        ];
        let rtt = parse_rtt(PingDialect::Linux, &body).unwrap();
        assert_eq!(rtt, RttValues::default());
    }

    #[test]
    fn test_rtt_linux_mismatch_is_fatal() {
        let body = [
            "5 packets transmitted, 5 received, 0% packet loss, time 4003ms",
            "round trip garbage",
        ];
        let ret = parse_rtt(PingDialect::Linux, &body);
        assert!(matches!(ret, Err(PingError::RttLineMismatch { .. })));
    }

    #[test]
    fn test_rtt_missing_or_blank() {
        let body = ["5 packets transmitted, 0 received, 100% packet loss, time 4009ms"];
        assert_eq!(
            parse_rtt(PingDialect::Linux, &body).unwrap(),
            RttValues::default()
        );

        let body = [
            "5 packets transmitted, 0 received, 100% packet loss, time 4009ms",
            "",
        ];
        assert_eq!(
            parse_rtt(PingDialect::Linux, &body).unwrap(),
            RttValues::default()
        );
    }

    #[test]
    fn test_rtt_macos() {
        let body = [
            "5 packets transmitted, 5 packets received, 0.0% packet loss",
            "round-trip min/avg/max/stddev = 20.482/31.927/46.093/8.292 ms",
        ];
        let rtt = parse_rtt(PingDialect::MacOs, &body).unwrap();
        assert_eq!(rtt.min, Some(20.482));
        assert_eq!(rtt.mdev, Some(8.292));

        // the musl wording is a wrong-dialect signal here
        let body = [
            "5 packets transmitted, 5 packets received, 0% packet loss",
            "round-trip min/avg/max = 0.638/0.683/0.746 ms",
        ];
        let ret = parse_rtt(PingDialect::MacOs, &body);
        assert!(matches!(ret, Err(PingError::StatsLineMismatch { .. })));
    }

    #[test]
    fn test_rtt_alpine() {
        let body = [
            "5 packets transmitted, 5 packets received, 0% packet loss",
            "round-trip min/avg/max = 0.638/0.683/0.746 ms",
        ];
        let rtt = parse_rtt(PingDialect::AlpineLinux, &body).unwrap();
        assert_eq!(rtt.min, Some(0.638));
        assert_eq!(rtt.avg, Some(0.683));
        assert_eq!(rtt.max, Some(0.746));
        assert_eq!(rtt.mdev, None);
    }

    #[test]
    fn test_rtt_windows_field_order() {
        let body = [
            "    Packets: Sent = 10, Received = 10, Lost = 0 (0% loss),",
            "Approximate round trip times in milli-seconds:",
            "    Minimum = 56ms, Maximum = 194ms, Average = 107ms",
        ];
        let rtt = parse_rtt(PingDialect::Windows, &body).unwrap();
        assert_eq!(rtt.min, Some(56.0));
        assert_eq!(rtt.avg, Some(107.0));
        assert_eq!(rtt.max, Some(194.0));
        assert_eq!(rtt.mdev, None);
    }
}
