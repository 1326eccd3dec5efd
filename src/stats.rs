use chrono::DateTime;
use chrono::FixedOffset;
use prettytable::Cell;
use prettytable::Row;
use prettytable::Table;
use prettytable::row;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use std::fmt;

use crate::error::PingError;

/// One ICMP packet reply extracted from a single line of ping output.
///
/// Which fields are present depends on the dialect that produced the line,
/// a field the dialect does not report stays `None` and is skipped during
/// serialization. A "no answer yet" line carries only `timestamp` and
/// `icmp_seq`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IcmpReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp_seq: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    /// Round trip time in milliseconds, `time<1ms` is reported as 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    pub duplicate: bool,
}

/// Normalized ping statistics.
///
/// Produced fresh by every parse call. A field the transcript did not
/// report is `None`, derived metrics never panic and never produce
/// NaN/infinity, they report `None` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PingStats {
    pub destination: Option<String>,
    pub packet_transmit: Option<u64>,
    pub packet_receive: Option<u64>,
    /// Minimum round trip time in milliseconds.
    pub rtt_min: Option<f64>,
    /// Average round trip time in milliseconds.
    pub rtt_avg: Option<f64>,
    /// Maximum round trip time in milliseconds.
    pub rtt_max: Option<f64>,
    /// Standard deviation of the round trip time, absent on dialects that
    /// do not report it (Windows, musl).
    pub rtt_mdev: Option<f64>,
    pub duplicates: Option<u64>,
    pub icmp_replies: Vec<IcmpReply>,
}

impl PingStats {
    /// Number of lost packets, `None` if either packet count is absent.
    pub fn packet_loss_count(&self) -> Option<i64> {
        match (self.packet_transmit, self.packet_receive) {
            (Some(transmit), Some(receive)) => Some(transmit as i64 - receive as i64),
            _ => None,
        }
    }

    /// Percentage of lost packets, `None` when zero packets were
    /// transmitted or the counts are absent.
    pub fn packet_loss_rate(&self) -> Option<f64> {
        let loss_count = self.packet_loss_count()?;
        match self.packet_transmit {
            Some(transmit) if transmit > 0 => Some(loss_count as f64 / transmit as f64 * 100.0),
            _ => None,
        }
    }

    /// Number of duplicated packets, `None` on dialects without duplicate
    /// reporting (Windows).
    pub fn packet_duplicate_count(&self) -> Option<u64> {
        self.duplicates
    }

    /// Percentage of duplicated packets, `None` when zero packets were
    /// received or the duplicate count is absent.
    pub fn packet_duplicate_rate(&self) -> Option<f64> {
        let duplicates = self.duplicates?;
        match self.packet_receive {
            Some(receive) if receive > 0 => Some(duplicates as f64 / receive as f64 * 100.0),
            _ => None,
        }
    }

    /// Returns true when nothing was parsed: every field and derived
    /// metric absent and no ICMP replies.
    pub fn is_empty(&self) -> bool {
        self.destination.is_none()
            && self.packet_transmit.is_none()
            && self.packet_receive.is_none()
            && self.packet_loss_count().is_none()
            && self.packet_loss_rate().is_none()
            && self.packet_duplicate_count().is_none()
            && self.packet_duplicate_rate().is_none()
            && self.rtt_min.is_none()
            && self.rtt_avg.is_none()
            && self.rtt_max.is_none()
            && self.rtt_mdev.is_none()
            && self.icmp_replies.is_empty()
    }

    /// Statistics as an ordered key/value map with a fixed key set, absent
    /// values map to JSON null.
    pub fn as_dict(&self, include_icmp_replies: bool) -> Result<Map<String, Value>, PingError> {
        let mut dict = Map::new();
        dict.insert("destination".to_string(), Value::from(self.destination.clone()));
        dict.insert("packet_transmit".to_string(), Value::from(self.packet_transmit));
        dict.insert("packet_receive".to_string(), Value::from(self.packet_receive));
        dict.insert("packet_loss_count".to_string(), Value::from(self.packet_loss_count()));
        dict.insert("packet_loss_rate".to_string(), Value::from(self.packet_loss_rate()));
        dict.insert("rtt_min".to_string(), Value::from(self.rtt_min));
        dict.insert("rtt_avg".to_string(), Value::from(self.rtt_avg));
        dict.insert("rtt_max".to_string(), Value::from(self.rtt_max));
        dict.insert("rtt_mdev".to_string(), Value::from(self.rtt_mdev));
        dict.insert(
            "packet_duplicate_count".to_string(),
            Value::from(self.packet_duplicate_count()),
        );
        dict.insert(
            "packet_duplicate_rate".to_string(),
            Value::from(self.packet_duplicate_rate()),
        );
        if include_icmp_replies {
            dict.insert("icmp_replies".to_string(), serde_json::to_value(&self.icmp_replies)?);
        }
        Ok(dict)
    }
}

fn fmt_opt<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => String::from("-"),
    }
}

impl fmt::Display for PingStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("Ping Statistics").style_spec("c").with_hspan(2),
        ]));
        table.add_row(row![c -> "destination", c -> fmt_opt(&self.destination)]);
        table.add_row(row![c -> "packet transmit", c -> fmt_opt(&self.packet_transmit)]);
        table.add_row(row![c -> "packet receive", c -> fmt_opt(&self.packet_receive)]);
        table.add_row(row![c -> "packet loss count", c -> fmt_opt(&self.packet_loss_count())]);
        table.add_row(row![c -> "packet loss rate", c -> fmt_opt(&self.packet_loss_rate())]);
        table.add_row(row![c -> "rtt min", c -> fmt_opt(&self.rtt_min)]);
        table.add_row(row![c -> "rtt avg", c -> fmt_opt(&self.rtt_avg)]);
        table.add_row(row![c -> "rtt max", c -> fmt_opt(&self.rtt_max)]);
        table.add_row(row![c -> "rtt mdev", c -> fmt_opt(&self.rtt_mdev)]);
        table.add_row(row![c -> "packet duplicate count", c -> fmt_opt(&self.packet_duplicate_count())]);
        table.add_row(row![c -> "packet duplicate rate", c -> fmt_opt(&self.packet_duplicate_rate())]);
        write!(f, "{}", table)
    }
}
