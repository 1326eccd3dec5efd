use clap::Parser;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use std::fs;
use std::io::IsTerminal;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use std::sync::mpsc::channel;
use std::time::Duration;
use threadpool::ThreadPool;
use tracing::debug;
use tracing::error;

use pingstats::PingError;
use pingstats::PingLogger;
use pingstats::PingParser;
use pingstats::PingStats;
use pingstats::PingTransmitter;

const DEFAULT_COUNT: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TimestampFormat {
    /// No timestamps.
    None,
    /// Unix epoch timestamps with fractional seconds.
    Epoch,
    /// ISO formatted timestamps.
    Datetime,
}

/// Parse ping command output to JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Destinations to send ping, or files to parse. '-' for parse the
    /// standard input
    destination_or_file: Vec<String>,

    /// Number of worker threads for when multiple destinations/files
    /// specified, defaults to two times the number of cores
    #[arg(long)]
    max_workers: Option<usize>,

    /// JSON output will be pretty-printed with the indent level
    #[arg(long, default_value_t = 4)]
    indent: usize,

    /// Print results for each ICMP packet reply
    #[arg(long, alias = "icmp-replies")]
    icmp_reply: bool,

    /// Add timestamps to ping replies (Linux ping only)
    #[arg(long, value_enum, default_value = "none")]
    timestamp: TimestampFormat,

    /// Stop after sending the count, see also ping(8) [-c count]
    #[arg(short, long)]
    count: Option<u64>,

    /// Timeout in seconds before ping exits, see also ping(8) [-w deadline]
    #[arg(short = 'w', long)]
    deadline: Option<u64>,

    /// Time in milliseconds to wait for a response per packet
    #[arg(long)]
    timeout: Option<u64>,

    /// Network interface
    #[arg(short = 'I', long)]
    interface: Option<String>,

    /// Print debug messages
    #[arg(long, conflicts_with = "quiet")]
    debug: bool,

    /// Suppress execution log messages
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone)]
struct PingParams {
    interface: Option<String>,
    count: Option<u64>,
    deadline: Option<u64>,
    timeout: Option<u64>,
    icmp_reply: bool,
    timestamp: TimestampFormat,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let logger = if args.debug {
        PingLogger::Debug
    } else if args.quiet {
        PingLogger::None
    } else {
        PingLogger::Info
    };
    if let Err(e) = logger.init() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(failed) => {
            if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<bool, PingError> {
    let params = PingParams {
        interface: args.interface.clone(),
        count: get_count(args),
        deadline: args.deadline,
        timeout: args.timeout,
        icmp_reply: args.icmp_reply,
        timestamp: args.timestamp,
    };

    if args.destination_or_file.is_empty() && std::io::stdin().is_terminal() {
        return Err(PingError::EmptyDestination);
    }

    let use_stdin =
        args.destination_or_file.is_empty() || args.destination_or_file.iter().any(|d| d == "-");
    if use_stdin {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        let output = parse_text(&text, &params)?;
        println!("{}", dumps(&Value::Object(output), args.indent)?);
        return Ok(false);
    }

    let max_workers = match args.max_workers {
        Some(max_workers) => max_workers,
        None => num_cpus::get() * 2,
    };
    debug!(
        "max_workers={}, count={:?}, deadline={:?}, timeout={:?}",
        max_workers, params.count, params.deadline, params.timeout
    );

    let pool = ThreadPool::new(max_workers);
    let (tx, rx) = channel();
    for dest_or_file in &args.destination_or_file {
        let tx = tx.clone();
        let dest_or_file = dest_or_file.clone();
        let params = params.clone();
        pool.execute(move || {
            let ret = parse_ping(&dest_or_file, &params);
            // the receiver only hangs up when the whole run is abandoned
            let _ = tx.send((dest_or_file, ret));
        });
    }
    drop(tx);

    let mut output = Map::new();
    let mut failed = false;
    for (dest_or_file, ret) in rx {
        match ret {
            Ok(value) => {
                output.insert(dest_or_file, value);
            }
            Err(e) => {
                error!("{}: {}", dest_or_file, e);
                failed = true;
            }
        }
    }
    println!("{}", dumps(&Value::Object(output), args.indent)?);
    Ok(failed)
}

/// Keep a bare invocation finite: default the count when neither a count
/// nor a deadline is requested.
fn get_count(args: &Args) -> Option<u64> {
    if args.count.is_none() && args.deadline.is_none() {
        Some(DEFAULT_COUNT)
    } else {
        args.count
    }
}

fn parse_ping(dest_or_file: &str, params: &PingParams) -> Result<Value, PingError> {
    let text = if Path::new(dest_or_file).is_file() {
        fs::read_to_string(dest_or_file)?
    } else {
        let mut transmitter = PingTransmitter::new(dest_or_file)?;
        transmitter.interface = params.interface.clone();
        transmitter.count = params.count;
        transmitter.deadline = params.deadline.map(Duration::from_secs);
        transmitter.timeout = params.timeout.map(Duration::from_millis);
        transmitter.is_quiet = !params.icmp_reply;
        transmitter.timestamp = params.timestamp != TimestampFormat::None;

        let result = transmitter.ping()?;
        if result.returncode != Some(0) {
            if let Some(stderr) = &result.stderr {
                if !stderr.is_empty() {
                    error!("{}", stderr);
                }
            }
        }
        result.stdout.unwrap_or_default()
    };

    parse_text(&text, params).map(Value::Object)
}

fn parse_text(text: &str, params: &PingParams) -> Result<Map<String, Value>, PingError> {
    let mut parser = PingParser::new();
    let stats = parser.parse(text)?;
    debug!("parsed with the {} parser", parser.parser_name());

    let mut output = stats.as_dict(false)?;
    if params.icmp_reply {
        output.insert(
            String::from("icmp_replies"),
            replies_to_value(&stats, params.timestamp)?,
        );
    }
    Ok(output)
}

fn replies_to_value(stats: &PingStats, format: TimestampFormat) -> Result<Value, PingError> {
    let mut values = Vec::new();
    for reply in &stats.icmp_replies {
        let mut value = serde_json::to_value(reply)?;
        if format == TimestampFormat::Epoch {
            if let (Value::Object(object), Some(timestamp)) = (&mut value, reply.timestamp) {
                let epoch = timestamp.timestamp() as f64
                    + f64::from(timestamp.timestamp_subsec_micros()) / 1e6;
                object.insert(String::from("timestamp"), Value::from(epoch));
            }
        }
        values.push(value);
    }
    Ok(Value::Array(values))
}

fn dumps(value: &Value, indent: usize) -> Result<String, PingError> {
    if indent == 0 {
        return Ok(serde_json::to_string(value)?);
    }
    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dumps_indent() {
        let value = serde_json::json!({"a": 1});
        assert_eq!(dumps(&value, 0).unwrap(), "{\"a\":1}");
        assert_eq!(dumps(&value, 2).unwrap(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_parse_text_with_replies() {
        let params = PingParams {
            interface: None,
            count: None,
            deadline: None,
            timeout: None,
            icmp_reply: true,
            timestamp: TimestampFormat::Epoch,
        };
        let text = "\
PING 192.168.11.222 (192.168.11.222) 56(84) bytes of data.
[1596881133.081898] 64 bytes from 192.168.11.222: icmp_seq=2 ttl=64 time=0.262 ms

--- 192.168.11.222 ping statistics ---
1 packets transmitted, 1 received, 0% packet loss, time 154ms
";
        let output = parse_text(text, &params).unwrap();
        let replies = output["icmp_replies"].as_array().unwrap();
        assert_eq!(replies.len(), 1);
        let epoch = replies[0]["timestamp"].as_f64().unwrap();
        assert!((epoch - 1596881133.081898).abs() < 1e-6);
    }

    #[test]
    fn test_get_count_default() {
        let args = Args::parse_from(["pingstats", "localhost"]);
        assert_eq!(get_count(&args), Some(DEFAULT_COUNT));

        let args = Args::parse_from(["pingstats", "-w", "10", "localhost"]);
        assert_eq!(get_count(&args), None);

        let args = Args::parse_from(["pingstats", "-c", "3", "localhost"]);
        assert_eq!(get_count(&args), Some(3));
    }
}
