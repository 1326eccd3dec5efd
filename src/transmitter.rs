use serde::Deserialize;
use serde::Serialize;
use std::net::Ipv6Addr;
use std::process::Command;
use std::time::Duration;
use tracing::debug;
use tracing::warn;

use crate::cmd::HostOs;
use crate::cmd::PingCmdMaker;
use crate::cmd::PingCommand;
use crate::error::PingError;

/// Captured result of a ping process run. Only `stdout` matters to the
/// parser, `stderr` and `returncode` are kept for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingResult {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub returncode: Option<i32>,
}

/// Sends ICMP packets by running the OS built-in ping command.
#[derive(Debug, Clone, Default)]
pub struct PingTransmitter {
    /// Hostname or IPv4/IPv6 address to send ICMP packets to.
    pub destination: String,
    pub count: Option<u64>,
    /// Timeout before ping exits, meaning may differ system to system.
    pub deadline: Option<Duration>,
    /// Time to wait for a response per packet, meaning may differ system
    /// to system.
    pub timeout: Option<Duration>,
    pub packet_size: Option<u64>,
    pub ttl: Option<u32>,
    /// Interface name or zone-id, required when the destination is an
    /// IPv6 link-local address.
    pub interface: Option<String>,
    pub is_quiet: bool,
    /// Linux only, add a timestamp to each reply.
    pub timestamp: bool,
    /// Windows only, automatically switch the console codepage.
    pub auto_codepage: bool,
    pub ping_option: Vec<String>,
}

impl PingTransmitter {
    pub fn new(destination: &str) -> Result<PingTransmitter, PingError> {
        if destination.trim().is_empty() {
            return Err(PingError::EmptyDestination);
        }
        Ok(PingTransmitter {
            destination: destination.to_string(),
            auto_codepage: true,
            ..Default::default()
        })
    }

    /// Run ping and capture its output.
    ///
    /// ```rust
    /// use pingstats::{PingParser, PingTransmitter};
    ///
    /// fn probe() -> Result<(), pingstats::PingError> {
    ///     let mut transmitter = PingTransmitter::new("192.168.0.1")?;
    ///     transmitter.count = Some(10);
    ///     let result = transmitter.ping()?;
    ///     let stats = PingParser::new().parse_result(&result)?;
    ///     println!("{}", stats);
    ///     Ok(())
    /// }
    /// ```
    pub fn ping(&self) -> Result<PingResult, PingError> {
        self.validate()?;

        let cmd = self.make_cmd(HostOs::current());
        debug!("ping command: {}", cmd.command_line());

        let output = if cmd.require_shell {
            if cfg!(target_os = "windows") {
                Command::new("cmd")
                    .args(["/C", &cmd.command_line()])
                    .output()?
            } else {
                Command::new("sh")
                    .args(["-c", &cmd.command_line()])
                    .output()?
            }
        } else {
            Command::new(&cmd.tokens[0]).args(&cmd.tokens[1..]).output()?
        };

        if !output.status.success() {
            warn!("ping exited with {:?}", output.status.code());
        }

        Ok(PingResult {
            stdout: Some(String::from_utf8_lossy(&output.stdout).to_string()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            returncode: output.status.code(),
        })
    }

    pub fn make_cmd(&self, os: HostOs) -> PingCommand {
        let maker = PingCmdMaker {
            count: self.count,
            deadline: self.deadline,
            timeout: self.timeout,
            packet_size: self.packet_size,
            ttl: self.ttl,
            interface: self.interface.clone(),
            is_ipv6: self.is_ipv6(),
            timestamp: self.timestamp,
            auto_codepage: self.auto_codepage,
            is_quiet: self.is_quiet,
            ping_option: self.ping_option.clone(),
        };
        maker.make_cmd(os, &self.destination)
    }

    fn is_ipv6(&self) -> bool {
        self.destination.parse::<Ipv6Addr>().is_ok()
    }

    fn validate(&self) -> Result<(), PingError> {
        if self.destination.trim().is_empty() {
            return Err(PingError::EmptyDestination);
        }
        if self.count == Some(0) {
            return Err(PingError::InvalidCount);
        }
        if let Some(deadline) = self.deadline {
            if deadline.is_zero() {
                return Err(PingError::InvalidDeadline);
            }
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(PingError::InvalidTimeout);
            }
        }
        if let Ok(addr) = self.destination.parse::<Ipv6Addr>() {
            if is_link_local(addr) && self.interface.is_none() {
                return Err(PingError::InterfaceRequired);
            }
        }
        Ok(())
    }
}

fn is_link_local(addr: Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_destination() {
        assert!(matches!(
            PingTransmitter::new(""),
            Err(PingError::EmptyDestination)
        ));
        assert!(matches!(
            PingTransmitter::new("  "),
            Err(PingError::EmptyDestination)
        ));
    }

    #[test]
    fn test_validate_count() {
        let mut transmitter = PingTransmitter::new("localhost").unwrap();
        transmitter.count = Some(0);
        assert!(matches!(
            transmitter.validate(),
            Err(PingError::InvalidCount)
        ));

        transmitter.count = Some(1);
        assert!(transmitter.validate().is_ok());
    }

    #[test]
    fn test_validate_deadline_and_timeout() {
        let mut transmitter = PingTransmitter::new("localhost").unwrap();
        transmitter.deadline = Some(Duration::ZERO);
        assert!(matches!(
            transmitter.validate(),
            Err(PingError::InvalidDeadline)
        ));

        transmitter.deadline = Some(Duration::from_secs(3));
        transmitter.timeout = Some(Duration::ZERO);
        assert!(matches!(
            transmitter.validate(),
            Err(PingError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_ipv6_link_local_requires_interface() {
        let mut transmitter = PingTransmitter::new("fe80::783c:caff:fe12:b46c").unwrap();
        assert!(matches!(
            transmitter.validate(),
            Err(PingError::InterfaceRequired)
        ));

        transmitter.interface = Some(String::from("usb0"));
        assert!(transmitter.validate().is_ok());

        // global scope needs no interface
        let transmitter = PingTransmitter::new("2001:db8::1").unwrap();
        assert!(transmitter.validate().is_ok());
    }

    #[test]
    fn test_make_cmd_uses_ping6_for_ipv6() {
        let transmitter = PingTransmitter::new("2001:db8::1").unwrap();
        let cmd = transmitter.make_cmd(HostOs::Linux);
        assert_eq!(cmd.tokens[0], "ping6");
    }
}
