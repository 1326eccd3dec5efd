use std::time::Duration;

/// Default deadline in seconds, applied when neither a count nor a
/// deadline is configured so a bare ping invocation still terminates.
pub const DEFAULT_DEADLINE_SEC: u64 = 3;

/// Operating system whose ping flavor the command is composed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    MacOs,
    Windows,
}

impl HostOs {
    pub fn current() -> HostOs {
        if cfg!(target_os = "windows") {
            HostOs::Windows
        } else if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else {
            HostOs::Linux
        }
    }
}

/// A composed ping invocation. `tokens` is the full argument vector
/// including the program itself, `require_shell` is set when the command
/// only works through a shell (Windows codepage switch).
#[derive(Debug, Clone, PartialEq)]
pub struct PingCommand {
    pub tokens: Vec<String>,
    pub require_shell: bool,
}

impl PingCommand {
    pub fn command_line(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Composes the OS-specific ping command line. Option spellings differ
/// per flavor (deadline `-w`/`-t`/`-n`, ttl `-t`/`-T`/`-i`, ...), the
/// table lives in the per-option methods below.
#[derive(Debug, Clone, Default)]
pub struct PingCmdMaker {
    pub count: Option<u64>,
    pub deadline: Option<Duration>,
    pub timeout: Option<Duration>,
    pub packet_size: Option<u64>,
    pub ttl: Option<u32>,
    pub interface: Option<String>,
    pub is_ipv6: bool,
    /// Linux only, adds reply timestamps (`-D -O`).
    pub timestamp: bool,
    /// Windows only, switch the console codepage so the output is parsable.
    pub auto_codepage: bool,
    pub is_quiet: bool,
    /// Additional raw options appended before the destination.
    pub ping_option: Vec<String>,
}

impl PingCmdMaker {
    pub fn make_cmd(&self, os: HostOs, destination: &str) -> PingCommand {
        let mut tokens: Vec<String> = Vec::new();
        let mut require_shell = false;

        if os == HostOs::Windows && self.auto_codepage {
            tokens.extend(["chcp", "437", "&"].map(String::from));
            require_shell = true;
        }

        tokens.push(self.ping_program(os).to_string());
        tokens.extend(self.interface_option(os));
        tokens.extend(self.deadline_option(os));
        tokens.extend(self.timeout_option(os));
        tokens.extend(self.count_option(os));
        tokens.extend(self.packet_size_option(os));
        tokens.extend(self.ttl_option(os));
        if self.timestamp {
            tokens.extend(self.timestamp_option(os));
        }
        if self.is_quiet && os != HostOs::Windows {
            tokens.push(String::from("-q"));
        }
        tokens.extend(self.ping_option.iter().cloned());
        tokens.push(self.destination_host(os, destination));

        PingCommand {
            tokens,
            require_shell,
        }
    }

    fn ping_program(&self, os: HostOs) -> &'static str {
        if os != HostOs::Windows && self.is_ipv6 {
            "ping6"
        } else {
            "ping"
        }
    }

    fn destination_host(&self, os: HostOs, destination: &str) -> String {
        if os == HostOs::Windows && self.is_ipv6 {
            if let Some(interface) = &self.interface {
                return format!("{destination}%{interface}");
            }
        }
        destination.to_string()
    }

    fn interface_option(&self, os: HostOs) -> Vec<String> {
        match (os, &self.interface) {
            (HostOs::Linux, Some(interface)) => vec![String::from("-I"), interface.clone()],
            _ => Vec::new(),
        }
    }

    fn deadline_option(&self, os: HostOs) -> Vec<String> {
        let deadline = match &self.deadline {
            Some(deadline) => deadline.as_secs_f64().ceil() as u64,
            None => {
                if self.count.is_some() {
                    return Vec::new();
                }
                DEFAULT_DEADLINE_SEC
            }
        };
        match os {
            HostOs::Linux => vec![String::from("-w"), deadline.to_string()],
            HostOs::MacOs => {
                if self.is_ipv6 {
                    // macOS ping6 has no deadline option, simulate it with
                    // the interval and count options
                    vec![
                        String::from("-i"),
                        String::from("1"),
                        String::from("-c"),
                        deadline.to_string(),
                    ]
                } else {
                    vec![String::from("-t"), deadline.to_string()]
                }
            }
            // Windows ping has no option equal to the deadline option
            HostOs::Windows => vec![String::from("-n"), deadline.to_string()],
        }
    }

    fn timeout_option(&self, os: HostOs) -> Vec<String> {
        let timeout = match &self.timeout {
            Some(timeout) => timeout,
            None => return Vec::new(),
        };
        match os {
            // Linux ping accepts the response timeout in whole seconds
            HostOs::Linux => vec![
                String::from("-W"),
                (timeout.as_secs_f64().ceil() as u64).to_string(),
            ],
            HostOs::Windows => vec![String::from("-w"), timeout.as_millis().to_string()],
            // macOS ping has no per-packet timeout option
            HostOs::MacOs => Vec::new(),
        }
    }

    fn count_option(&self, os: HostOs) -> Vec<String> {
        let count = match self.count {
            Some(count) => count,
            None => return Vec::new(),
        };
        match os {
            HostOs::Windows => vec![String::from("-n"), count.to_string()],
            _ => vec![String::from("-c"), count.to_string()],
        }
    }

    fn packet_size_option(&self, os: HostOs) -> Vec<String> {
        let packet_size = match self.packet_size {
            Some(packet_size) => packet_size,
            None => return Vec::new(),
        };
        match os {
            HostOs::Windows => vec![String::from("-l"), packet_size.to_string()],
            _ => vec![String::from("-s"), packet_size.to_string()],
        }
    }

    fn ttl_option(&self, os: HostOs) -> Vec<String> {
        let ttl = match self.ttl {
            Some(ttl) => ttl,
            None => return Vec::new(),
        };
        match os {
            HostOs::Linux => vec![String::from("-t"), ttl.to_string()],
            HostOs::MacOs => vec![String::from("-T"), ttl.to_string()],
            HostOs::Windows => vec![String::from("-i"), ttl.to_string()],
        }
    }

    fn timestamp_option(&self, os: HostOs) -> Vec<String> {
        match os {
            HostOs::Windows => Vec::new(),
            _ => vec![String::from("-D"), String::from("-O")],
        }
    }
}
