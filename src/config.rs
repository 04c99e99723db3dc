//! Command-line configuration.
//!
//! Flags are parsed from `std::env::args()` without a CLI framework:
//! `--port`, `--replicaof "<host> <port>"`, `--dir` and `--dbfilename`.
//! An empty `--replicaof` (or its absence) leaves the server a master.

use std::path::PathBuf;

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum ConfigError {
    #[error("invalid command line flag")]
    InvalidCommandLineFlag,
    #[error("invalid port flag value")]
    InvalidPortFlagValue,
    #[error("invalid master address")]
    InvalidMasterAddress,
    #[error("invalid master port")]
    InvalidMasterPort,
}

/// The role of a server instance.
///
/// A master accepts write commands from clients and replicates them to
/// replicas; a replica applies the stream it receives from its master
/// and serves read-only requests.
#[derive(Debug, PartialEq, Clone)]
pub enum Role {
    Master,
    Replica { host: String, port: u16 },
}

impl Role {
    /// The wire-protocol name of the role, as reported by INFO.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Replica { .. } => "slave",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Config {
    pub port: u16,
    pub role: Role,
    pub dir: PathBuf,
    pub dbfilename: String,
}

impl Config {
    /// Parses configuration from command-line arguments (the first
    /// argument, the program name, is skipped).
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, ConfigError> {
        let mut iter = args.into_iter().skip(1);
        let mut port: Option<u16> = None;
        let mut role: Option<Role> = None;
        let mut dir: Option<PathBuf> = None;
        let mut dbfilename: Option<String> = None;

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--port" => {
                    let Some(value) = iter.next() else {
                        return Err(ConfigError::InvalidCommandLineFlag);
                    };
                    port = Some(validate_port(&value, ConfigError::InvalidPortFlagValue)?);
                }
                "--replicaof" => {
                    let Some(value) = iter.next() else {
                        return Err(ConfigError::InvalidCommandLineFlag);
                    };
                    if value.is_empty() {
                        role = Some(Role::Master);
                    } else {
                        let (host, master_port) = validate_master_address(&value)?;
                        role = Some(Role::Replica {
                            host,
                            port: master_port,
                        });
                    }
                }
                "--dir" => {
                    let Some(value) = iter.next() else {
                        return Err(ConfigError::InvalidCommandLineFlag);
                    };
                    dir = Some(PathBuf::from(value));
                }
                "--dbfilename" => {
                    let Some(value) = iter.next() else {
                        return Err(ConfigError::InvalidCommandLineFlag);
                    };
                    dbfilename = Some(value);
                }
                _ => return Err(ConfigError::InvalidCommandLineFlag),
            }
        }

        Ok(Config {
            port: port.unwrap_or(6379),
            role: role.unwrap_or(Role::Master),
            dir: dir.unwrap_or_else(|| PathBuf::from("/tmp")),
            dbfilename: dbfilename.unwrap_or_else(|| "redis-data.rdb".to_string()),
        })
    }

    /// Full path of the snapshot file read at startup.
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(&self.dbfilename)
    }
}

fn validate_port(port: &str, error: ConfigError) -> Result<u16, ConfigError> {
    let port_number = port.parse::<u16>().map_err(|_| error.clone())?;

    if port_number == 0 {
        return Err(error);
    }

    Ok(port_number)
}

/// Parses a master address in the `"host port"` form used by
/// `--replicaof`. The host may be an IPv4 address or a hostname.
fn validate_master_address(master_address: &str) -> Result<(String, u16), ConfigError> {
    let ipv4_regex = Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").unwrap();
    let hostname_regex = Regex::new(r"^[a-zA-Z0-9\-\.]+$").unwrap();

    let split_address = master_address.split_whitespace().collect::<Vec<&str>>();

    if split_address.len() != 2 {
        return Err(ConfigError::InvalidMasterAddress);
    }

    let address = split_address[0];

    let valid_address = if let Some(caps) = ipv4_regex.captures(address) {
        caps.iter().skip(1).all(|octet| {
            octet
                .map(|m| m.as_str().parse::<u16>().map(|v| v <= 255).unwrap_or(false))
                .unwrap_or(false)
        })
    } else {
        hostname_regex.is_match(address)
    };

    if !valid_address {
        return Err(ConfigError::InvalidMasterAddress);
    }

    let port = validate_port(split_address[1], ConfigError::InvalidMasterPort)?;

    Ok((address.to_string(), port))
}
