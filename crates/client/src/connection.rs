//! Cluster connection strings.
//!
//! A connection string lists bootstrap servers as `host[:port]` separated by
//! commas, e.g. `10.0.0.1:1982,10.0.0.2,[::1]:2000`. IPv6 hosts with a port
//! are written in brackets.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Port used when a host entry omits one.
pub const DEFAULT_PORT: u16 = 1982;

/// One bootstrap server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Host {
	/// Hostname or address literal, without brackets.
	pub name: String,
	/// TCP port.
	pub port: u16,
}

impl fmt::Display for Host {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.name.contains(':') {
			write!(f, "[{}]:{}", self.name, self.port)
		} else {
			write!(f, "{}:{}", self.name, self.port)
		}
	}
}

/// Parsed, non-empty list of bootstrap servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
	hosts: Vec<Host>,
}

impl ConnectionString {
	/// Parses a connection string.
	///
	/// # Errors
	///
	/// [`Error::InvalidConnection`] when the string is empty, an entry has no
	/// host, or a port is not a number in `0..=65535`.
	pub fn parse(input: &str) -> Result<Self> {
		let invalid = |reason: &str| Error::InvalidConnection {
			input: input.to_string(),
			reason: reason.to_string(),
		};

		if input.trim().is_empty() {
			return Err(invalid("no hosts"));
		}

		let mut hosts = Vec::new();
		for entry in input.split(',') {
			let entry = entry.trim();
			// A bare IPv6 address has several colons and no port.
			let port_colon = if entry.starts_with('[') || entry.matches(':').count() == 1 {
				entry.rfind(':')
			} else {
				None
			};
			let host = match port_colon.filter(|&c| !entry[c..].contains(']')) {
				None => Host {
					name: entry.trim_start_matches('[').trim_end_matches(']').to_string(),
					port: DEFAULT_PORT,
				},
				Some(colon) => {
					let port = entry[colon + 1..].parse::<u16>().map_err(|_| invalid("port is not a number in 0..=65535"))?;
					let raw = &entry[..colon];
					let name = raw.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(raw);
					Host {
						name: name.to_string(),
						port,
					}
				}
			};
			if host.name.is_empty() {
				return Err(invalid("empty host"));
			}
			hosts.push(host);
		}

		Ok(Self { hosts })
	}

	/// Connection string naming a single server.
	pub fn from_host(name: impl Into<String>, port: u16) -> Self {
		Self {
			hosts: vec![Host { name: name.into(), port }],
		}
	}

	/// Appends another bootstrap server.
	#[must_use]
	pub fn with_host(mut self, name: impl Into<String>, port: u16) -> Self {
		self.hosts.push(Host { name: name.into(), port });
		self
	}

	/// Bootstrap servers in the order given.
	pub fn hosts(&self) -> &[Host] {
		&self.hosts
	}
}

impl FromStr for ConnectionString {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Self::parse(s)
	}
}

impl fmt::Display for ConnectionString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, host) in self.hosts.iter().enumerate() {
			if i > 0 {
				f.write_str(",")?;
			}
			write!(f, "{host}")?;
		}
		Ok(())
	}
}
