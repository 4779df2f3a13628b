use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum AddressParseError {
    #[error("Address '{0}' is not of the form host:port")]
    MissingPort(String),
    #[error("Address '{0}' has an empty host")]
    MissingHost(String),
    #[error("Invalid port '{0}'")]
    InvalidPort(String),
}

/// The address a member tells others to reach it at.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct AdvertisedSocketAddress {
    hostname: String,
    port: u16,
}

impl AdvertisedSocketAddress {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        AdvertisedSocketAddress {
            hostname: hostname.into(),
            port,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for AdvertisedSocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

impl FromStr for AdvertisedSocketAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hostname, port) = split_host_port(s)?;
        Ok(AdvertisedSocketAddress::new(hostname, parse_port(port)?))
    }
}

/// The address a server listens on. The port may be a range, `host:6000-6010`, in which case the
/// server binds the first free port of it. A range may also run downwards.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct ListenAddress {
    hostname: String,
    first_port: u16,
    last_port: u16,
}

impl ListenAddress {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self::with_port_range(hostname, port, port)
    }

    pub fn with_port_range(hostname: impl Into<String>, first_port: u16, last_port: u16) -> Self {
        ListenAddress {
            hostname: hostname.into(),
            first_port,
            last_port,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The address with the port range stripped down to its first port.
    pub fn advertised(&self) -> AdvertisedSocketAddress {
        AdvertisedSocketAddress::new(self.hostname.clone(), self.first_port)
    }

    pub fn ports(&self) -> PortIterator {
        PortIterator::new(self.first_port, self.last_port)
    }
}

impl fmt::Display for ListenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first_port == self.last_port {
            write!(f, "{}:{}", self.hostname, self.first_port)
        } else {
            write!(f, "{}:{}-{}", self.hostname, self.first_port, self.last_port)
        }
    }
}

impl FromStr for ListenAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hostname, ports) = split_host_port(s)?;
        match ports.split_once('-') {
            Some((first, last)) => Ok(ListenAddress::with_port_range(
                hostname,
                parse_port(first)?,
                parse_port(last)?,
            )),
            None => Ok(ListenAddress::new(hostname, parse_port(ports)?)),
        }
    }
}

fn split_host_port(s: &str) -> Result<(&str, &str), AddressParseError> {
    let (hostname, port) = s
        .rsplit_once(':')
        .ok_or_else(|| AddressParseError::MissingPort(s.to_string()))?;
    if hostname.is_empty() {
        return Err(AddressParseError::MissingHost(s.to_string()));
    }
    Ok((hostname, port))
}

fn parse_port(port: &str) -> Result<u16, AddressParseError> {
    port.parse()
        .map_err(|_| AddressParseError::InvalidPort(port.to_string()))
}

/// Walks a port range from its first port to its last, inclusive, in whichever direction that
/// is.
#[derive(Clone, Debug)]
pub struct PortIterator {
    next: Option<u16>,
    end: u16,
    ascending: bool,
}

impl PortIterator {
    pub fn new(start: u16, end: u16) -> Self {
        PortIterator {
            next: Some(start),
            end,
            ascending: start <= end,
        }
    }
}

impl Iterator for PortIterator {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        let current = self.next?;
        self.next = if current == self.end {
            None
        } else if self.ascending {
            Some(current + 1)
        } else {
            Some(current - 1)
        };
        Some(current)
    }
}
