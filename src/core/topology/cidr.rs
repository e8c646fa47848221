use crate::utils::error::{ApiError, Result};
use std::fmt;
use std::net::Ipv4Addr;

/// IPv4 network in CIDR notation, e.g. `10.0.0.0/16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    pub fn parse(field_name: &str, raw: &str) -> Result<Self> {
        let invalid = |reason: &str| ApiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        let (addr, prefix) = raw
            .split_once('/')
            .ok_or_else(|| invalid("Expected CIDR notation a.b.c.d/n"))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| invalid("Invalid IPv4 address"))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| invalid("Invalid prefix length"))?;
        if prefix > 32 {
            return Err(invalid("Prefix length must be at most 32"));
        }

        let cidr = Self {
            network: addr,
            prefix,
        };
        // 主機位元必須為 0
        if u32::from(addr) & !cidr.mask() != 0 {
            return Err(invalid("Address has host bits set"));
        }
        Ok(cidr)
    }

    fn mask(&self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix))
        }
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix >= self.prefix && u32::from(other.network) & self.mask() == u32::from(self.network)
    }

    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cidr(raw: &str) -> Ipv4Cidr {
        Ipv4Cidr::parse("test", raw).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let vpc = cidr("10.0.0.0/16");
        assert_eq!(vpc.prefix(), 16);
        assert_eq!(vpc.to_string(), "10.0.0.0/16");
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(Ipv4Cidr::parse("test", "10.0.0.0").is_err());
        assert!(Ipv4Cidr::parse("test", "10.0.0.256/24").is_err());
        assert!(Ipv4Cidr::parse("test", "10.0.0.0/33").is_err());
        assert!(Ipv4Cidr::parse("test", "10.0.1.1/24").is_err());
    }

    #[test]
    fn test_containment() {
        let vpc = cidr("10.0.0.0/16");
        assert!(vpc.contains(&cidr("10.0.11.0/24")));
        assert!(!vpc.contains(&cidr("10.1.0.0/24")));
        assert!(!cidr("10.0.11.0/24").contains(&vpc));
        assert!(cidr("0.0.0.0/0").contains(&vpc));
    }

    #[test]
    fn test_overlap() {
        assert!(cidr("10.0.1.0/24").overlaps(&cidr("10.0.1.128/25")));
        assert!(!cidr("10.0.1.0/24").overlaps(&cidr("10.0.2.0/24")));
    }
}
