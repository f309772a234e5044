use std::{fmt, str::FromStr};

use thiserror::Error;

/// Suffix historically appended to the MAC to form the published device id.
pub const DEVICE_ID_SUFFIX: &str = ".esp8266";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseMacError {
    #[error("expected 6 colon-separated octets, got {0}")]
    WrongOctetCount(usize),
    #[error("invalid octet {0:?}")]
    InvalidOctet(String),
}

/// Hardware address of the network interface, printed uppercase
/// colon-separated (`AA:BB:CC:DD:EE:FF`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// The published device identifier: the MAC plus the fixed suffix.
    pub fn device_id(&self) -> String {
        format!("{self}{DEVICE_ID_SUFFIX}")
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl FromStr for MacAddr {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(ParseMacError::WrongOctetCount(parts.len()));
        }

        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(&parts) {
            if part.len() != 2 {
                return Err(ParseMacError::InvalidOctet(part.to_string()));
            }
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| ParseMacError::InvalidOctet(part.to_string()))?;
        }
        Ok(Self(octets))
    }
}

/// Telemetry wire format. Hand-formatted rather than serde-encoded: the exact
/// byte layout (leading space, no space after `"temp":`, two decimals) is a
/// compatibility contract with existing consumers of the reading topic.
pub fn telemetry_payload(temp_celsius: f32, device_id: &str) -> String {
    format!("{{ \"temp\":{temp_celsius:.2}, \"deviceId\": \"{device_id}\"}}")
}
