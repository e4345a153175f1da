//! MacAddress - 6-byte radio source identity
//!
//! Used to filter CSI frames down to the one configured transmitter.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// IEEE 802 MAC address.
///
/// # Examples
/// ```
/// use contracts::MacAddress;
///
/// let mac: MacAddress = "1A:00:00:00:00:00".parse().unwrap();
/// assert_eq!(mac.to_string(), "1a:00:00:00:00:00");
/// assert_eq!(mac.octets()[0], 0x1a);
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Broadcast address `ff:ff:ff:ff:ff:ff`
    pub const BROADCAST: MacAddress = MacAddress([0xff; 6]);

    #[inline]
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    #[inline]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl From<[u8; 6]> for MacAddress {
    #[inline]
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl FromStr for MacAddress {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.trim().split([':', '-']);

        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| ContractError::payload_decode(format!("mac '{s}' too short")))?;
            if part.len() != 2 {
                return Err(ContractError::payload_decode(format!(
                    "mac '{s}' has malformed octet '{part}'"
                )));
            }
            *octet = u8::from_str_radix(part, 16).map_err(|e| {
                ContractError::payload_decode(format!("mac '{s}' has invalid octet '{part}': {e}"))
            })?;
        }

        if parts.next().is_some() {
            return Err(ContractError::payload_decode(format!(
                "mac '{s}' too long"
            )));
        }

        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}

// Serialize as the canonical string form
impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
