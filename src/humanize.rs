//! Human-readable byte sizes for configuration ("64KB", "1.5MB", 1024)

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty size")]
    Empty,

    #[error("invalid number in size: {0}")]
    InvalidNumber(String),

    #[error("invalid unit in size: {0}")]
    InvalidUnit(String),

    #[error("size overflows u64: {0}")]
    Overflow(String),
}

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;

/// Byte count that deserializes from an integer or a suffixed string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub const fn kib(n: u64) -> Self {
        Self(n * KIB)
    }

    pub const fn mib(n: u64) -> Self {
        Self(n * MIB)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

fn unit_multiplier(unit: &str) -> Option<u64> {
    match unit {
        "" | "B" => Some(1),
        "K" | "KB" | "KIB" => Some(KIB),
        "M" | "MB" | "MIB" => Some(MIB),
        "G" | "GB" | "GIB" => Some(GIB),
        _ => None,
    }
}

impl FromStr for ByteSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (number, unit) = s.split_at(split);
        let unit = unit.trim().to_ascii_uppercase();

        let multiplier =
            unit_multiplier(&unit).ok_or_else(|| ParseError::InvalidUnit(unit.clone()))?;

        let bytes = match number.split_once('.') {
            None => number
                .parse::<u64>()
                .map_err(|_| ParseError::InvalidNumber(number.to_string()))?
                .checked_mul(multiplier)
                .ok_or_else(|| ParseError::Overflow(s.to_string()))?,
            Some(_) => {
                let value: f64 = number
                    .parse()
                    .map_err(|_| ParseError::InvalidNumber(number.to_string()))?;
                let bytes = (value * multiplier as f64).round();
                if bytes >= u64::MAX as f64 {
                    return Err(ParseError::Overflow(s.to_string()));
                }
                bytes as u64
            }
        };

        Ok(ByteSize(bytes))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (divisor, unit) = match self.0 {
            n if n >= GIB => (GIB, "GB"),
            n if n >= MIB => (MIB, "MB"),
            n if n >= KIB => (KIB, "KB"),
            _ => return write!(f, "{}B", self.0),
        };

        if self.0 % divisor == 0 {
            write!(f, "{}{}", self.0 / divisor, unit)
        } else {
            write!(f, "{:.1}{}", self.0 as f64 / divisor as f64, unit)
        }
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;

        impl serde::de::Visitor<'_> for Visitor {
            type Value = ByteSize;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte count or a size string such as \"64KB\"")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<ByteSize, E> {
                Ok(ByteSize(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<ByteSize, E> {
                u64::try_from(v)
                    .map(ByteSize)
                    .map_err(|_| E::custom(format!("negative size: {v}")))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<ByteSize, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_suffixed() {
        assert_eq!("1024".parse::<ByteSize>().unwrap(), ByteSize(1024));
        assert_eq!("64KB".parse::<ByteSize>().unwrap(), ByteSize::kib(64));
        assert_eq!("64 kib".parse::<ByteSize>().unwrap(), ByteSize::kib(64));
        assert_eq!("10M".parse::<ByteSize>().unwrap(), ByteSize::mib(10));
        assert_eq!("1GB".parse::<ByteSize>().unwrap(), ByteSize(GIB));
    }

    #[test]
    fn test_parse_fractional() {
        assert_eq!("1.5KB".parse::<ByteSize>().unwrap(), ByteSize(1536));
        assert_eq!("0.5MB".parse::<ByteSize>().unwrap(), ByteSize(512 * 1024));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<ByteSize>(), Err(ParseError::Empty));
        assert!(matches!("12XB".parse::<ByteSize>(), Err(ParseError::InvalidUnit(_))));
        assert!(matches!("KB".parse::<ByteSize>(), Err(ParseError::InvalidNumber(_))));
        assert!(matches!(
            "99999999999999GB".parse::<ByteSize>(),
            Err(ParseError::Overflow(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(ByteSize(512).to_string(), "512B");
        assert_eq!(ByteSize::kib(64).to_string(), "64KB");
        assert_eq!(ByteSize(1536).to_string(), "1.5KB");
        assert_eq!(ByteSize::mib(1000).to_string(), "1000MB");
    }

    #[test]
    fn test_deserialize_string_and_number() {
        #[derive(Deserialize)]
        struct Limits {
            a: ByteSize,
            b: ByteSize,
        }

        let parsed: Limits = serde_json::from_str(r#"{"a": "2MB", "b": 4096}"#).unwrap();
        assert_eq!(parsed.a, ByteSize::mib(2));
        assert_eq!(parsed.b, ByteSize(4096));
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        #[derive(Debug, Deserialize)]
        struct Limits {
            #[allow(dead_code)]
            a: ByteSize,
        }

        assert!(serde_json::from_str::<Limits>(r#"{"a": -1}"#).is_err());
    }
}
