use num_bigint::BigInt;
use serde::{self, Deserialize, Deserializer, Serializer};
use std::str::FromStr;

/// Parses an on-chain amount string. Decimal amounts ("12.750000") are
/// truncated to their integer part.
pub fn parse_amount(amount_str: &str) -> Result<BigInt, String> {
    let cleaned = amount_str
        .trim()
        .trim_matches('"')
        .split('.')
        .next()
        .unwrap_or("0");
    if cleaned.is_empty() {
        return Ok(BigInt::from(0));
    }
    BigInt::from_str(cleaned).map_err(|e| format!("{}: {}", amount_str, e))
}

pub mod amount {
    use super::*;

    pub fn serialize<S>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigInt, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_amount(&raw).map_err(serde::de::Error::custom)
    }
}

/// The LCD encodes 64-bit integers as JSON strings.
pub mod u64_string {
    use super::*;

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) if s.is_empty() => Ok(0),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_amounts_are_truncated() {
        assert_eq!(parse_amount("1234.987").unwrap(), BigInt::from(1234));
        assert_eq!(parse_amount("\"42\"").unwrap(), BigInt::from(42));
        assert_eq!(parse_amount("").unwrap(), BigInt::from(0));
        assert!(parse_amount("abc").is_err());
    }
}
