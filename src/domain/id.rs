//! Domain identifier types with proper encapsulation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Error returned when a string is not a 64-character hex identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError(String);

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is not a 64 character hex id", self.0)
    }
}

impl std::error::Error for ParseIdError {}

fn decode_hash(value: &str) -> Result<[u8; 32], ParseIdError> {
    if value.len() != 64 {
        return Err(ParseIdError(value.to_string()));
    }
    let mut out = [0u8; 32];
    hex::decode_to_slice(value.to_ascii_lowercase(), &mut out)
        .map_err(|_| ParseIdError(value.to_string()))?;
    Ok(out)
}

macro_rules! hash_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Wrap raw hash bytes.
            #[must_use]
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Derive an identifier by hashing arbitrary content.
            #[must_use]
            pub fn digest(content: &[u8]) -> Self {
                Self(Sha256::digest(content).into())
            }

            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// True when the text looks like an identifier (64 hex chars).
            #[must_use]
            pub fn looks_like(value: &str) -> bool {
                value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), &hex::encode(self.0)[..16])
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_hash(s).map(Self)
            }
        }
    };
}

hash_id!(
    /// Block identifier (the block's hash).
    BlockId
);

hash_id!(
    /// Transaction identifier.
    TxId
);

hash_id!(
    /// Root hash of the balance tree at a snapshot version.
    StateRoot
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_mixed_case_hex() {
        let text = "AB".repeat(32);
        let id: BlockId = text.parse().unwrap();
        assert_eq!(id.to_string(), "ab".repeat(32));
    }

    #[test]
    fn parse_rejects_short_or_non_hex_input() {
        assert!("abcd".parse::<BlockId>().is_err());
        assert!("zz".repeat(32).parse::<TxId>().is_err());
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(BlockId::digest(b"genesis"), BlockId::digest(b"genesis"));
        assert_ne!(BlockId::digest(b"a"), BlockId::digest(b"b"));
    }

    #[test]
    fn looks_like_requires_exact_length() {
        assert!(TxId::looks_like(&"0".repeat(64)));
        assert!(!TxId::looks_like("1234"));
    }
}
