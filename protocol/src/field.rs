use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use crypto_bigint::{Encoding, U256};
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The field modulus: the BN254 scalar field prime, matching the field the
/// proving circuit operates over.
pub const MODULUS: U256 =
    U256::from_be_hex("30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001");

/// Errors arising from constructing or decoding field elements.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("value does not fit in the field")]
    OutOfRange,
    #[error("invalid field element encoding: {0}")]
    InvalidEncoding(String),
}

/// An immutable element of the prime field.
///
/// All commitments, nullifiers, and Merkle nodes are field elements. On the
/// wire they round-trip through minimal lowercase hex strings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FieldElement(U256);

impl FieldElement {
    /// The additive identity, also used to encode empty attribute-mask slots.
    pub const ZERO: FieldElement = FieldElement(U256::ZERO);

    /// Construct from a raw integer, rejecting values outside the field.
    pub fn new(value: U256) -> Result<Self, FieldError> {
        if value >= MODULUS {
            return Err(FieldError::OutOfRange);
        }
        Ok(Self(value))
    }

    /// Construct from 32 big-endian bytes, reducing modulo the field prime.
    /// Used to map digest output into the field.
    pub fn from_bytes_mod_order(bytes: [u8; 32]) -> Self {
        let mut value = U256::from_be_slice(&bytes);
        // The modulus is 254 bits, so a handful of subtractions suffice.
        while value >= MODULUS {
            value = value.wrapping_sub(&MODULUS);
        }
        Self(value)
    }

    /// A uniformly random field element, for voter secrets.
    pub fn random(rng: &mut (impl RngCore + CryptoRng)) -> Self {
        let mut bytes = [0; 32];
        rng.fill_bytes(&mut bytes);
        Self::from_bytes_mod_order(bytes)
    }

    /// The canonical 32-byte big-endian encoding.
    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_be_bytes()
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        // Always below the 254-bit modulus.
        Self(U256::from(value))
    }
}

impl From<u32> for FieldElement {
    fn from(value: u32) -> Self {
        Self::from(u64::from(value))
    }
}

impl Display for FieldElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let hex = HEXLOWER.encode(&self.to_be_bytes());
        let minimal = hex.trim_start_matches('0');
        if minimal.is_empty() {
            write!(f, "0")
        } else {
            write!(f, "{minimal}")
        }
    }
}

impl Debug for FieldElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({self})")
    }
}

impl FromStr for FieldElement {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 64 {
            return Err(FieldError::InvalidEncoding(s.to_string()));
        }
        let padded = format!("{s:0>64}");
        let bytes = HEXLOWER_PERMISSIVE
            .decode(padded.as_bytes())
            .map_err(|_| FieldError::InvalidEncoding(s.to_string()))?;
        let value = U256::from_be_slice(&bytes);
        Self::new(value).map_err(|_| FieldError::OutOfRange)
    }
}

impl From<FieldElement> for String {
    fn from(element: FieldElement) -> Self {
        element.to_string()
    }
}

impl TryFrom<String> for FieldElement {
    type Error = FieldError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
