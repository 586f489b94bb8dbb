//! Secret-holding types.
//!
//! Both wrap [`Zeroizing`] strings: memory is wiped on drop and on an
//! explicit [`wipe`](SecretPhrase::wipe). `Debug` never prints the contents.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

/// PIN length accepted at wallet creation.
pub const PIN_LENGTH: usize = 4;

/// A mnemonic recovery phrase.
#[derive(Clone)]
pub struct SecretPhrase(Zeroizing<String>);

impl SecretPhrase {
    pub fn new(phrase: String) -> Self {
        Self(Zeroizing::new(phrase))
    }

    /// Borrow the phrase. Callers must not copy it into unmanaged memory.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn wipe(&mut self) {
        self.0.zeroize();
    }
}

impl From<&str> for SecretPhrase {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl From<Zeroizing<String>> for SecretPhrase {
    fn from(s: Zeroizing<String>) -> Self {
        Self(s)
    }
}

impl fmt::Debug for SecretPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretPhrase(<redacted>)")
    }
}

impl Serialize for SecretPhrase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretPhrase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// The unlock PIN.
///
/// Stored verbatim in the account record; only the comparison is hardened.
#[derive(Clone)]
pub struct Pin(Zeroizing<String>);

impl Pin {
    /// Accept exactly [`PIN_LENGTH`] ASCII digits.
    pub fn parse(pin: &str) -> Option<Self> {
        if pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(Zeroizing::new(pin.to_string())))
        } else {
            None
        }
    }

    /// Constant-time comparison against a candidate.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    pub fn wipe(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(<redacted>)")
    }
}

impl Serialize for Pin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// Records written before PIN validation existed may hold any string.
impl<'de> Deserialize<'de> for Pin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| Self(Zeroizing::new(s)))
    }
}
