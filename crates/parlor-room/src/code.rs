//! Shareable room codes.

use std::borrow::Borrow;
use std::fmt;

use rand::Rng;

/// Symbols a code is drawn from. `I`, `O`, `0` and `1` are left out so a
/// code read aloud or off a screen is unambiguous.
pub const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Symbols per code.
pub const CODE_LEN: usize = 6;

/// A six-symbol room code such as `K7QX2M`.
///
/// Codes are only unique among live rooms; the registry rejection-samples
/// against its own map when it creates one. `Borrow<str>` lets the registry
/// be queried with whatever string a client sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomCode(pub(crate) String);

impl RoomCode {
    /// Draws a fresh random code. Uniqueness is the caller's job.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let code = (0..CODE_LEN)
            .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RoomCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RoomCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}
