// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! A password wrapper that scrubs its backing buffer on drop.
//!
//! Replaces the teacher's manual zeroization with `zeroize::Zeroizing`,
//! the way the parent workspace already depends on `zeroize` for its
//! security feature group.

use std::fmt;
use zeroize::Zeroizing;

/// A secret string (the directory bind password).
///
/// `Debug` and `Display` never print the contents; the backing buffer is
/// zeroized when the last owner is dropped.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    pub fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }

    /// Borrow the plaintext value. Callers must not persist this beyond
    /// the directory bind call it's used for.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(<redacted>)")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
