// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subject resolution against the host's name service.
//!
//! This is the one component of the pipeline that never talks to the
//! directory: it answers "who is this user, locally" via the platform's
//! `getpwnam`/`getgrgid` family, through the `users` crate.

use std::collections::BTreeSet;
use thiserror::Error;

/// Identity-resolution errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("unknown user '{0}'")]
    UnknownUser(String),
}

/// The authenticating subject: its name and the set of groups (primary
/// plus supplementary) it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub groups: BTreeSet<String>,
}

/// Resolve `name` against the host's name service.
///
/// `root` is not special-cased here -- the caller (the decision shim)
/// short-circuits `root` before this is ever invoked, per the spec's
/// selected semantics for the root-user open question.
pub fn resolve(name: &str) -> Result<User, IdentityError> {
    let pw = users::get_user_by_name(name).ok_or_else(|| IdentityError::UnknownUser(name.to_string()))?;

    let mut groups = BTreeSet::new();
    if let Some(primary) = users::get_group_by_gid(pw.primary_group_id()) {
        groups.insert(primary.name().to_string_lossy().into_owned());
    } else {
        return Err(IdentityError::UnknownUser(name.to_string()));
    }

    if let Some(supplementary) = users::get_user_groups(name, pw.primary_group_id()) {
        for group in supplementary {
            groups.insert(group.name().to_string_lossy().into_owned());
        }
    }

    Ok(User {
        name: name.to_string(),
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_is_rejected() {
        // No name service on earth resolves this; deterministic for CI.
        let err = resolve("no-such-user-xyz-123").unwrap_err();
        assert_eq!(
            err,
            IdentityError::UnknownUser("no-such-user-xyz-123".to_string())
        );
    }
}
