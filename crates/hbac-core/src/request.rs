// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Builds the evaluation request from a resolved user plus the fetched
//! target-host and service directory entries.

use crate::dn::{self, GroupKind};
use crate::directory::DirectoryEntry;
use crate::identity::User;
use crate::rule::RuleElement;

/// One side of an evaluation request: a name plus the groups it belongs
/// to, in the shape [`RuleElement::matches`] expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestElement {
    pub name: String,
    pub groups: Vec<String>,
}

impl RequestElement {
    pub fn matches(&self, element: &RuleElement) -> bool {
        element.matches(&self.name, &self.groups)
    }
}

/// The fully-built request: who, for what service, on which target host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalRequest {
    pub user: RequestElement,
    pub service: RequestElement,
    pub target_host: RequestElement,
}

/// Build the user side of the request straight from the resolved subject;
/// its groups are already names, no DN parsing needed.
pub fn user_element(user: &User) -> RequestElement {
    RequestElement {
        name: user.name.clone(),
        groups: user.groups.iter().cloned().collect(),
    }
}

/// Build the target-host or service side of the request from a fetched
/// directory entry: `key_attr` holds the single-valued name, `memberOf`
/// (if present) holds the group DNs.
pub fn entry_element(
    entry: &DirectoryEntry,
    key_attr: &str,
    group_kind: GroupKind,
) -> Option<RequestElement> {
    let name = match entry.attrs.single(key_attr) {
        Some(Ok(v)) => v.to_string(),
        _ => return None,
    };

    let groups = entry
        .attrs
        .get("memberOf")
        .into_iter()
        .flatten()
        .filter_map(|group_dn| dn::group_name_of(group_dn, group_kind).ok())
        .collect();

    Some(RequestElement { name, groups })
}
