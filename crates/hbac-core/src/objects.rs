// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object fetchers: exact-match lookups of a single host or service entry
//! by name, enforcing the "exactly one entry" invariant the directory is
//! expected to uphold.

use crate::directory::{DirectoryClient, DirectoryError, DirectoryEntry, SearchDescriptor};
use thiserror::Error;

/// Errors looking up a single named object.
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("no such {kind} '{name}'")]
    NotFound { kind: &'static str, name: String },

    #[error("got {count} entries for {kind} '{name}', expected exactly one")]
    Ambiguous {
        kind: &'static str,
        name: String,
        count: usize,
    },

    #[error("{kind} '{name}' is missing its '{attr}' attribute")]
    MissingAttr {
        kind: &'static str,
        name: String,
        attr: &'static str,
    },
}

const HOST_DESCRIPTOR: SearchDescriptor = SearchDescriptor {
    sub_base: "cn=computers,cn=accounts",
    object_class: "ipaHost",
    requested_attrs: &["cn", "fqdn", "memberOf"],
};

const SERVICE_DESCRIPTOR: SearchDescriptor = SearchDescriptor {
    sub_base: "cn=hbacservices,cn=hbac",
    object_class: "ipaHbacService",
    requested_attrs: &["cn", "memberOf"],
};

/// Fetch exactly one host entry by `fqdn`, or an error describing why
/// that wasn't possible.
pub fn fetch_host(client: &mut DirectoryClient, fqdn: &str) -> Result<DirectoryEntry, ObjectError> {
    fetch_one(client, &HOST_DESCRIPTOR, "fqdn", fqdn, "host")
}

/// Fetch exactly one HBAC service entry by `cn` (service name).
pub fn fetch_service(client: &mut DirectoryClient, name: &str) -> Result<DirectoryEntry, ObjectError> {
    fetch_one(client, &SERVICE_DESCRIPTOR, "cn", name, "service")
}

fn fetch_one(
    client: &mut DirectoryClient,
    descriptor: &SearchDescriptor,
    key_attr: &'static str,
    key_value: &str,
    kind: &'static str,
) -> Result<DirectoryEntry, ObjectError> {
    let filter = format!("({key_attr}={key_value})");
    let mut entries = client.search(descriptor, Some(&filter))?;

    if entries.is_empty() {
        return Err(ObjectError::NotFound {
            kind,
            name: key_value.to_string(),
        });
    }
    if entries.len() > 1 {
        return Err(ObjectError::Ambiguous {
            kind,
            name: key_value.to_string(),
            count: entries.len(),
        });
    }

    let entry = entries.remove(0);
    match entry.attrs.single(key_attr) {
        Some(Ok(_)) => Ok(entry),
        Some(Err(_)) | None => Err(ObjectError::MissingAttr {
            kind,
            name: key_value.to_string(),
            attr: key_attr,
        }),
    }
}
