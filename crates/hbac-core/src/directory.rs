// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Directory access layer: bounded subtree searches over LDAPv3, parsed
//! into owned [`DirectoryEntry`] values.
//!
//! Connection bring-up, search, and teardown all happen inside one
//! activation; there is no pooling or cross-activation reuse (see the
//! crate's concurrency notes). Built on `ldap3`'s blocking (`sync`
//! feature) client so the whole core stays single-threaded and
//! non-async, matching the one-shot nature of a PAM callback.

use crate::config::Config;
use ldap3::{LdapConn, LdapConnSettings, Scope, SearchEntry};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Directory-layer errors.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    #[error("directory I/O error: {0}")]
    Io(String),

    #[error("internal directory client error: {0}")]
    Internal(String),
}

/// A read-only, case-insensitive mapping from attribute name to an
/// ordered sequence of values, already filtered down to the attributes a
/// search descriptor requested.
#[derive(Debug, Clone, Default)]
pub struct AttributeBag {
    values: HashMap<String, Vec<String>>,
}

impl AttributeBag {
    pub(crate) fn from_ldap_attrs(attrs: HashMap<String, Vec<String>>, requested: &[&str]) -> Self {
        let mut values = HashMap::with_capacity(requested.len());
        for (name, vals) in attrs {
            if requested.iter().any(|r| r.eq_ignore_ascii_case(&name)) {
                values.insert(name.to_ascii_lowercase(), vals);
            }
        }
        Self { values }
    }

    /// All values for `name`, or `None` if the attribute was absent.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.values.get(&name.to_ascii_lowercase()).map(Vec::as_slice)
    }

    /// The first value for `name`, if present.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// Require that `name` has exactly one value and return it, or
    /// `None` if absent and `Some(Err)` semantics via `Result` if
    /// present with the wrong cardinality.
    pub fn single(&self, name: &str) -> Option<Result<&str, usize>> {
        self.get(name).map(|v| {
            if v.len() == 1 {
                Ok(v[0].as_str())
            } else {
                Err(v.len())
            }
        })
    }
}

/// One directory entry: its DN plus the attribute values a search
/// descriptor asked for.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attrs: AttributeBag,
}

/// What to search for: a subtree base (relative to the configured base
/// DN), the object class it must carry, and the attributes to keep.
pub struct SearchDescriptor {
    pub sub_base: &'static str,
    pub object_class: &'static str,
    pub requested_attrs: &'static [&'static str],
}

/// A bound connection to the directory, scoped to one activation.
pub struct DirectoryClient {
    conn: LdapConn,
    base_dn: String,
    timeout: Duration,
}

impl DirectoryClient {
    /// Bring up a connection: TCP + optional TLS, protocol v3, simple
    /// bind. Teardown (via `Drop`) happens even if a later step in the
    /// pipeline fails.
    pub fn connect(config: &Config) -> Result<Self, DirectoryError> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let mut settings = LdapConnSettings::new().set_conn_timeout(timeout);
        if config.secure {
            settings = settings.set_starttls(!config.uri.starts_with("ldaps://"));
            if let Some(ca_cert) = &config.ca_cert {
                settings = settings.set_ca_cert_file(ca_cert);
            }
        } else {
            settings = settings.set_no_tls_verify(true);
        }

        let mut conn = LdapConn::with_settings(settings, &config.uri)
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        conn.simple_bind(&config.bind_dn, config.bind_pw.expose())
            .and_then(|r| r.success())
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        Ok(Self {
            conn,
            base_dn: config.search_base.clone(),
            timeout,
        })
    }

    /// Run a bounded subtree search, filtered by object class and
    /// (optionally) an additional caller-supplied filter fragment.
    ///
    /// Never returns more entries than the directory actually sent;
    /// never returns `Err` for "no matches" -- that's an empty `Vec`.
    pub fn search(
        &mut self,
        descriptor: &SearchDescriptor,
        extra_filter: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let base = format!("{},{}", descriptor.sub_base, self.base_dn);
        let filter = match extra_filter {
            Some(f) => format!("(&(objectClass={}){})", descriptor.object_class, f),
            None => format!("(objectClass={})", descriptor.object_class),
        };

        let (raw_entries, _result) = self
            .conn
            .with_timeout(self.timeout)
            .search(&base, Scope::Subtree, &filter, descriptor.requested_attrs)
            .map_err(|e| DirectoryError::Io(e.to_string()))?
            .success()
            .map_err(|e| DirectoryError::Io(e.to_string()))?;

        let mut entries = Vec::with_capacity(raw_entries.len());
        for raw in raw_entries {
            let parsed = SearchEntry::construct(raw);

            let has_class = parsed
                .attrs
                .get("objectClass")
                .into_iter()
                .flatten()
                .any(|v| v.eq_ignore_ascii_case(descriptor.object_class));
            if !has_class {
                log::info!(
                    "skipping entry {} lacking expected object class {}",
                    parsed.dn,
                    descriptor.object_class
                );
                continue;
            }

            entries.push(DirectoryEntry {
                dn: parsed.dn,
                attrs: AttributeBag::from_ldap_attrs(parsed.attrs, descriptor.requested_attrs),
            });
        }

        Ok(entries)
    }
}

impl Drop for DirectoryClient {
    fn drop(&mut self) {
        let _ = self.conn.unbind();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(pairs: &[(&str, &[&str])]) -> AttributeBag {
        let mut values = HashMap::new();
        for (k, vs) in pairs {
            values.insert(
                k.to_ascii_lowercase(),
                vs.iter().map(|s| s.to_string()).collect(),
            );
        }
        AttributeBag { values }
    }

    #[test]
    fn get_is_case_insensitive() {
        let b = bag(&[("memberOf", &["cn=admins,cn=groups"])]);
        assert_eq!(b.get("MEMBEROF").unwrap(), ["cn=admins,cn=groups"]);
    }

    #[test]
    fn single_reports_cardinality_violations() {
        let one = bag(&[("cn", &["sshd"])]);
        assert_eq!(one.single("cn"), Some(Ok("sshd")));

        let two = bag(&[("cn", &["sshd", "ftp"])]);
        assert_eq!(two.single("cn"), Some(Err(2)));

        assert_eq!(one.single("missing"), None);
    }

    #[test]
    fn from_ldap_attrs_drops_unrequested_and_lowercases_keys() {
        let mut raw = HashMap::new();
        raw.insert("fqdn".to_string(), vec!["client.ipa.test".to_string()]);
        raw.insert("description".to_string(), vec!["irrelevant".to_string()]);

        let b = AttributeBag::from_ldap_attrs(raw, &["fqdn", "memberOf"]);
        assert_eq!(b.first("fqdn"), Some("client.ipa.test"));
        assert_eq!(b.get("description"), None);
    }
}
