// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Decision-engine configuration.
//!
//! Loaded once per activation from a `KEY = VALUE` text file; never
//! cached across activations (see the crate's concurrency notes).

use crate::secret::SecretString;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: missing '=' separator")]
    MissingSeparator { line: usize },

    #[error("missing required option '{0}'")]
    MissingRequired(&'static str),
}

const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Decision-engine configuration, immutable for the duration of one
/// activation.
#[derive(Clone)]
pub struct Config {
    pub uri: String,
    pub search_base: String,
    pub bind_dn: String,
    pub bind_pw: SecretString,
    pub ca_cert: Option<String>,
    pub secure: bool,
    pub hostname: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("uri", &self.uri)
            .field("search_base", &self.search_base)
            .field("bind_dn", &self.bind_dn)
            .field("bind_pw", &self.bind_pw)
            .field("ca_cert", &self.ca_cert)
            .field("secure", &self.secure)
            .field("hostname", &self.hostname)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Builder-style accumulator for the raw `KEY = VALUE` pairs seen while
/// parsing, before required-field validation.
#[derive(Default)]
struct RawOptions {
    uri: Option<String>,
    search_base: Option<String>,
    bind_dn: Option<String>,
    bind_pw: Option<String>,
    ca_cert: Option<String>,
    secure: Option<bool>,
    hostname: Option<String>,
    timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from a `KEY = VALUE` text file.
    ///
    /// Comment (`#`-prefixed) and blank lines are skipped. Unknown keys
    /// are ignored. A line with content but no `=` separator is fatal.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from already-loaded text, applying system
    /// hostname as the default when `hostname` is unset.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut raw = RawOptions::default();

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or(ConfigError::MissingSeparator { line: idx + 1 })?;
            let key = key.trim();
            let value = value.trim();

            match key.to_ascii_lowercase().as_str() {
                "uri" => raw.uri = Some(value.to_string()),
                "search_base" => raw.search_base = Some(value.to_string()),
                "bind_dn" => raw.bind_dn = Some(value.to_string()),
                "bind_pw" => raw.bind_pw = Some(value.to_string()),
                "ca_cert" => raw.ca_cert = Some(value.to_string()),
                "secure" => raw.secure = parse_bool(value),
                "hostname" => raw.hostname = Some(value.to_string()),
                "timeout" => raw.timeout_secs = value.parse().ok(),
                _ => {
                    log::debug!("ignoring unknown configuration key '{key}'");
                }
            }
        }

        Ok(Config {
            uri: raw.uri.ok_or(ConfigError::MissingRequired("uri"))?,
            search_base: raw
                .search_base
                .ok_or(ConfigError::MissingRequired("search_base"))?,
            bind_dn: raw.bind_dn.ok_or(ConfigError::MissingRequired("bind_dn"))?,
            bind_pw: SecretString::new(
                raw.bind_pw.ok_or(ConfigError::MissingRequired("bind_pw"))?,
            ),
            ca_cert: raw.ca_cert,
            secure: raw.secure.unwrap_or(true),
            hostname: raw.hostname.unwrap_or_else(default_hostname),
            timeout_secs: raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Dump the non-secret option values back to `KEY = VALUE` text, for
    /// diagnostics and for the load/dump/reload round-trip test.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("uri = {}\n", self.uri));
        out.push_str(&format!("search_base = {}\n", self.search_base));
        out.push_str(&format!("bind_dn = {}\n", self.bind_dn));
        if let Some(ca) = &self.ca_cert {
            out.push_str(&format!("ca_cert = {ca}\n"));
        }
        out.push_str(&format!(
            "secure = {}\n",
            if self.secure { "TRUE" } else { "FALSE" }
        ));
        out.push_str(&format!("hostname = {}\n", self.hostname));
        out.push_str(&format!("timeout = {}\n", self.timeout_secs));
        out
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_uppercase().as_str() {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

fn default_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# a comment
uri = ldap://dir.ipa.test
search_base = dc=ipa,dc=test
bind_dn = uid=svc,cn=users,cn=accounts,dc=ipa,dc=test
bind_pw = s3cr3t

secure = FALSE
timeout = 7
unknown_option = ignored
";

    #[test]
    fn parses_recognized_options() {
        let cfg = Config::parse(SAMPLE).unwrap();
        assert_eq!(cfg.uri, "ldap://dir.ipa.test");
        assert_eq!(cfg.search_base, "dc=ipa,dc=test");
        assert_eq!(cfg.bind_pw.expose(), "s3cr3t");
        assert!(!cfg.secure);
        assert_eq!(cfg.timeout_secs, 7);
    }

    #[test]
    fn missing_separator_is_fatal() {
        let err = Config::parse("bind_dn uid=svc").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSeparator { line: 1 }));
    }

    #[test]
    fn missing_required_option_is_fatal() {
        let err = Config::parse("uri = ldap://x\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired("search_base")));
    }

    #[test]
    fn secure_defaults_true_and_timeout_defaults_five() {
        let minimal = "\
uri = ldap://dir.ipa.test
search_base = dc=ipa,dc=test
bind_dn = cn=svc
bind_pw = pw
";
        let cfg = Config::parse(minimal).unwrap();
        assert!(cfg.secure);
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn dump_then_reparse_round_trips_non_secret_values() {
        let cfg = Config::parse(SAMPLE).unwrap();
        let dumped = cfg.dump();
        let mut reloaded_src = dumped.clone();
        reloaded_src.push_str("bind_pw = s3cr3t\n");
        let reloaded = Config::parse(&reloaded_src).unwrap();

        assert_eq!(cfg.uri, reloaded.uri);
        assert_eq!(cfg.search_base, reloaded.search_base);
        assert_eq!(cfg.bind_dn, reloaded.bind_dn);
        assert_eq!(cfg.secure, reloaded.secure);
        assert_eq!(cfg.hostname, reloaded.hostname);
        assert_eq!(cfg.timeout_secs, reloaded.timeout_secs);
    }

    #[test]
    fn debug_never_prints_bind_pw() {
        let cfg = Config::parse(SAMPLE).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("s3cr3t"));
    }
}
