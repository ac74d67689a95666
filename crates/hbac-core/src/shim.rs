// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Decision shim: the one entry point the authentication stack calls,
//! wiring every other stage together and mapping the evaluator's
//! decision (or any earlier failure) down to an authentication-stack
//! status code.

use crate::config::Config;
use crate::directory::{DirectoryClient, DirectoryError};
use crate::dn::GroupKind;
use crate::error::HbacError;
use crate::evaluator::{self, Decision};
use crate::identity::{self, IdentityError};
use crate::objects::{self, ObjectError};
use crate::request::{self, EvalRequest};
use crate::rule_fetch;
use std::path::PathBuf;

const ROOT_USER: &str = "root";
const DEFAULT_CONFIG_PATH: &str = "/etc/hbac.conf";

/// The subset of the authentication event the shim needs; everything
/// else (TTY, remote user/host) is logged but never evaluated.
#[derive(Debug, Clone)]
pub struct ActivationContext {
    pub service: String,
    pub user: String,
    pub tty: Option<String>,
    pub remote_user: Option<String>,
    pub remote_host: Option<String>,
}

/// Per-activation options supplied by the authentication stack.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub debug: bool,
    pub config: Option<PathBuf>,
}

/// Authentication-stack status codes the shim can return (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    AuthDenied,
    BufferError,
    SystemError,
    AuthinfoUnavailable,
    UserUnknown,
    PermissionDenied,
}

/// Run one full decision activation: identity resolution, directory
/// fetch, rule materialization, evaluation, and status mapping.
///
/// Never returns `Allow`-equivalent status when the directory is
/// unavailable, and never leaves `ctx.user == "root"` hit the
/// directory at all.
pub fn check_access(ctx: &ActivationContext, options: &Options) -> Status {
    if options.debug {
        log::debug!("activation start: user={}, service={}", ctx.user, ctx.service);
    }
    if let Some(tty) = &ctx.tty {
        log::info!("tty={tty}");
    }
    if let Some(remote_user) = &ctx.remote_user {
        log::info!("remote_user={remote_user}");
    }
    if let Some(remote_host) = &ctx.remote_host {
        log::info!("remote_host={remote_host}");
    }

    if ctx.user == ROOT_USER {
        log::info!("user is '{ROOT_USER}', short-circuiting without directory contact");
        return Status::UserUnknown;
    }

    match run(ctx, options) {
        Ok(status) => status,
        Err(e) => status_for_error(&e),
    }
}

/// The part of `check_access` past the root short-circuit, written with
/// `?` against the crate-wide [`HbacError`] so every stage's own error
/// enum converts into it instead of being matched out by hand here.
fn run(ctx: &ActivationContext, options: &Options) -> Result<Status, HbacError> {
    let config_path = options
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = Config::from_file(&config_path)?;

    let user = identity::resolve(&ctx.user)?;

    let mut client = DirectoryClient::connect(&config)?;

    let host_entry = objects::fetch_host(&mut client, &config.hostname)?;
    let service_entry = objects::fetch_service(&mut client, &ctx.service)?;

    let target_host = request::entry_element(&host_entry, "fqdn", GroupKind::Host).ok_or_else(|| {
        HbacError::Object(ObjectError::MissingAttr {
            kind: "host",
            name: config.hostname.clone(),
            attr: "fqdn",
        })
    })?;
    let service = request::entry_element(&service_entry, "cn", GroupKind::Service).ok_or_else(|| {
        HbacError::Object(ObjectError::MissingAttr {
            kind: "service",
            name: ctx.service.clone(),
            attr: "cn",
        })
    })?;

    let rules = rule_fetch::fetch_rules(&mut client)?;

    let request = EvalRequest {
        user: request::user_element(&user),
        service,
        target_host,
    };

    let status = match evaluator::evaluate(&request, &rules) {
        Decision::Allow => {
            log::info!("access allowed for '{}' to '{}'", ctx.user, ctx.service);
            Status::Success
        }
        Decision::Deny => {
            log::info!("access denied for '{}' to '{}'", ctx.user, ctx.service);
            Status::AuthDenied
        }
        Decision::Error(reason) => {
            log::error!("evaluator structural error: {reason}");
            Status::SystemError
        }
        Decision::OutOfMemory => {
            log::error!("evaluator ran out of memory");
            Status::BufferError
        }
    };
    Ok(status)
}

fn status_for_error(error: &HbacError) -> Status {
    match error {
        HbacError::Config(e) => {
            log::error!("unreadable configuration: {e}");
            Status::SystemError
        }
        HbacError::Identity(IdentityError::UnknownUser(name)) => {
            log::warn!("unknown user '{name}'");
            Status::UserUnknown
        }
        HbacError::Directory(e) => directory_error_status(e),
        HbacError::Object(e) => object_error_status(e),
    }
}

fn directory_error_status(error: &DirectoryError) -> Status {
    match error {
        DirectoryError::Unavailable(msg) => {
            log::warn!("directory unavailable: {msg}");
            Status::AuthinfoUnavailable
        }
        DirectoryError::Io(msg) | DirectoryError::Internal(msg) => {
            log::error!("directory error: {msg}");
            Status::SystemError
        }
    }
}

fn object_error_status(error: &ObjectError) -> Status {
    match error {
        ObjectError::Directory(e) => directory_error_status(e),
        ObjectError::NotFound { kind, name } => {
            log::warn!("no such {kind} '{name}'");
            Status::PermissionDenied
        }
        ObjectError::Ambiguous { kind, name, count } => {
            log::warn!("{count} entries for {kind} '{name}', expected one");
            Status::SystemError
        }
        ObjectError::MissingAttr { kind, name, attr } => {
            log::error!("{kind} '{name}' missing '{attr}'");
            Status::SystemError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_short_circuits_without_touching_config() {
        let ctx = ActivationContext {
            service: "sshd".to_string(),
            user: ROOT_USER.to_string(),
            tty: None,
            remote_user: None,
            remote_host: None,
        };
        let options = Options {
            debug: false,
            config: Some(PathBuf::from("/nonexistent/path/never/read.conf")),
        };
        assert_eq!(check_access(&ctx, &options), Status::UserUnknown);
    }

    #[test]
    fn s7_ambiguous_host_maps_to_system_error() {
        let err = ObjectError::Ambiguous {
            kind: "host",
            name: "client.ipa.test".to_string(),
            count: 2,
        };
        assert_eq!(object_error_status(&err), Status::SystemError);
    }

    #[test]
    fn unreadable_config_is_system_error() {
        let ctx = ActivationContext {
            service: "sshd".to_string(),
            user: "nonexistent-test-user".to_string(),
            tty: None,
            remote_user: None,
            remote_host: None,
        };
        let options = Options {
            debug: false,
            config: Some(PathBuf::from("/nonexistent/path/never/exists.conf")),
        };
        assert_eq!(check_access(&ctx, &options), Status::SystemError);
    }
}
