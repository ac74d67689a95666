// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Command-line driver for `hbac-core`: runs one decision activation
//! against real arguments and prints the resulting status, for testing
//! rules against a directory without wiring up a real PAM stack.

use clap::Parser;
use hbac_core::{check_access, ActivationContext, Options, Status};
use std::path::PathBuf;
use std::process::ExitCode;

/// Check whether a user may reach a service on this host, per the
/// configured HBAC rule set.
#[derive(Parser, Debug)]
#[command(name = "hbac-check")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Authenticating user
    user: String,

    /// Service name (e.g. "sshd")
    service: String,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose (debug-level) tracing
    #[arg(long, default_value = "false")]
    debug: bool,

    /// Remote host the user is connecting from, if any (logged only)
    #[arg(long)]
    remote_host: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let ctx = ActivationContext {
        service: args.service,
        user: args.user,
        tty: None,
        remote_user: None,
        remote_host: args.remote_host,
    };
    let options = Options {
        debug: args.debug,
        config: args.config,
    };

    let status = check_access(&ctx, &options);
    println!("{status:?}");

    match status {
        Status::Success => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
