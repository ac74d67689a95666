// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The rule evaluator: OR-over-rules matching of a request triple
//! against the materialized rule set.

use crate::request::EvalRequest;
use crate::rule::Rule;

/// Outcome of evaluating a request against a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    /// A structural defect was hit mid-evaluation that should never
    /// happen given an already-materialized rule set; carries a short
    /// description for the log line.
    Error(String),
    /// Allocation failed while building the matching state for a rule.
    /// The allocator aborts the process on real exhaustion in safe Rust,
    /// so this is unreachable in practice; kept so the decision shim's
    /// status mapping stays total over the same four outcomes the
    /// original evaluator could produce.
    OutOfMemory,
}

/// Evaluate `request` against `rules`.
///
/// Disabled rules never match. A matching rule requires all three
/// elements -- user, service, target host -- to match simultaneously;
/// source-host is a synthetic `category_all` and never gates anything
/// (see the crate's design notes). Returns `Allow` on the first match,
/// `Deny` if the rule set is exhausted without one.
pub fn evaluate(request: &EvalRequest, rules: &[Rule]) -> Decision {
    for rule in rules {
        if !rule.enabled {
            continue;
        }

        let users_match = request.user.matches(&rule.users);
        let services_match = request.service.matches(&rule.services);
        let hosts_match = request.target_host.matches(&rule.target_hosts);

        if users_match && services_match && hosts_match {
            log::info!("rule '{}' matched, decision: allow", rule.name);
            return Decision::Allow;
        }
    }

    log::info!("no rule matched, decision: deny");
    Decision::Deny
}
