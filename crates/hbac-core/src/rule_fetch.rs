// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Rule fetcher: retrieves every `ipaHbacRule` entry under the rules
//! container and materializes it.
//!
//! Unlike the original implementation, filtering by target host
//! membership is not pushed down into the directory filter: the whole
//! rule set for the search base is fetched and [`crate::rule::Rule::matches`]
//! (via the evaluator) decides applicability locally. This keeps the
//! directory-facing filter trivial (object class only) and the matching
//! logic in one place. Deny-type entries are still excluded -- just in
//! [`crate::rule::materialize`] rather than the LDAP filter string --
//! and disabled entries are kept but skipped later, by the evaluator.

use crate::directory::{DirectoryClient, DirectoryError, SearchDescriptor};
use crate::rule::{self, Rule};

const RULE_DESCRIPTOR: SearchDescriptor = SearchDescriptor {
    sub_base: "cn=hbac",
    object_class: "ipaHbacRule",
    requested_attrs: &[
        "cn",
        "ipaEnabledFlag",
        "accessRuleType",
        "memberUser",
        "userCategory",
        "memberService",
        "serviceCategory",
        "memberHost",
        "hostCategory",
    ],
};

/// Fetch and materialize every HBAC rule. A malformed individual rule is
/// logged and dropped; the rest of the fetch still succeeds (§4.6).
pub fn fetch_rules(client: &mut DirectoryClient) -> Result<Vec<Rule>, DirectoryError> {
    let entries = client.search(&RULE_DESCRIPTOR, None)?;

    let mut rules = Vec::with_capacity(entries.len());
    for entry in &entries {
        match rule::materialize(entry) {
            Ok(rule) => rules.push(rule),
            Err(e) => log::warn!("dropping malformed rule at '{}': {e}", entry.dn),
        }
    }

    Ok(rules)
}
