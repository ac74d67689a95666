// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Rule model and materialization.
//!
//! A single [`RuleElement`] plus a [`MemberKind`] tag replaces the
//! teacher-adjacent pattern of parallel per-element-kind code paths: user,
//! service and target-host elements are all matched and built the same
//! way, only the DN container pattern they're checked against differs.

use crate::dn::{self, GroupKind, ObjectKind};
use crate::directory::DirectoryEntry;
use std::collections::BTreeSet;
use thiserror::Error;

/// Which of the three member kinds a rule element represents. Drives
/// which DN container pattern `dn::name_of`/`dn::group_name_of` checks
/// a member DN against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    User,
    Service,
    Host,
}

impl MemberKind {
    fn object_kind(self) -> ObjectKind {
        match self {
            MemberKind::User => ObjectKind::User,
            MemberKind::Service => ObjectKind::Service,
            MemberKind::Host => ObjectKind::Host,
        }
    }

    fn group_kind(self) -> GroupKind {
        match self {
            MemberKind::User => GroupKind::User,
            MemberKind::Service => GroupKind::Service,
            MemberKind::Host => GroupKind::Host,
        }
    }
}

/// One side (user / service / target-host / source-host) of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleElement {
    pub names: BTreeSet<String>,
    pub groups: BTreeSet<String>,
    pub category_all: bool,
}

impl RuleElement {
    fn category_all() -> Self {
        Self {
            category_all: true,
            ..Default::default()
        }
    }

    /// `match(E, name, groups) := E.category_all OR name in E.names OR
    /// groups intersects E.groups`.
    pub fn matches(&self, name: &str, groups: &[String]) -> bool {
        self.category_all
            || self.names.contains(name)
            || groups.iter().any(|g| self.groups.contains(g))
    }
}

/// A normalized, already-validated HBAC rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub enabled: bool,
    pub users: RuleElement,
    pub services: RuleElement,
    pub target_hosts: RuleElement,
    /// Always `category_all` with empty members: source-host matching is
    /// deliberately not honored (see the crate's design notes).
    pub source_hosts: RuleElement,
}

/// A rule-level defect that drops the whole rule from the materialized
/// set. Dropping can only deny additional access, never grant it, which
/// is why materialization treats these as non-fatal for the batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaterializeError {
    #[error("required attribute '{attr}' is missing")]
    MissingRequired { attr: &'static str },

    #[error("'{attr}' has {count} values, expected exactly one")]
    BadCardinality { attr: &'static str, count: usize },

    #[error("'{attr}' value '{value}' is not a recognized enabled flag")]
    BadEnabledFlag { attr: &'static str, value: String },

    #[error("'{attr}' value '{value}' is not a recognized category")]
    BadCategory { attr: &'static str, value: String },

    #[error("rule has accessRuleType '{value}', only allow rules are honored")]
    NotAllowRule { value: String },
}

const RULE_NAME_FALLBACK: &str = "unknown rule name";

/// Materialize one raw directory entry into a normalized [`Rule`].
///
/// On `Err`, the caller must drop the whole rule from the materialized
/// set but keep processing the remaining entries (§4.6). Deny-type rules
/// are dropped here too: the directory schema permits `accessRuleType=deny`
/// but this engine never honors them (§9 "Deny rules ignored"), so a
/// deny-type entry never reaches the evaluator as a `Rule` at all.
pub fn materialize(entry: &DirectoryEntry) -> Result<Rule, MaterializeError> {
    let name = entry
        .attrs
        .first("cn")
        .map(str::to_string)
        .unwrap_or_else(|| RULE_NAME_FALLBACK.to_string());

    check_allow_rule_type(entry)?;
    let enabled = fill_enabled(entry)?;

    let users = fill_element(entry, "memberUser", "userCategory", MemberKind::User)?;
    let services = fill_element(entry, "memberService", "serviceCategory", MemberKind::Service)?;
    let target_hosts = fill_element(entry, "memberHost", "hostCategory", MemberKind::Host)?;

    Ok(Rule {
        name,
        enabled,
        users,
        services,
        target_hosts,
        source_hosts: RuleElement::category_all(),
    })
}

fn check_allow_rule_type(entry: &DirectoryEntry) -> Result<(), MaterializeError> {
    match entry.attrs.single("accessRuleType") {
        None => Err(MaterializeError::MissingRequired {
            attr: "accessRuleType",
        }),
        Some(Err(count)) => Err(MaterializeError::BadCardinality {
            attr: "accessRuleType",
            count,
        }),
        Some(Ok(value)) => {
            if value.eq_ignore_ascii_case("allow") {
                Ok(())
            } else {
                Err(MaterializeError::NotAllowRule {
                    value: value.to_string(),
                })
            }
        }
    }
}

fn fill_enabled(entry: &DirectoryEntry) -> Result<bool, MaterializeError> {
    match entry.attrs.single("ipaEnabledFlag") {
        None => Err(MaterializeError::MissingRequired {
            attr: "ipaEnabledFlag",
        }),
        Some(Err(count)) => Err(MaterializeError::BadCardinality {
            attr: "ipaEnabledFlag",
            count,
        }),
        Some(Ok(value)) => {
            if value.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if value.eq_ignore_ascii_case("false") {
                Ok(false)
            } else {
                Err(MaterializeError::BadEnabledFlag {
                    attr: "ipaEnabledFlag",
                    value: value.to_string(),
                })
            }
        }
    }
}

fn fill_element(
    entry: &DirectoryEntry,
    member_attr: &'static str,
    category_attr: &'static str,
    kind: MemberKind,
) -> Result<RuleElement, MaterializeError> {
    let category_all = match entry.attrs.single(category_attr) {
        None => false,
        Some(Err(count)) => {
            return Err(MaterializeError::BadCardinality {
                attr: category_attr,
                count,
            })
        }
        Some(Ok(value)) => {
            if value.eq_ignore_ascii_case("all") {
                true
            } else {
                return Err(MaterializeError::BadCategory {
                    attr: category_attr,
                    value: value.to_string(),
                });
            }
        }
    };

    let mut names = BTreeSet::new();
    let mut groups = BTreeSet::new();

    if let Some(members) = entry.attrs.get(member_attr) {
        for member_dn in members {
            if let Ok(name) = dn::name_of(member_dn, kind.object_kind()) {
                names.insert(name);
            } else if let Ok(group) = dn::group_name_of(member_dn, kind.group_kind()) {
                groups.insert(group);
            } else {
                log::info!("cannot determine type of member {member_attr}={member_dn}, skipping");
            }
        }
    }

    Ok(RuleElement {
        names,
        groups,
        category_all,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::AttributeBag;
    use std::collections::HashMap;

    fn entry(pairs: &[(&str, &[&str])]) -> DirectoryEntry {
        let mut raw = HashMap::new();
        for (k, vs) in pairs {
            raw.insert(
                k.to_string(),
                vs.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            );
        }
        let all_attrs: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
        DirectoryEntry {
            dn: "cn=rule,cn=hbac,dc=ipa,dc=test".to_string(),
            attrs: AttributeBag::from_ldap_attrs(raw, &all_attrs),
        }
    }

    const BASE: &str = "dc=ipa,dc=test";

    const ALLOW: (&str, &[&str]) = ("accessRuleType", &["allow"]);
    const ENABLED: (&str, &[&str]) = ("ipaEnabledFlag", &["TRUE"]);

    #[test]
    fn missing_name_falls_back() {
        let e = entry(&[ALLOW, ENABLED]);
        let rule = materialize(&e).unwrap();
        assert_eq!(rule.name, RULE_NAME_FALLBACK);
    }

    #[test]
    fn category_all_is_case_insensitive() {
        let e = entry(&[ALLOW, ENABLED, ("hostCategory", &["All"])]);
        let rule = materialize(&e).unwrap();
        assert!(rule.target_hosts.category_all);
    }

    #[test]
    fn bad_enabled_flag_rejects_rule() {
        let e = entry(&[ALLOW, ("ipaEnabledFlag", &["maybe"])]);
        assert!(materialize(&e).is_err());
    }

    #[test]
    fn missing_enabled_flag_rejects_rule() {
        let e = entry(&[ALLOW]);
        assert_eq!(
            materialize(&e).unwrap_err(),
            MaterializeError::MissingRequired {
                attr: "ipaEnabledFlag"
            }
        );
    }

    #[test]
    fn missing_access_rule_type_rejects_rule() {
        let e = entry(&[ENABLED]);
        assert_eq!(
            materialize(&e).unwrap_err(),
            MaterializeError::MissingRequired {
                attr: "accessRuleType"
            }
        );
    }

    #[test]
    fn deny_type_rule_is_dropped() {
        let e = entry(&[("accessRuleType", &["deny"]), ENABLED]);
        assert_eq!(
            materialize(&e).unwrap_err(),
            MaterializeError::NotAllowRule {
                value: "deny".to_string()
            }
        );
    }

    #[test]
    fn access_rule_type_is_case_insensitive() {
        let e = entry(&[("accessRuleType", &["Allow"]), ENABLED]);
        assert!(materialize(&e).is_ok());
    }

    #[test]
    fn bad_category_rejects_rule() {
        let e = entry(&[ALLOW, ENABLED, ("userCategory", &["some"])]);
        assert!(materialize(&e).is_err());
    }

    #[test]
    fn malformed_member_is_dropped_but_rule_survives() {
        let good = format!("uid=alice,cn=users,cn=accounts,{BASE}");
        let e = entry(&[
            ALLOW,
            ENABLED,
            ("memberUser", &[good.as_str(), "not a dn at all"]),
        ]);
        let rule = materialize(&e).unwrap();
        assert_eq!(rule.users.names.len(), 1);
        assert!(rule.users.names.contains("alice"));
    }

    #[test]
    fn member_dn_classified_as_name_or_group() {
        let user_dn = format!("uid=alice,cn=users,cn=accounts,{BASE}");
        let group_dn = format!("cn=admins,cn=groups,cn=accounts,{BASE}");
        let e = entry(&[
            ALLOW,
            ENABLED,
            ("memberUser", &[user_dn.as_str(), group_dn.as_str()]),
        ]);
        let rule = materialize(&e).unwrap();
        assert!(rule.users.names.contains("alice"));
        assert!(rule.users.groups.contains("admins"));
    }

    #[test]
    fn source_hosts_is_always_synthetic_category_all() {
        let e = entry(&[ALLOW, ENABLED]);
        let rule = materialize(&e).unwrap();
        assert!(rule.source_hosts.category_all);
        assert!(rule.source_hosts.names.is_empty());
        assert!(rule.source_hosts.groups.is_empty());
    }

    #[test]
    fn element_match_semantics() {
        let el = RuleElement {
            names: ["alice".to_string()].into_iter().collect(),
            groups: ["admins".to_string()].into_iter().collect(),
            category_all: false,
        };
        assert!(el.matches("alice", &[]));
        assert!(el.matches("bob", &["admins".to_string()]));
        assert!(!el.matches("bob", &["users".to_string()]));

        let all = RuleElement::category_all();
        assert!(all.matches("anyone", &[]));
    }
}
