use std::collections::BTreeSet;

use crate::{
    AccessMode, CatalogRule, CatalogSchemaName, CatalogSchemaRoutineName, CatalogSchemaTableName,
    CatalogSessionPropertyRule, FunctionPrivilege, FunctionRule, Identity, ImpersonationRule,
    PrincipalUserMatchRule, QueryAccess, QueryAccessRule, SchemaRule, SessionPropertyRule,
    SystemInformationAccess, SystemInformationRule, TablePrivilege, TableRule,
};

/// Scan `rules` in order and return the outcome of the first rule that
/// matches. Later rules are never consulted, even if they also match.
pub(crate) fn first_match<'r, R, T>(
    rules: &'r [R],
    outcome: impl FnMut(&'r R) -> Option<T>,
) -> Option<T> {
    rules.iter().find_map(outcome)
}

pub(crate) fn catalog_access(
    rules: &[CatalogRule],
    identity: &Identity,
    catalog: &str,
) -> AccessMode {
    first_match(rules, |rule| rule.match_mode(identity, catalog)).unwrap_or(AccessMode::None)
}

pub(crate) fn schema_owner(
    rules: &[SchemaRule],
    identity: &Identity,
    schema: &CatalogSchemaName,
) -> bool {
    first_match(rules, |rule| rule.match_owner(identity, schema)).unwrap_or(false)
}

pub(crate) fn table_privileges<'r>(
    rules: &'r [TableRule],
    identity: &Identity,
    table: &CatalogSchemaTableName,
) -> Option<&'r BTreeSet<TablePrivilege>> {
    first_match(rules, |rule| rule.match_privileges(identity, table))
}

pub(crate) fn session_property(
    rules: &[SessionPropertyRule],
    identity: &Identity,
    property: &str,
) -> bool {
    first_match(rules, |rule| rule.match_allow(identity, property)).unwrap_or(false)
}

pub(crate) fn catalog_session_property(
    rules: &[CatalogSessionPropertyRule],
    identity: &Identity,
    catalog: &str,
    property: &str,
) -> bool {
    first_match(rules, |rule| rule.match_allow(identity, catalog, property)).unwrap_or(false)
}

pub(crate) fn function_privileges<'r>(
    rules: &'r [FunctionRule],
    identity: &Identity,
    function: &CatalogSchemaRoutineName,
) -> Option<&'r BTreeSet<FunctionPrivilege>> {
    first_match(rules, |rule| rule.match_privileges(identity, function))
}

pub(crate) fn query_access<'r>(
    rules: &'r [QueryAccessRule],
    identity: &Identity,
    owner: Option<&str>,
) -> Option<&'r BTreeSet<QueryAccess>> {
    first_match(rules, |rule| rule.match_access(identity, owner))
}

pub(crate) fn impersonation(
    rules: &[ImpersonationRule],
    identity: &Identity,
    new_user: &str,
) -> bool {
    first_match(rules, |rule| rule.match_allow(identity, new_user)).unwrap_or(false)
}

pub(crate) fn principal_user_match(
    rules: &[PrincipalUserMatchRule],
    principal: &str,
    user: &str,
) -> bool {
    first_match(rules, |rule| rule.match_allow(principal, user)).unwrap_or(false)
}

pub(crate) fn system_information<'r>(
    rules: &'r [SystemInformationRule],
    identity: &Identity,
) -> Option<&'r BTreeSet<SystemInformationAccess>> {
    first_match(rules, |rule| rule.match_access(identity))
}
