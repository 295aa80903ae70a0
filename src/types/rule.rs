use std::collections::BTreeSet;

use serde::Deserialize;

use super::identity::Identity;
use super::pattern::{matches, Pattern};
use super::resource::{CatalogSchemaName, CatalogSchemaRoutineName, CatalogSchemaTableName};

/// How much of a catalog a principal may use.
///
/// Ordered so that `None < ReadOnly < All`; a check that needs `ReadOnly`
/// is satisfied by `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(from = "AccessModeRepr")]
pub enum AccessMode {
    None,
    ReadOnly,
    All,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AccessModeRepr {
    Flag(bool),
    Named(AccessModeName),
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
enum AccessModeName {
    All,
    ReadOnly,
    None,
}

impl From<AccessModeRepr> for AccessMode {
    fn from(repr: AccessModeRepr) -> Self {
        match repr {
            AccessModeRepr::Flag(true) | AccessModeRepr::Named(AccessModeName::All) => {
                AccessMode::All
            }
            AccessModeRepr::Named(AccessModeName::ReadOnly) => AccessMode::ReadOnly,
            AccessModeRepr::Flag(false) | AccessModeRepr::Named(AccessModeName::None) => {
                AccessMode::None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TablePrivilege {
    Select,
    Insert,
    Delete,
    Update,
    Ownership,
    GrantSelect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionPrivilege {
    Execute,
    GrantExecute,
    Ownership,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryAccess {
    Execute,
    View,
    Kill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemInformationAccess {
    Read,
    Write,
}

fn default_allow() -> bool {
    true
}

/// Grants an [`AccessMode`] on matching catalogs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogRule {
    pub user: Option<Pattern>,
    pub role: Option<Pattern>,
    pub group: Option<Pattern>,
    pub catalog: Option<Pattern>,
    pub allow: AccessMode,
}

impl CatalogRule {
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            user: None,
            role: None,
            group: None,
            catalog: None,
            allow: AccessMode::All,
        }
    }

    /// Full access to the catalog named `system`, for anyone.
    pub(crate) fn system_catalog() -> Self {
        Self {
            catalog: Some(Pattern::literal("system")),
            ..Self::allow_all()
        }
    }

    pub(crate) fn match_mode(&self, identity: &Identity, catalog: &str) -> Option<AccessMode> {
        (identity.matches(self.user.as_ref(), self.role.as_ref(), self.group.as_ref())
            && matches(self.catalog.as_ref(), catalog))
        .then_some(self.allow)
    }
}

/// Decides schema ownership on matching schemas.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaRule {
    pub user: Option<Pattern>,
    pub role: Option<Pattern>,
    pub group: Option<Pattern>,
    pub catalog: Option<Pattern>,
    pub schema: Option<Pattern>,
    pub owner: bool,
}

impl SchemaRule {
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            user: None,
            role: None,
            group: None,
            catalog: None,
            schema: None,
            owner: true,
        }
    }

    pub(crate) fn match_owner(
        &self,
        identity: &Identity,
        schema: &CatalogSchemaName,
    ) -> Option<bool> {
        (identity.matches(self.user.as_ref(), self.role.as_ref(), self.group.as_ref())
            && matches(self.catalog.as_ref(), &schema.catalog)
            && matches(self.schema.as_ref(), &schema.schema))
        .then_some(self.owner)
    }
}

/// Grants table privileges on matching tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableRule {
    pub user: Option<Pattern>,
    pub role: Option<Pattern>,
    pub group: Option<Pattern>,
    pub catalog: Option<Pattern>,
    pub schema: Option<Pattern>,
    pub table: Option<Pattern>,
    pub privileges: BTreeSet<TablePrivilege>,
}

impl TableRule {
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            user: None,
            role: None,
            group: None,
            catalog: None,
            schema: None,
            table: None,
            privileges: BTreeSet::from([
                TablePrivilege::Select,
                TablePrivilege::Insert,
                TablePrivilege::Delete,
                TablePrivilege::Update,
                TablePrivilege::Ownership,
                TablePrivilege::GrantSelect,
            ]),
        }
    }

    pub(crate) fn match_privileges(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> Option<&BTreeSet<TablePrivilege>> {
        (identity.matches(self.user.as_ref(), self.role.as_ref(), self.group.as_ref())
            && matches(self.catalog.as_ref(), &table.catalog)
            && matches(self.schema.as_ref(), &table.schema)
            && matches(self.table.as_ref(), &table.table))
        .then_some(&self.privileges)
    }
}

/// Allows or denies setting matching system session properties.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionPropertyRule {
    pub user: Option<Pattern>,
    pub role: Option<Pattern>,
    pub group: Option<Pattern>,
    pub property: Option<Pattern>,
    pub allow: bool,
}

impl SessionPropertyRule {
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            user: None,
            role: None,
            group: None,
            property: None,
            allow: true,
        }
    }

    pub(crate) fn match_allow(&self, identity: &Identity, property: &str) -> Option<bool> {
        (identity.matches(self.user.as_ref(), self.role.as_ref(), self.group.as_ref())
            && matches(self.property.as_ref(), property))
        .then_some(self.allow)
    }
}

/// Allows or denies setting matching catalog session properties.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSessionPropertyRule {
    pub user: Option<Pattern>,
    pub role: Option<Pattern>,
    pub group: Option<Pattern>,
    pub catalog: Option<Pattern>,
    pub property: Option<Pattern>,
    pub allow: bool,
}

impl CatalogSessionPropertyRule {
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            user: None,
            role: None,
            group: None,
            catalog: None,
            property: None,
            allow: true,
        }
    }

    pub(crate) fn match_allow(
        &self,
        identity: &Identity,
        catalog: &str,
        property: &str,
    ) -> Option<bool> {
        (identity.matches(self.user.as_ref(), self.role.as_ref(), self.group.as_ref())
            && matches(self.catalog.as_ref(), catalog)
            && matches(self.property.as_ref(), property))
        .then_some(self.allow)
    }
}

/// Grants function privileges on matching functions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionRule {
    pub user: Option<Pattern>,
    pub role: Option<Pattern>,
    pub group: Option<Pattern>,
    pub catalog: Option<Pattern>,
    pub schema: Option<Pattern>,
    pub function: Option<Pattern>,
    pub privileges: BTreeSet<FunctionPrivilege>,
}

impl FunctionRule {
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            user: None,
            role: None,
            group: None,
            catalog: None,
            schema: None,
            function: None,
            privileges: BTreeSet::from([
                FunctionPrivilege::Execute,
                FunctionPrivilege::GrantExecute,
                FunctionPrivilege::Ownership,
            ]),
        }
    }

    pub(crate) fn match_privileges(
        &self,
        identity: &Identity,
        function: &CatalogSchemaRoutineName,
    ) -> Option<&BTreeSet<FunctionPrivilege>> {
        (identity.matches(self.user.as_ref(), self.role.as_ref(), self.group.as_ref())
            && matches(self.catalog.as_ref(), &function.catalog)
            && matches(self.schema.as_ref(), &function.schema)
            && matches(self.function.as_ref(), &function.routine))
        .then_some(&self.privileges)
    }
}

/// Grants execute/view/kill access to queries, optionally scoped to the
/// queries of matching owners.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryAccessRule {
    pub user: Option<Pattern>,
    pub role: Option<Pattern>,
    pub group: Option<Pattern>,
    #[serde(rename = "queryOwner")]
    pub query_owner: Option<Pattern>,
    pub allow: BTreeSet<QueryAccess>,
}

impl QueryAccessRule {
    /// `owner` is `None` when the check is not about an existing query
    /// (executing a new one); rules scoped to an owner never match then.
    pub(crate) fn match_access(
        &self,
        identity: &Identity,
        owner: Option<&str>,
    ) -> Option<&BTreeSet<QueryAccess>> {
        let owner_matches = match (&self.query_owner, owner) {
            (None, _) => true,
            (Some(pattern), Some(owner)) => pattern.is_match(owner),
            (Some(_), None) => false,
        };
        (owner_matches
            && identity.matches(self.user.as_ref(), self.role.as_ref(), self.group.as_ref()))
        .then_some(&self.allow)
    }
}

/// Allows or denies a user switching to another user name.
///
/// `new_user` may reference capture groups of `original_user` as `$1`, `$2`...
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImpersonationRule {
    pub original_user: Option<Pattern>,
    pub original_role: Option<Pattern>,
    pub new_user: Pattern,
    #[serde(default = "default_allow")]
    pub allow: bool,
}

impl ImpersonationRule {
    pub(crate) fn match_allow(&self, identity: &Identity, new_user: &str) -> Option<bool> {
        if !identity.matches(None, self.original_role.as_ref(), None) {
            return None;
        }
        let original = match &self.original_user {
            Some(original) => original,
            None => return self.new_user.is_match(new_user).then_some(self.allow),
        };
        if !self.new_user.has_group_references() {
            let matched = original.is_match(identity.user()) && self.new_user.is_match(new_user);
            return matched.then_some(self.allow);
        }
        // The target depends on the caller's name, so it is compiled per check.
        let expanded = original.expand(identity.user(), self.new_user.as_str())?;
        match Pattern::new(&expanded) {
            Ok(pattern) => pattern.is_match(new_user).then_some(self.allow),
            Err(error) => {
                tracing::warn!(
                    pattern = %expanded,
                    %error,
                    "impersonation target does not compile"
                );
                None
            }
        }
    }
}

/// Maps an authenticated principal to the user names it may act as.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrincipalUserMatchRule {
    pub principal: Pattern,
    pub user: Option<Pattern>,
    pub principal_to_user: Option<String>,
    #[serde(default = "default_allow")]
    pub allow: bool,
}

impl PrincipalUserMatchRule {
    pub(crate) fn match_allow(&self, principal: &str, user: &str) -> Option<bool> {
        if !self.principal.is_match(principal) {
            return None;
        }
        if self.user.as_ref().is_some_and(|p| p.is_match(user)) {
            return Some(self.allow);
        }
        let mapped = self
            .principal_to_user
            .as_deref()
            .and_then(|template| self.principal.expand(principal, template))?;
        (mapped == user).then_some(self.allow)
    }
}

/// Grants read/write access to system information.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemInformationRule {
    pub user: Option<Pattern>,
    pub role: Option<Pattern>,
    pub group: Option<Pattern>,
    pub allow: BTreeSet<SystemInformationAccess>,
}

impl SystemInformationRule {
    pub(crate) fn match_access(
        &self,
        identity: &Identity,
    ) -> Option<&BTreeSet<SystemInformationAccess>> {
        identity
            .matches(self.user.as_ref(), self.role.as_ref(), self.group.as_ref())
            .then_some(&self.allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_mode_accepts_names_and_booleans() {
        let modes: Vec<AccessMode> =
            serde_json::from_str(r#"["all", "read-only", "none", true, false]"#).unwrap();
        assert_eq!(
            modes,
            vec![
                AccessMode::All,
                AccessMode::ReadOnly,
                AccessMode::None,
                AccessMode::All,
                AccessMode::None
            ]
        );
    }

    #[test]
    fn access_mode_ordering() {
        assert!(AccessMode::None < AccessMode::ReadOnly);
        assert!(AccessMode::ReadOnly < AccessMode::All);
    }

    #[test]
    fn catalog_rule_rejects_unknown_fields() {
        let result: Result<CatalogRule, _> =
            serde_json::from_str(r#"{"catalog": "sales", "allow": "all", "colour": "red"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn catalog_rule_match() {
        let rule: CatalogRule =
            serde_json::from_str(r#"{"user": "alice", "catalog": "sales", "allow": "read-only"}"#)
                .unwrap();
        let alice = Identity::new("alice");
        assert_eq!(rule.match_mode(&alice, "sales"), Some(AccessMode::ReadOnly));
        assert_eq!(rule.match_mode(&alice, "marketing"), None);
        assert_eq!(rule.match_mode(&Identity::new("bob"), "sales"), None);
    }

    #[test]
    fn system_catalog_rule_only_covers_system() {
        let rule = CatalogRule::system_catalog();
        let anyone = Identity::new("mallory");
        assert_eq!(rule.match_mode(&anyone, "system"), Some(AccessMode::All));
        assert_eq!(rule.match_mode(&anyone, "systems"), None);
    }

    #[test]
    fn table_privileges_parse() {
        let rule: TableRule = serde_json::from_str(
            r#"{"table": "orders", "privileges": ["SELECT", "GRANT_SELECT"]}"#,
        )
        .unwrap();
        let table = CatalogSchemaTableName::new("hive", "sales", "orders");
        let privileges = rule.match_privileges(&Identity::new("alice"), &table).unwrap();
        assert!(privileges.contains(&TablePrivilege::Select));
        assert!(!privileges.contains(&TablePrivilege::Insert));
    }

    #[test]
    fn query_owner_rule_needs_owner() {
        let rule: QueryAccessRule =
            serde_json::from_str(r#"{"queryOwner": "bob", "allow": ["view"]}"#).unwrap();
        let alice = Identity::new("alice");
        assert!(rule.match_access(&alice, None).is_none());
        assert!(rule.match_access(&alice, Some("bob")).is_some());
        assert!(rule.match_access(&alice, Some("carol")).is_none());
    }

    #[test]
    fn impersonation_substitutes_captures() {
        let rule: ImpersonationRule = serde_json::from_str(
            r#"{"original_user": "(.*)_admin", "new_user": "$1_user"}"#,
        )
        .unwrap();
        let admin = Identity::new("alice_admin");
        assert_eq!(rule.match_allow(&admin, "alice_user"), Some(true));
        assert_eq!(rule.match_allow(&admin, "bob_user"), None);
    }

    #[test]
    fn impersonation_without_captures_uses_loaded_pattern() {
        let rule: ImpersonationRule = serde_json::from_str(
            r#"{"original_user": "alice|bob", "new_user": "etl_.*", "allow": false}"#,
        )
        .unwrap();
        assert!(!rule.new_user.has_group_references());
        assert_eq!(rule.match_allow(&Identity::new("bob"), "etl_daily"), Some(false));
        assert_eq!(rule.match_allow(&Identity::new("bob"), "reporting"), None);
        // The original user still has to match.
        assert_eq!(rule.match_allow(&Identity::new("carol"), "etl_daily"), None);

        let anyone: ImpersonationRule = serde_json::from_str(r#"{"new_user": "etl_.*"}"#).unwrap();
        assert_eq!(anyone.match_allow(&Identity::new("carol"), "etl_daily"), Some(true));
    }

    #[test]
    fn principal_to_user_mapping() {
        let rule: PrincipalUserMatchRule = serde_json::from_str(
            r#"{"principal": "(.*)@corp\\.com", "principal_to_user": "$1"}"#,
        )
        .unwrap();
        assert_eq!(rule.match_allow("alice@corp.com", "alice"), Some(true));
        assert_eq!(rule.match_allow("alice@corp.com", "bob"), None);
        assert_eq!(rule.match_allow("alice@else.com", "alice"), None);
    }

    #[test]
    fn principal_user_pattern_and_deny() {
        let rule: PrincipalUserMatchRule =
            serde_json::from_str(r#"{"principal": ".*", "user": "root", "allow": false}"#)
                .unwrap();
        assert_eq!(rule.match_allow("anyone", "root"), Some(false));
    }
}
