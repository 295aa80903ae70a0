use std::collections::BTreeSet;
use std::fmt;

use super::document::{RuleCategory, RuleDocument};
use super::identity::Identity;
use super::resource::{CatalogSchemaName, CatalogSchemaRoutineName, CatalogSchemaTableName};
use super::rule::{
    AccessMode, CatalogRule, CatalogSessionPropertyRule, FunctionPrivilege, FunctionRule,
    ImpersonationRule, PrincipalUserMatchRule, QueryAccess, QueryAccessRule, SchemaRule,
    SessionPropertyRule, SystemInformationAccess, SystemInformationRule, TablePrivilege, TableRule,
};

/// An immutable, compiled access policy. Thread-safe and designed to live
/// behind `Arc`.
///
/// Every category holds its resolved rule list: the list from the document,
/// or the category default when the document left it out. Each lookup scans
/// one list in document order and the first matching rule decides; when no
/// rule matches the answer is the most restrictive one.
#[derive(Debug)]
pub struct PolicyEngine {
    pub(crate) catalog_rules: Vec<CatalogRule>,
    pub(crate) schema_rules: Vec<SchemaRule>,
    pub(crate) table_rules: Vec<TableRule>,
    pub(crate) session_property_rules: Vec<SessionPropertyRule>,
    pub(crate) catalog_session_property_rules: Vec<CatalogSessionPropertyRule>,
    pub(crate) function_rules: Vec<FunctionRule>,
    pub(crate) query_access_rules: Vec<QueryAccessRule>,
    pub(crate) impersonation_rules: Vec<ImpersonationRule>,
    pub(crate) principal_user_match_rules: Vec<PrincipalUserMatchRule>,
    pub(crate) system_information_rules: Vec<SystemInformationRule>,
}

impl PolicyEngine {
    /// Compile a parsed document, filling in category defaults.
    #[must_use]
    pub fn from_document(document: RuleDocument) -> Self {
        crate::compile::compile(document)
    }

    /// Parse a JSON rule document and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the document is malformed.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_document(RuleDocument::from_json_str(input)?))
    }

    /// Number of resolved rules for `category`, defaults included.
    #[must_use]
    pub fn rule_count(&self, category: RuleCategory) -> usize {
        match category {
            RuleCategory::Catalog => self.catalog_rules.len(),
            RuleCategory::Schema => self.schema_rules.len(),
            RuleCategory::Table => self.table_rules.len(),
            RuleCategory::SystemSessionProperty => self.session_property_rules.len(),
            RuleCategory::CatalogSessionProperty => self.catalog_session_property_rules.len(),
            RuleCategory::Function => self.function_rules.len(),
            RuleCategory::QueryAccess => self.query_access_rules.len(),
            RuleCategory::Impersonation => self.impersonation_rules.len(),
            RuleCategory::PrincipalUserMatch => self.principal_user_match_rules.len(),
            RuleCategory::SystemInformation => self.system_information_rules.len(),
        }
    }

    #[must_use]
    pub fn catalog_access(&self, identity: &Identity, catalog: &str) -> AccessMode {
        crate::evaluate::catalog_access(&self.catalog_rules, identity, catalog)
    }

    #[must_use]
    pub fn is_schema_owner(&self, identity: &Identity, schema: &CatalogSchemaName) -> bool {
        crate::evaluate::schema_owner(&self.schema_rules, identity, schema)
    }

    /// Privileges granted on `table`, ignoring catalog access.
    #[must_use]
    pub fn table_privileges(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> BTreeSet<TablePrivilege> {
        crate::evaluate::table_privileges(&self.table_rules, identity, table)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn can_set_system_session_property(&self, identity: &Identity, property: &str) -> bool {
        crate::evaluate::session_property(&self.session_property_rules, identity, property)
    }

    #[must_use]
    pub fn can_set_catalog_session_property(
        &self,
        identity: &Identity,
        catalog: &str,
        property: &str,
    ) -> bool {
        crate::evaluate::catalog_session_property(
            &self.catalog_session_property_rules,
            identity,
            catalog,
            property,
        )
    }

    #[must_use]
    pub fn function_privileges(
        &self,
        identity: &Identity,
        function: &CatalogSchemaRoutineName,
    ) -> BTreeSet<FunctionPrivilege> {
        crate::evaluate::function_privileges(&self.function_rules, identity, function)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `identity` has `access` to queries owned by `owner`, or to run
    /// new queries when `owner` is `None`.
    #[must_use]
    pub fn has_query_access(
        &self,
        identity: &Identity,
        owner: Option<&str>,
        access: QueryAccess,
    ) -> bool {
        crate::evaluate::query_access(&self.query_access_rules, identity, owner)
            .is_some_and(|granted| granted.contains(&access))
    }

    #[must_use]
    pub fn can_impersonate(&self, identity: &Identity, new_user: &str) -> bool {
        crate::evaluate::impersonation(&self.impersonation_rules, identity, new_user)
    }

    #[must_use]
    pub fn principal_may_act_as(&self, principal: &str, user: &str) -> bool {
        crate::evaluate::principal_user_match(&self.principal_user_match_rules, principal, user)
    }

    #[must_use]
    pub fn has_system_information_access(
        &self,
        identity: &Identity,
        access: SystemInformationAccess,
    ) -> bool {
        crate::evaluate::system_information(&self.system_information_rules, identity)
            .is_some_and(|granted| granted.contains(&access))
    }
}

impl fmt::Display for PolicyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PolicyEngine(")?;
        for (i, category) in RuleCategory::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {category}", self.rule_count(*category))?;
        }
        f.write_str(")")
    }
}
