use std::collections::BTreeSet;
use std::fmt;

use super::document::{CatalogRuleDocument, RuleCategory};
use super::identity::Identity;
use super::resource::{CatalogSchemaName, SchemaRoutineName, SchemaTableName};
use super::rule::{
    FunctionPrivilege, FunctionRule, SchemaRule, SessionPropertyRule, TablePrivilege, TableRule,
};

/// A compiled policy bound to one catalog.
///
/// Lookups follow [`PolicyEngine`](super::PolicyEngine): one resolved list
/// per category, first match decides. Resources are named without a catalog
/// and qualified with [`catalog`](Self::catalog) before matching.
#[derive(Debug)]
pub struct CatalogPolicyEngine {
    pub(crate) catalog: String,
    pub(crate) schema_rules: Vec<SchemaRule>,
    pub(crate) table_rules: Vec<TableRule>,
    pub(crate) session_property_rules: Vec<SessionPropertyRule>,
    pub(crate) function_rules: Vec<FunctionRule>,
}

impl CatalogPolicyEngine {
    /// Compile a parsed document for `catalog`, filling in category defaults.
    #[must_use]
    pub fn from_document(catalog: impl Into<String>, document: CatalogRuleDocument) -> Self {
        crate::compile::compile_catalog(catalog.into(), document)
    }

    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the document is malformed.
    pub fn from_json_str(
        catalog: impl Into<String>,
        input: &str,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::from_document(catalog, CatalogRuleDocument::from_json_str(input)?))
    }

    #[must_use]
    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// Number of resolved rules for `category`. Categories a catalog document
    /// cannot carry have none.
    #[must_use]
    pub fn rule_count(&self, category: RuleCategory) -> usize {
        match category {
            RuleCategory::Schema => self.schema_rules.len(),
            RuleCategory::Table => self.table_rules.len(),
            RuleCategory::CatalogSessionProperty => self.session_property_rules.len(),
            RuleCategory::Function => self.function_rules.len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_schema_owner(&self, identity: &Identity, schema: &str) -> bool {
        let schema = CatalogSchemaName::new(&self.catalog, schema);
        crate::evaluate::schema_owner(&self.schema_rules, identity, &schema)
    }

    #[must_use]
    pub fn table_privileges(
        &self,
        identity: &Identity,
        table: &SchemaTableName,
    ) -> BTreeSet<TablePrivilege> {
        let table = table.in_catalog(&self.catalog);
        crate::evaluate::table_privileges(&self.table_rules, identity, &table)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn can_set_session_property(&self, identity: &Identity, property: &str) -> bool {
        crate::evaluate::session_property(&self.session_property_rules, identity, property)
    }

    #[must_use]
    pub fn function_privileges(
        &self,
        identity: &Identity,
        function: &SchemaRoutineName,
    ) -> BTreeSet<FunctionPrivilege> {
        let function = function.in_catalog(&self.catalog);
        crate::evaluate::function_privileges(&self.function_rules, identity, &function)
            .cloned()
            .unwrap_or_default()
    }
}

impl fmt::Display for CatalogPolicyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CatalogPolicyEngine({}: {} schemas, {} tables, {} session_properties, {} functions)",
            self.catalog,
            self.schema_rules.len(),
            self.table_rules.len(),
            self.session_property_rules.len(),
            self.function_rules.len()
        )
    }
}
