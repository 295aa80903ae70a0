use std::fmt;

use serde::Deserialize;

use super::rule::{
    CatalogRule, CatalogSessionPropertyRule, FunctionRule, ImpersonationRule,
    PrincipalUserMatchRule, QueryAccessRule, SchemaRule, SessionPropertyRule,
    SystemInformationRule, TableRule,
};

/// A parsed rule document: one optional, ordered rule list per category.
///
/// `None` means the category was absent from the source, which is distinct
/// from an explicitly empty list. Defaults are applied when the document is
/// compiled into a [`PolicyEngine`](super::PolicyEngine), not here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    pub catalogs: Option<Vec<CatalogRule>>,
    pub schemas: Option<Vec<SchemaRule>>,
    pub tables: Option<Vec<TableRule>>,
    pub system_session_properties: Option<Vec<SessionPropertyRule>>,
    pub catalog_session_properties: Option<Vec<CatalogSessionPropertyRule>>,
    pub functions: Option<Vec<FunctionRule>>,
    pub queries: Option<Vec<QueryAccessRule>>,
    pub impersonation: Option<Vec<ImpersonationRule>>,
    pub principals: Option<Vec<PrincipalUserMatchRule>>,
    pub system_information: Option<Vec<SystemInformationRule>>,
}

impl RuleDocument {
    /// Parse a JSON rule document.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] on syntax errors, unknown keys, invalid
    /// patterns or values of the wrong shape.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Decode a rule document from an already parsed JSON tree.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the tree does not have the shape of a
    /// rule document.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

/// Rules for a single catalog, read by a connector-level access control.
///
/// The catalog is fixed when the engine is built, so session properties are
/// matched by name alone. A `catalog` matcher on a schema, table or function
/// rule is compared against that fixed catalog name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogRuleDocument {
    pub schemas: Option<Vec<SchemaRule>>,
    pub tables: Option<Vec<TableRule>>,
    pub session_properties: Option<Vec<SessionPropertyRule>>,
    pub functions: Option<Vec<FunctionRule>>,
}

impl CatalogRuleDocument {
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] on syntax errors, unknown keys, invalid
    /// patterns or values of the wrong shape.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

/// The resource categories a rule document carries lists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    Catalog,
    Schema,
    Table,
    SystemSessionProperty,
    CatalogSessionProperty,
    Function,
    QueryAccess,
    Impersonation,
    PrincipalUserMatch,
    SystemInformation,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 10] = [
        RuleCategory::Catalog,
        RuleCategory::Schema,
        RuleCategory::Table,
        RuleCategory::SystemSessionProperty,
        RuleCategory::CatalogSessionProperty,
        RuleCategory::Function,
        RuleCategory::QueryAccess,
        RuleCategory::Impersonation,
        RuleCategory::PrincipalUserMatch,
        RuleCategory::SystemInformation,
    ];

    /// The document key holding this category's rules.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            RuleCategory::Catalog => "catalogs",
            RuleCategory::Schema => "schemas",
            RuleCategory::Table => "tables",
            RuleCategory::SystemSessionProperty => "system_session_properties",
            RuleCategory::CatalogSessionProperty => "catalog_session_properties",
            RuleCategory::Function => "functions",
            RuleCategory::QueryAccess => "queries",
            RuleCategory::Impersonation => "impersonation",
            RuleCategory::PrincipalUserMatch => "principals",
            RuleCategory::SystemInformation => "system_information",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_has_no_lists() {
        let doc = RuleDocument::from_json_str("{}").unwrap();
        assert_eq!(doc, RuleDocument::default());
    }

    #[test]
    fn empty_list_is_not_absent() {
        let doc = RuleDocument::from_json_str(r#"{"catalogs": []}"#).unwrap();
        assert_eq!(doc.catalogs, Some(vec![]));
        assert!(doc.schemas.is_none());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = RuleDocument::from_json_str(r#"{"catalogz": []}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        assert!(RuleDocument::from_json_str(r#"{"catalogs": {"allow": "all"}}"#).is_err());
        assert!(RuleDocument::from_json_str("[]").is_err());
    }

    #[test]
    fn rule_order_is_preserved() {
        let doc = RuleDocument::from_json_str(
            r#"{"catalogs": [
                {"catalog": "b", "allow": "none"},
                {"catalog": "a", "allow": "all"}
            ]}"#,
        )
        .unwrap();
        let catalogs = doc.catalogs.unwrap();
        assert_eq!(catalogs[0].catalog.as_ref().unwrap().as_str(), "b");
        assert_eq!(catalogs[1].catalog.as_ref().unwrap().as_str(), "a");
    }

    #[test]
    fn catalog_document_rejects_system_categories() {
        let doc = CatalogRuleDocument::from_json_str(
            r#"{"session_properties": [{"property": "compression", "allow": false}]}"#,
        )
        .unwrap();
        assert_eq!(doc.session_properties.unwrap().len(), 1);
        assert!(CatalogRuleDocument::from_json_str(r#"{"catalogs": []}"#).is_err());
    }

    #[test]
    fn category_keys_are_document_keys() {
        for category in RuleCategory::ALL {
            let doc = format!(r#"{{"{}": []}}"#, category.key());
            assert!(RuleDocument::from_json_str(&doc).is_ok(), "{category}");
        }
    }
}
