mod catalog_engine;
mod document;
mod engine;
mod identity;
mod pattern;
mod resource;
mod rule;

pub use catalog_engine::CatalogPolicyEngine;
pub use document::{CatalogRuleDocument, RuleCategory, RuleDocument};
pub use engine::PolicyEngine;
pub use identity::Identity;
pub use pattern::Pattern;
pub(crate) use resource::require_name;
pub use resource::{
    CatalogSchemaName, CatalogSchemaRoutineName, CatalogSchemaTableName, SchemaRoutineName,
    SchemaTableName,
};
pub use rule::{
    AccessMode, CatalogRule, CatalogSessionPropertyRule, FunctionPrivilege, FunctionRule,
    ImpersonationRule, PrincipalUserMatchRule, QueryAccess, QueryAccessRule, SchemaRule,
    SessionPropertyRule, SystemInformationAccess, SystemInformationRule, TablePrivilege, TableRule,
};
