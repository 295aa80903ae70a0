use tracing::debug;

use crate::{
    CatalogPolicyEngine, CatalogRule, CatalogRuleDocument, CatalogSessionPropertyRule,
    FunctionRule, PolicyEngine, RuleCategory, RuleDocument, SchemaRule, SessionPropertyRule,
    TableRule,
};

pub(crate) fn compile(document: RuleDocument) -> PolicyEngine {
    let RuleDocument {
        catalogs,
        schemas,
        tables,
        system_session_properties,
        catalog_session_properties,
        functions,
        queries,
        impersonation,
        principals,
        system_information,
    } = document;

    PolicyEngine {
        catalog_rules: catalog_rules(catalogs),
        schema_rules: or_allow_all(RuleCategory::Schema, schemas, SchemaRule::allow_all),
        table_rules: or_allow_all(RuleCategory::Table, tables, TableRule::allow_all),
        session_property_rules: or_allow_all(
            RuleCategory::SystemSessionProperty,
            system_session_properties,
            SessionPropertyRule::allow_all,
        ),
        catalog_session_property_rules: or_allow_all(
            RuleCategory::CatalogSessionProperty,
            catalog_session_properties,
            CatalogSessionPropertyRule::allow_all,
        ),
        function_rules: or_allow_all(RuleCategory::Function, functions, FunctionRule::allow_all),
        query_access_rules: or_empty(RuleCategory::QueryAccess, queries),
        impersonation_rules: or_empty(RuleCategory::Impersonation, impersonation),
        principal_user_match_rules: or_empty(RuleCategory::PrincipalUserMatch, principals),
        system_information_rules: or_empty(RuleCategory::SystemInformation, system_information),
    }
}

/// A catalog document has no deny-by-default categories: anything it leaves
/// out is open within the catalog.
pub(crate) fn compile_catalog(
    catalog: String,
    document: CatalogRuleDocument,
) -> CatalogPolicyEngine {
    let CatalogRuleDocument {
        schemas,
        tables,
        session_properties,
        functions,
    } = document;

    CatalogPolicyEngine {
        catalog,
        schema_rules: or_allow_all(RuleCategory::Schema, schemas, SchemaRule::allow_all),
        table_rules: or_allow_all(RuleCategory::Table, tables, TableRule::allow_all),
        session_property_rules: or_allow_all(
            RuleCategory::CatalogSessionProperty,
            session_properties,
            SessionPropertyRule::allow_all,
        ),
        function_rules: or_allow_all(RuleCategory::Function, functions, FunctionRule::allow_all),
    }
}

/// User catalog rules are followed by full access to the `system` catalog so
/// status checks keep working under any policy. Without catalog rules every
/// catalog is open, which already covers `system`.
fn catalog_rules(rules: Option<Vec<CatalogRule>>) -> Vec<CatalogRule> {
    match rules {
        Some(mut rules) => {
            rules.push(CatalogRule::system_catalog());
            rules
        }
        None => {
            debug!(category = %RuleCategory::Catalog, "no rules defined, allowing all");
            vec![CatalogRule::allow_all()]
        }
    }
}

fn or_allow_all<R>(category: RuleCategory, rules: Option<Vec<R>>, allow_all: fn() -> R) -> Vec<R> {
    rules.unwrap_or_else(|| {
        debug!(%category, "no rules defined, allowing all");
        vec![allow_all()]
    })
}

/// These categories have no implicit grant; absence leaves an empty list,
/// which denies everything.
fn or_empty<R>(category: RuleCategory, rules: Option<Vec<R>>) -> Vec<R> {
    rules.unwrap_or_else(|| {
        debug!(%category, "no rules defined, denying all");
        Vec::new()
    })
}
