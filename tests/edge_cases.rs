use std::collections::BTreeSet;

use rulegate::{
    AccessError, AccessMode, CatalogSchemaName, CatalogSchemaRoutineName, CatalogSchemaTableName,
    Identity, PolicyEngine, RuleCategory, SystemAccessControl,
};

fn engine(json: &str) -> PolicyEngine {
    PolicyEngine::from_json_str(json).unwrap()
}

fn alice() -> Identity {
    Identity::new("alice")
}

// -- Catalogs ---------------------------------------------------------------

#[test]
fn explicit_catalog_rule_fails_closed() {
    let engine = engine(r#"{"catalogs": [{"user": "alice", "catalog": "sales", "allow": "all"}]}"#);
    assert!(engine.check_can_access_catalog(&alice(), "sales").is_ok());

    let err = engine
        .check_can_access_catalog(&alice(), "marketing")
        .unwrap_err();
    assert!(err.is_denied());
    assert_eq!(err.to_string(), "Access Denied: Cannot access catalog marketing");
}

#[test]
fn absent_catalog_rules_allow_everything() {
    let engine = engine("{}");
    for user in ["alice", "bob", "mallory"] {
        for catalog in ["sales", "marketing", "system", "anything"] {
            assert!(engine
                .check_can_access_catalog(&Identity::new(user), catalog)
                .is_ok());
        }
    }
    assert_eq!(engine.rule_count(RuleCategory::Catalog), 1);
}

#[test]
fn system_catalog_survives_restrictive_rules() {
    let engine = engine(
        r#"{"catalogs": [
            {"user": "alice", "catalog": "sales", "allow": "all"},
            {"catalog": "hr", "allow": "none"}
        ]}"#,
    );
    let bob = Identity::new("bob");
    assert!(engine.check_can_access_catalog(&bob, "system").is_ok());
    assert!(engine.check_can_access_catalog(&alice(), "system").is_ok());
    assert!(engine.check_can_access_catalog(&bob, "sales").is_err());
    assert_eq!(engine.catalog_access(&bob, "system"), AccessMode::All);
    assert_eq!(engine.rule_count(RuleCategory::Catalog), 3);
}

#[test]
fn system_catalog_rule_comes_last() {
    let engine = engine(r#"{"catalogs": [{"catalog": "system", "allow": "read-only"}]}"#);
    assert_eq!(engine.catalog_access(&alice(), "system"), AccessMode::ReadOnly);
}

#[test]
fn empty_catalog_list_still_gets_system_rule() {
    let engine = engine(r#"{"catalogs": []}"#);
    assert_eq!(engine.rule_count(RuleCategory::Catalog), 1);
    assert!(engine.check_can_access_catalog(&alice(), "system").is_ok());
    assert!(engine.check_can_access_catalog(&alice(), "sales").is_err());
}

#[test]
fn first_matching_rule_wins() {
    let engine = engine(
        r#"{"catalogs": [
            {"user": "alice", "catalog": "sales", "allow": "read-only"},
            {"user": "alice", "allow": "all"},
            {"catalog": "sales", "allow": "none"}
        ]}"#,
    );
    assert_eq!(engine.catalog_access(&alice(), "sales"), AccessMode::ReadOnly);
    assert_eq!(engine.catalog_access(&alice(), "hr"), AccessMode::All);
    assert_eq!(
        engine.catalog_access(&Identity::new("bob"), "sales"),
        AccessMode::None
    );
}

#[test]
fn patterns_must_match_the_whole_name() {
    let engine = engine(r#"{"catalogs": [{"user": "ali", "catalog": "sal.*", "allow": true}]}"#);
    assert_eq!(engine.catalog_access(&alice(), "sales"), AccessMode::None);
    assert_eq!(
        engine.catalog_access(&Identity::new("ali"), "sales"),
        AccessMode::All
    );
    assert_eq!(
        engine.catalog_access(&Identity::new("ali"), "presales"),
        AccessMode::None
    );
}

#[test]
fn role_and_group_matchers() {
    let engine = engine(
        r#"{"catalogs": [
            {"role": "admin", "allow": "all"},
            {"group": "analysts", "catalog": "sales", "allow": "read-only"}
        ]}"#,
    );
    let admin = Identity::new("carol").with_role("admin");
    let analyst = Identity::new("dave").with_group("analysts");
    assert_eq!(engine.catalog_access(&admin, "hr"), AccessMode::All);
    assert_eq!(engine.catalog_access(&analyst, "sales"), AccessMode::ReadOnly);
    assert_eq!(engine.catalog_access(&analyst, "hr"), AccessMode::None);
}

#[test]
fn filter_catalogs_hides_inaccessible() {
    let engine = engine(
        r#"{"catalogs": [{"user": "alice", "catalog": "sales|hr", "allow": "read-only"}]}"#,
    );
    let catalogs: BTreeSet<String> = ["sales", "hr", "finance", "system"]
        .into_iter()
        .map(String::from)
        .collect();
    let visible = engine.filter_catalogs(&alice(), &catalogs).unwrap();
    assert_eq!(
        visible,
        ["hr", "sales", "system"].into_iter().map(String::from).collect()
    );
}

// -- Schemas and tables -----------------------------------------------------

#[test]
fn schema_ownership() {
    let engine = engine(
        r#"{"schemas": [
            {"user": "alice", "schema": "alice_.*", "owner": true},
            {"owner": false}
        ]}"#,
    );
    let own = CatalogSchemaName::new("hive", "alice_scratch");
    let other = CatalogSchemaName::new("hive", "shared");
    assert!(engine.check_can_create_schema(&alice(), &own).is_ok());
    assert!(engine.check_can_drop_schema(&alice(), &own).is_ok());
    assert!(engine.check_can_drop_schema(&alice(), &other).unwrap_err().is_denied());
}

#[test]
fn absent_table_rules_allow_all_privileges() {
    let engine = engine("{}");
    let table = CatalogSchemaTableName::new("hive", "sales", "orders");
    assert!(engine.check_can_select_from_table(&alice(), &table).is_ok());
    assert!(engine.check_can_insert_into_table(&alice(), &table).is_ok());
    assert!(engine.check_can_delete_from_table(&alice(), &table).is_ok());
    assert!(engine.check_can_update_table(&alice(), &table).is_ok());
    assert!(engine.check_can_create_table(&alice(), &table).is_ok());
    assert!(engine.check_can_drop_table(&alice(), &table).is_ok());
    assert!(engine.check_can_create_view(&alice(), &table).is_ok());
}

#[test]
fn table_rules_fail_closed() {
    let engine = engine(
        r#"{"tables": [
            {"user": "alice", "schema": "sales", "table": "orders", "privileges": ["SELECT"]}
        ]}"#,
    );
    let orders = CatalogSchemaTableName::new("hive", "sales", "orders");
    let refunds = CatalogSchemaTableName::new("hive", "sales", "refunds");
    assert!(engine.check_can_select_from_table(&alice(), &orders).is_ok());
    assert!(engine.check_can_select_from_table(&alice(), &refunds).is_err());
    assert!(engine.check_can_create_view(&alice(), &orders).is_err());
}

#[test]
fn grant_select_permits_reading() {
    let engine = engine(r#"{"tables": [{"privileges": ["GRANT_SELECT"]}]}"#);
    let table = CatalogSchemaTableName::new("hive", "sales", "orders");
    assert!(engine.check_can_select_from_table(&alice(), &table).is_ok());
    assert!(engine.check_can_insert_into_table(&alice(), &table).is_err());
}

#[test]
fn malformed_resource_is_not_a_denial() {
    let engine = engine("{}");
    let err = engine
        .check_can_select_from_table(&alice(), &CatalogSchemaTableName::new("hive", "", "orders"))
        .unwrap_err();
    assert!(matches!(err, AccessError::InvalidRequest { .. }));
    assert!(!err.is_denied());
}

// -- Session properties and functions ---------------------------------------

#[test]
fn session_properties() {
    let engine = engine(
        r#"{
            "system_session_properties": [
                {"property": "query_max_.*", "allow": false},
                {"allow": true}
            ],
            "catalog_session_properties": [
                {
                    "catalog": "hive",
                    "property": "insert_existing_partitions_behavior",
                    "allow": true
                }
            ]
        }"#,
    );
    assert!(engine
        .check_can_set_system_session_property(&alice(), "query_max_memory")
        .is_err());
    assert!(engine
        .check_can_set_system_session_property(&alice(), "join_distribution_type")
        .is_ok());
    assert!(engine
        .check_can_set_catalog_session_property(
            &alice(),
            "hive",
            "insert_existing_partitions_behavior",
        )
        .is_ok());
    assert!(engine
        .check_can_set_catalog_session_property(&alice(), "hive", "compression_codec")
        .is_err());
}

#[test]
fn function_execution() {
    let engine = engine(
        r#"{"functions": [
            {"user": "alice", "function": "mask_.*", "privileges": ["EXECUTE"]},
            {"privileges": []}
        ]}"#,
    );
    let mask = CatalogSchemaRoutineName::new("hive", "udf", "mask_email");
    let other = CatalogSchemaRoutineName::new("hive", "udf", "decrypt");
    assert!(engine.check_can_execute_function(&alice(), &mask).is_ok());
    assert!(engine.check_can_execute_function(&alice(), &other).is_err());
    assert!(engine
        .check_can_execute_function(&Identity::new("bob"), &mask)
        .is_err());
}

// -- Queries, impersonation and principals ----------------------------------

#[test]
fn absent_query_rules_deny_all_but_own_queries() {
    let engine = engine("{}");
    assert!(engine.check_can_execute_query(&alice()).is_err());
    assert!(engine.check_can_view_query_owned_by(&alice(), "alice").is_ok());
    assert!(engine.check_can_kill_query_owned_by(&alice(), "alice").is_ok());
    assert!(engine.check_can_view_query_owned_by(&alice(), "bob").is_err());
}

#[test]
fn query_owner_rules() {
    let engine = engine(
        r#"{"queries": [
            {"role": "admin", "allow": ["execute", "view", "kill"]},
            {"user": "alice", "queryOwner": "bob", "allow": ["view"]},
            {"allow": ["execute"]}
        ]}"#,
    );
    assert!(engine.check_can_execute_query(&alice()).is_ok());
    assert!(engine.check_can_view_query_owned_by(&alice(), "bob").is_ok());
    assert!(engine.check_can_kill_query_owned_by(&alice(), "bob").is_err());
    let admin = Identity::new("carol").with_role("admin");
    assert!(engine.check_can_kill_query_owned_by(&admin, "bob").is_ok());
}

#[test]
fn impersonation_with_capture_groups() {
    let engine = engine(
        r#"{"impersonation": [
            {"original_user": "(.*)_admin", "new_user": "$1_user"},
            {"original_user": "root", "new_user": "sys_.*", "allow": false},
            {"original_user": "root", "new_user": ".*"}
        ]}"#,
    );
    let admin = Identity::new("team_admin");
    assert!(engine.check_can_impersonate_user(&admin, "team_user").is_ok());
    assert!(engine.check_can_impersonate_user(&admin, "other_user").is_err());

    let root = Identity::new("root");
    assert!(engine.check_can_impersonate_user(&root, "sys_backup").is_err());
    assert!(engine.check_can_impersonate_user(&root, "alice").is_ok());
    assert!(engine.check_can_impersonate_user(&alice(), "alice").is_ok());
}

#[test]
fn principal_to_user_mapping() {
    let engine = engine(
        r#"{"principals": [
            {"principal": "(.*)@corp\\.example", "principal_to_user": "$1"},
            {"principal": "svc-.*", "user": "etl", "allow": true}
        ]}"#,
    );
    assert!(engine.check_can_set_user(Some("alice@corp.example"), "alice").is_ok());
    assert!(engine.check_can_set_user(Some("alice@corp.example"), "bob").is_err());
    assert!(engine.check_can_set_user(Some("svc-loader"), "etl").is_ok());
    assert!(engine.check_can_set_user(Some("intruder"), "alice").is_err());
    assert!(engine.check_can_set_user(None, "anyone").is_ok());
}

#[test]
fn system_information() {
    let engine = engine(
        r#"{"system_information": [
            {"role": "admin", "allow": ["read", "write"]},
            {"user": "alice", "allow": ["read"]}
        ]}"#,
    );
    assert!(engine.check_can_read_system_information(&alice()).is_ok());
    assert!(engine.check_can_write_system_information(&alice()).is_err());
    let admin = Identity::new("carol").with_role("admin");
    assert!(engine.check_can_write_system_information(&admin).is_ok());
    assert!(engine
        .check_can_read_system_information(&Identity::new("bob"))
        .is_err());
}

// -- Documents --------------------------------------------------------------

#[test]
fn unknown_rule_fields_are_rejected() {
    assert!(
        PolicyEngine::from_json_str(r#"{"catalogs": [{"catalog": "x", "alow": "all"}]}"#).is_err()
    );
    assert!(PolicyEngine::from_json_str(r#"{"catalog_rules": []}"#).is_err());
}

#[test]
fn invalid_regex_is_rejected() {
    assert!(
        PolicyEngine::from_json_str(r#"{"catalogs": [{"catalog": "(", "allow": "all"}]}"#).is_err()
    );
}
