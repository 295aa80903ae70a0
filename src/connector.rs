//! Access control for a single catalog.
//!
//! A connector serving one catalog asks these checks with catalog-relative
//! names. The rules come from a [`CatalogRuleDocument`](crate::CatalogRuleDocument)
//! and are refreshed through the same [`RefreshingSupplier`](crate::RefreshingSupplier)
//! as system-wide rules.

use crate::access::AccessResult;
use crate::error::AccessError;
use crate::types::require_name;
use crate::{
    CatalogPolicyEngine, FunctionPrivilege, Identity, SchemaRoutineName, SchemaTableName,
    TablePrivilege,
};

/// The checks a connector makes before acting inside its catalog.
pub trait ConnectorAccessControl: Send + Sync {
    fn check_can_create_schema(&self, identity: &Identity, schema: &str) -> AccessResult;

    fn check_can_drop_schema(&self, identity: &Identity, schema: &str) -> AccessResult;

    fn check_can_create_table(&self, identity: &Identity, table: &SchemaTableName) -> AccessResult;

    fn check_can_drop_table(&self, identity: &Identity, table: &SchemaTableName) -> AccessResult;

    fn check_can_select_from_table(
        &self,
        identity: &Identity,
        table: &SchemaTableName,
    ) -> AccessResult;

    fn check_can_insert_into_table(
        &self,
        identity: &Identity,
        table: &SchemaTableName,
    ) -> AccessResult;

    fn check_can_delete_from_table(
        &self,
        identity: &Identity,
        table: &SchemaTableName,
    ) -> AccessResult;

    fn check_can_update_table(&self, identity: &Identity, table: &SchemaTableName) -> AccessResult;

    fn check_can_create_view(&self, identity: &Identity, view: &SchemaTableName) -> AccessResult;

    fn check_can_set_session_property(&self, identity: &Identity, property: &str) -> AccessResult;

    fn check_can_execute_function(
        &self,
        identity: &Identity,
        function: &SchemaRoutineName,
    ) -> AccessResult;
}

impl CatalogPolicyEngine {
    fn require_table_privilege(
        &self,
        identity: &Identity,
        table: &SchemaTableName,
        action: &str,
        accepted: &[TablePrivilege],
    ) -> AccessResult {
        table.validate()?;
        let privileges = self.table_privileges(identity, table);
        if !accepted.iter().any(|p| privileges.contains(p)) {
            let table = table.in_catalog(self.catalog());
            return Err(AccessError::denied(format!("Cannot {action} {table}")));
        }
        Ok(())
    }

    fn require_schema_owner(
        &self,
        identity: &Identity,
        schema: &str,
        action: &str,
    ) -> AccessResult {
        require_name("schema", schema)?;
        if !self.is_schema_owner(identity, schema) {
            return Err(AccessError::denied(format!(
                "Cannot {action} schema {}.{schema}",
                self.catalog()
            )));
        }
        Ok(())
    }
}

impl ConnectorAccessControl for CatalogPolicyEngine {
    fn check_can_create_schema(&self, identity: &Identity, schema: &str) -> AccessResult {
        self.require_schema_owner(identity, schema, "create")
    }

    fn check_can_drop_schema(&self, identity: &Identity, schema: &str) -> AccessResult {
        self.require_schema_owner(identity, schema, "drop")
    }

    fn check_can_create_table(&self, identity: &Identity, table: &SchemaTableName) -> AccessResult {
        self.require_table_privilege(identity, table, "create table", &[TablePrivilege::Ownership])
    }

    fn check_can_drop_table(&self, identity: &Identity, table: &SchemaTableName) -> AccessResult {
        self.require_table_privilege(identity, table, "drop table", &[TablePrivilege::Ownership])
    }

    fn check_can_select_from_table(
        &self,
        identity: &Identity,
        table: &SchemaTableName,
    ) -> AccessResult {
        self.require_table_privilege(
            identity,
            table,
            "select from table",
            &[TablePrivilege::Select, TablePrivilege::GrantSelect],
        )
    }

    fn check_can_insert_into_table(
        &self,
        identity: &Identity,
        table: &SchemaTableName,
    ) -> AccessResult {
        self.require_table_privilege(
            identity,
            table,
            "insert into table",
            &[TablePrivilege::Insert],
        )
    }

    fn check_can_delete_from_table(
        &self,
        identity: &Identity,
        table: &SchemaTableName,
    ) -> AccessResult {
        self.require_table_privilege(
            identity,
            table,
            "delete from table",
            &[TablePrivilege::Delete],
        )
    }

    fn check_can_update_table(&self, identity: &Identity, table: &SchemaTableName) -> AccessResult {
        self.require_table_privilege(identity, table, "update table", &[TablePrivilege::Update])
    }

    fn check_can_create_view(&self, identity: &Identity, view: &SchemaTableName) -> AccessResult {
        self.require_table_privilege(identity, view, "create view", &[TablePrivilege::Ownership])
    }

    fn check_can_set_session_property(&self, identity: &Identity, property: &str) -> AccessResult {
        require_name("session property", property)?;
        if self.can_set_session_property(identity, property) {
            return Ok(());
        }
        Err(AccessError::denied(format!(
            "Cannot set catalog session property {}.{property}",
            self.catalog()
        )))
    }

    fn check_can_execute_function(
        &self,
        identity: &Identity,
        function: &SchemaRoutineName,
    ) -> AccessResult {
        function.validate()?;
        let privileges = self.function_privileges(identity, function);
        if privileges.contains(&FunctionPrivilege::Execute)
            || privileges.contains(&FunctionPrivilege::GrantExecute)
        {
            return Ok(());
        }
        let function = function.in_catalog(self.catalog());
        Err(AccessError::denied(format!("Cannot execute function {function}")))
    }
}
