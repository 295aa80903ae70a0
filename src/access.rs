use std::collections::BTreeSet;

use crate::error::AccessError;
use crate::types::require_name;
use crate::{
    AccessMode, CatalogSchemaName, CatalogSchemaRoutineName, CatalogSchemaTableName,
    FunctionPrivilege, Identity, PolicyEngine, QueryAccess, SystemInformationAccess,
    TablePrivilege,
};

pub type AccessResult = Result<(), AccessError>;

/// The authorization checks a query engine makes before acting.
///
/// Each check returns `Ok(())` when the action is allowed and an
/// [`AccessError`] otherwise.
pub trait SystemAccessControl: Send + Sync {
    /// Whether the authenticated `principal` may run as `user`. A session
    /// without an authenticated principal has nothing to verify.
    fn check_can_set_user(&self, principal: Option<&str>, user: &str) -> AccessResult;

    fn check_can_impersonate_user(&self, identity: &Identity, user: &str) -> AccessResult;

    fn check_can_execute_query(&self, identity: &Identity) -> AccessResult;

    fn check_can_view_query_owned_by(&self, identity: &Identity, owner: &str) -> AccessResult;

    fn check_can_kill_query_owned_by(&self, identity: &Identity, owner: &str) -> AccessResult;

    fn check_can_read_system_information(&self, identity: &Identity) -> AccessResult;

    fn check_can_write_system_information(&self, identity: &Identity) -> AccessResult;

    fn check_can_set_system_session_property(
        &self,
        identity: &Identity,
        property: &str,
    ) -> AccessResult;

    fn check_can_access_catalog(&self, identity: &Identity, catalog: &str) -> AccessResult;

    /// The subset of `catalogs` the identity may see.
    fn filter_catalogs(
        &self,
        identity: &Identity,
        catalogs: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AccessError>;

    fn check_can_show_schemas(&self, identity: &Identity, catalog: &str) -> AccessResult;

    fn check_can_create_schema(&self, identity: &Identity, schema: &CatalogSchemaName)
        -> AccessResult;

    fn check_can_drop_schema(&self, identity: &Identity, schema: &CatalogSchemaName)
        -> AccessResult;

    fn check_can_create_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult;

    fn check_can_drop_table(&self, identity: &Identity, table: &CatalogSchemaTableName)
        -> AccessResult;

    fn check_can_select_from_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult;

    fn check_can_insert_into_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult;

    fn check_can_delete_from_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult;

    fn check_can_update_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult;

    fn check_can_create_view(&self, identity: &Identity, view: &CatalogSchemaTableName)
        -> AccessResult;

    fn check_can_set_catalog_session_property(
        &self,
        identity: &Identity,
        catalog: &str,
        property: &str,
    ) -> AccessResult;

    fn check_can_execute_function(
        &self,
        identity: &Identity,
        function: &CatalogSchemaRoutineName,
    ) -> AccessResult;
}

impl PolicyEngine {
    fn require_catalog(
        &self,
        identity: &Identity,
        catalog: &str,
        required: AccessMode,
    ) -> AccessResult {
        require_name("catalog", catalog)?;
        let granted = self.catalog_access(identity, catalog);
        if granted < required {
            return Err(AccessError::denied(format!("Cannot access catalog {catalog}")));
        }
        Ok(())
    }

    fn require_table_privilege(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
        action: &str,
        accepted: &[TablePrivilege],
    ) -> AccessResult {
        table.validate()?;
        let catalog_mode = if accepted.contains(&TablePrivilege::Select) {
            AccessMode::ReadOnly
        } else {
            AccessMode::All
        };
        self.require_catalog(identity, &table.catalog, catalog_mode)?;
        let privileges = self.table_privileges(identity, table);
        if !accepted.iter().any(|p| privileges.contains(p)) {
            return Err(AccessError::denied(format!("Cannot {action} {table}")));
        }
        Ok(())
    }

    fn require_schema_owner(
        &self,
        identity: &Identity,
        schema: &CatalogSchemaName,
        action: &str,
    ) -> AccessResult {
        schema.validate()?;
        self.require_catalog(identity, &schema.catalog, AccessMode::All)?;
        if !self.is_schema_owner(identity, schema) {
            return Err(AccessError::denied(format!("Cannot {action} schema {schema}")));
        }
        Ok(())
    }

    fn require_query_access(
        &self,
        identity: &Identity,
        owner: &str,
        access: QueryAccess,
        action: &str,
    ) -> AccessResult {
        require_name("query owner", owner)?;
        if owner == identity.user() || self.has_query_access(identity, Some(owner), access) {
            return Ok(());
        }
        Err(AccessError::denied(format!("Cannot {action} query owned by {owner}")))
    }
}

impl SystemAccessControl for PolicyEngine {
    fn check_can_set_user(&self, principal: Option<&str>, user: &str) -> AccessResult {
        require_name("user", user)?;
        match principal {
            None => Ok(()),
            Some(principal) if self.principal_may_act_as(principal, user) => Ok(()),
            Some(principal) => Err(AccessError::denied(format!(
                "Principal {principal} cannot become user {user}"
            ))),
        }
    }

    fn check_can_impersonate_user(&self, identity: &Identity, user: &str) -> AccessResult {
        require_name("user", user)?;
        if user == identity.user() || self.can_impersonate(identity, user) {
            return Ok(());
        }
        Err(AccessError::denied(format!(
            "User {} cannot impersonate user {user}",
            identity.user()
        )))
    }

    fn check_can_execute_query(&self, identity: &Identity) -> AccessResult {
        if self.has_query_access(identity, None, QueryAccess::Execute) {
            return Ok(());
        }
        Err(AccessError::denied("Cannot execute query"))
    }

    fn check_can_view_query_owned_by(&self, identity: &Identity, owner: &str) -> AccessResult {
        self.require_query_access(identity, owner, QueryAccess::View, "view")
    }

    fn check_can_kill_query_owned_by(&self, identity: &Identity, owner: &str) -> AccessResult {
        self.require_query_access(identity, owner, QueryAccess::Kill, "kill")
    }

    fn check_can_read_system_information(&self, identity: &Identity) -> AccessResult {
        if self.has_system_information_access(identity, SystemInformationAccess::Read) {
            return Ok(());
        }
        Err(AccessError::denied("Cannot read system information"))
    }

    fn check_can_write_system_information(&self, identity: &Identity) -> AccessResult {
        if self.has_system_information_access(identity, SystemInformationAccess::Write) {
            return Ok(());
        }
        Err(AccessError::denied("Cannot write system information"))
    }

    fn check_can_set_system_session_property(
        &self,
        identity: &Identity,
        property: &str,
    ) -> AccessResult {
        require_name("session property", property)?;
        if self.can_set_system_session_property(identity, property) {
            return Ok(());
        }
        Err(AccessError::denied(format!("Cannot set system session property {property}")))
    }

    fn check_can_access_catalog(&self, identity: &Identity, catalog: &str) -> AccessResult {
        self.require_catalog(identity, catalog, AccessMode::ReadOnly)
    }

    fn filter_catalogs(
        &self,
        identity: &Identity,
        catalogs: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AccessError> {
        Ok(catalogs
            .iter()
            .filter(|catalog| self.catalog_access(identity, catalog) > AccessMode::None)
            .cloned()
            .collect())
    }

    fn check_can_show_schemas(&self, identity: &Identity, catalog: &str) -> AccessResult {
        self.require_catalog(identity, catalog, AccessMode::ReadOnly)
    }

    fn check_can_create_schema(
        &self,
        identity: &Identity,
        schema: &CatalogSchemaName,
    ) -> AccessResult {
        self.require_schema_owner(identity, schema, "create")
    }

    fn check_can_drop_schema(
        &self,
        identity: &Identity,
        schema: &CatalogSchemaName,
    ) -> AccessResult {
        self.require_schema_owner(identity, schema, "drop")
    }

    fn check_can_create_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult {
        self.require_table_privilege(identity, table, "create table", &[TablePrivilege::Ownership])
    }

    fn check_can_drop_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult {
        self.require_table_privilege(identity, table, "drop table", &[TablePrivilege::Ownership])
    }

    fn check_can_select_from_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
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
        table: &CatalogSchemaTableName,
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
        table: &CatalogSchemaTableName,
    ) -> AccessResult {
        self.require_table_privilege(
            identity,
            table,
            "delete from table",
            &[TablePrivilege::Delete],
        )
    }

    fn check_can_update_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult {
        self.require_table_privilege(identity, table, "update table", &[TablePrivilege::Update])
    }

    fn check_can_create_view(
        &self,
        identity: &Identity,
        view: &CatalogSchemaTableName,
    ) -> AccessResult {
        self.require_table_privilege(identity, view, "create view", &[TablePrivilege::Ownership])
    }

    fn check_can_set_catalog_session_property(
        &self,
        identity: &Identity,
        catalog: &str,
        property: &str,
    ) -> AccessResult {
        require_name("session property", property)?;
        self.require_catalog(identity, catalog, AccessMode::ReadOnly)?;
        if self.can_set_catalog_session_property(identity, catalog, property) {
            return Ok(());
        }
        Err(AccessError::denied(format!(
            "Cannot set catalog session property {catalog}.{property}"
        )))
    }

    fn check_can_execute_function(
        &self,
        identity: &Identity,
        function: &CatalogSchemaRoutineName,
    ) -> AccessResult {
        function.validate()?;
        self.require_catalog(identity, &function.catalog, AccessMode::ReadOnly)?;
        let privileges = self.function_privileges(identity, function);
        if privileges.contains(&FunctionPrivilege::Execute)
            || privileges.contains(&FunctionPrivilege::GrantExecute)
        {
            return Ok(());
        }
        Err(AccessError::denied(format!("Cannot execute function {function}")))
    }
}
