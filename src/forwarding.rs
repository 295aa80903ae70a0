use std::collections::BTreeSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::access::{AccessResult, SystemAccessControl};
use crate::connector::ConnectorAccessControl;
use crate::error::AccessError;
use crate::refresh::RefreshingSupplier;
use crate::{
    CatalogSchemaName, CatalogSchemaRoutineName, CatalogSchemaTableName, Identity, RuleDocument,
    SchemaRoutineName, SchemaTableName,
};

/// The access control handed to the query engine.
///
/// Every check fetches the current delegate from a [`RefreshingSupplier`],
/// which may rebuild it, and forwards the call. A delegate that cannot be
/// loaded surfaces as [`AccessError::Configuration`], never as a denial.
///
/// The same facade serves system-wide checks over a [`RuleDocument`] and
/// catalog-scoped checks over a [`CatalogRuleDocument`](crate::CatalogRuleDocument).
pub struct ForwardingAccessControl<A, D = RuleDocument> {
    supplier: Arc<RefreshingSupplier<A, D>>,
}

impl<A, D: DeserializeOwned> ForwardingAccessControl<A, D> {
    #[must_use]
    pub fn new(supplier: RefreshingSupplier<A, D>) -> Self {
        Self {
            supplier: Arc::new(supplier),
        }
    }

    #[must_use]
    pub fn supplier(&self) -> &RefreshingSupplier<A, D> {
        &self.supplier
    }

    /// The access control currently in effect.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Configuration`] if it had to be rebuilt and the
    /// rebuild failed.
    pub fn delegate(&self) -> Result<Arc<A>, AccessError> {
        Ok(self.supplier.get()?)
    }
}

impl<A, D> Clone for ForwardingAccessControl<A, D> {
    fn clone(&self) -> Self {
        Self {
            supplier: Arc::clone(&self.supplier),
        }
    }
}

impl<A, D> SystemAccessControl for ForwardingAccessControl<A, D>
where
    A: SystemAccessControl,
    D: DeserializeOwned,
{
    fn check_can_set_user(&self, principal: Option<&str>, user: &str) -> AccessResult {
        self.delegate()?.check_can_set_user(principal, user)
    }

    fn check_can_impersonate_user(&self, identity: &Identity, user: &str) -> AccessResult {
        self.delegate()?.check_can_impersonate_user(identity, user)
    }

    fn check_can_execute_query(&self, identity: &Identity) -> AccessResult {
        self.delegate()?.check_can_execute_query(identity)
    }

    fn check_can_view_query_owned_by(&self, identity: &Identity, owner: &str) -> AccessResult {
        self.delegate()?.check_can_view_query_owned_by(identity, owner)
    }

    fn check_can_kill_query_owned_by(&self, identity: &Identity, owner: &str) -> AccessResult {
        self.delegate()?.check_can_kill_query_owned_by(identity, owner)
    }

    fn check_can_read_system_information(&self, identity: &Identity) -> AccessResult {
        self.delegate()?.check_can_read_system_information(identity)
    }

    fn check_can_write_system_information(&self, identity: &Identity) -> AccessResult {
        self.delegate()?.check_can_write_system_information(identity)
    }

    fn check_can_set_system_session_property(
        &self,
        identity: &Identity,
        property: &str,
    ) -> AccessResult {
        self.delegate()?
            .check_can_set_system_session_property(identity, property)
    }

    fn check_can_access_catalog(&self, identity: &Identity, catalog: &str) -> AccessResult {
        self.delegate()?.check_can_access_catalog(identity, catalog)
    }

    fn filter_catalogs(
        &self,
        identity: &Identity,
        catalogs: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AccessError> {
        self.delegate()?.filter_catalogs(identity, catalogs)
    }

    fn check_can_show_schemas(&self, identity: &Identity, catalog: &str) -> AccessResult {
        self.delegate()?.check_can_show_schemas(identity, catalog)
    }

    fn check_can_create_schema(
        &self,
        identity: &Identity,
        schema: &CatalogSchemaName,
    ) -> AccessResult {
        self.delegate()?.check_can_create_schema(identity, schema)
    }

    fn check_can_drop_schema(
        &self,
        identity: &Identity,
        schema: &CatalogSchemaName,
    ) -> AccessResult {
        self.delegate()?.check_can_drop_schema(identity, schema)
    }

    fn check_can_create_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult {
        self.delegate()?.check_can_create_table(identity, table)
    }

    fn check_can_drop_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult {
        self.delegate()?.check_can_drop_table(identity, table)
    }

    fn check_can_select_from_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult {
        self.delegate()?.check_can_select_from_table(identity, table)
    }

    fn check_can_insert_into_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult {
        self.delegate()?.check_can_insert_into_table(identity, table)
    }

    fn check_can_delete_from_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult {
        self.delegate()?.check_can_delete_from_table(identity, table)
    }

    fn check_can_update_table(
        &self,
        identity: &Identity,
        table: &CatalogSchemaTableName,
    ) -> AccessResult {
        self.delegate()?.check_can_update_table(identity, table)
    }

    fn check_can_create_view(
        &self,
        identity: &Identity,
        view: &CatalogSchemaTableName,
    ) -> AccessResult {
        self.delegate()?.check_can_create_view(identity, view)
    }

    fn check_can_set_catalog_session_property(
        &self,
        identity: &Identity,
        catalog: &str,
        property: &str,
    ) -> AccessResult {
        self.delegate()?
            .check_can_set_catalog_session_property(identity, catalog, property)
    }

    fn check_can_execute_function(
        &self,
        identity: &Identity,
        function: &CatalogSchemaRoutineName,
    ) -> AccessResult {
        self.delegate()?.check_can_execute_function(identity, function)
    }
}

impl<A, D> ConnectorAccessControl for ForwardingAccessControl<A, D>
where
    A: ConnectorAccessControl,
    D: DeserializeOwned,
{
    fn check_can_create_schema(&self, identity: &Identity, schema: &str) -> AccessResult {
        self.delegate()?.check_can_create_schema(identity, schema)
    }

    fn check_can_drop_schema(&self, identity: &Identity, schema: &str) -> AccessResult {
        self.delegate()?.check_can_drop_schema(identity, schema)
    }

    fn check_can_create_table(&self, identity: &Identity, table: &SchemaTableName) -> AccessResult {
        self.delegate()?.check_can_create_table(identity, table)
    }

    fn check_can_drop_table(&self, identity: &Identity, table: &SchemaTableName) -> AccessResult {
        self.delegate()?.check_can_drop_table(identity, table)
    }

    fn check_can_select_from_table(
        &self,
        identity: &Identity,
        table: &SchemaTableName,
    ) -> AccessResult {
        self.delegate()?.check_can_select_from_table(identity, table)
    }

    fn check_can_insert_into_table(
        &self,
        identity: &Identity,
        table: &SchemaTableName,
    ) -> AccessResult {
        self.delegate()?.check_can_insert_into_table(identity, table)
    }

    fn check_can_delete_from_table(
        &self,
        identity: &Identity,
        table: &SchemaTableName,
    ) -> AccessResult {
        self.delegate()?.check_can_delete_from_table(identity, table)
    }

    fn check_can_update_table(&self, identity: &Identity, table: &SchemaTableName) -> AccessResult {
        self.delegate()?.check_can_update_table(identity, table)
    }

    fn check_can_create_view(&self, identity: &Identity, view: &SchemaTableName) -> AccessResult {
        self.delegate()?.check_can_create_view(identity, view)
    }

    fn check_can_set_session_property(&self, identity: &Identity, property: &str) -> AccessResult {
        self.delegate()?.check_can_set_session_property(identity, property)
    }

    fn check_can_execute_function(
        &self,
        identity: &Identity,
        function: &SchemaRoutineName,
    ) -> AccessResult {
        self.delegate()?.check_can_execute_function(identity, function)
    }
}
