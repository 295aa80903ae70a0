use std::fmt;

use crate::error::AccessError;

/// A schema, addressed by catalog and schema name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogSchemaName {
    pub catalog: String,
    pub schema: String,
}

/// A table or view, addressed by catalog, schema and table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogSchemaTableName {
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

/// A function, addressed by catalog, schema and function name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogSchemaRoutineName {
    pub catalog: String,
    pub schema: String,
    pub routine: String,
}

/// A table or view inside the catalog a connector serves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaTableName {
    pub schema: String,
    pub table: String,
}

/// A function inside the catalog a connector serves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaRoutineName {
    pub schema: String,
    pub routine: String,
}

impl CatalogSchemaName {
    #[must_use]
    pub fn new(catalog: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), AccessError> {
        require_parts(self, &[&self.catalog, &self.schema])
    }
}

impl CatalogSchemaTableName {
    #[must_use]
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    #[must_use]
    pub fn schema_name(&self) -> CatalogSchemaName {
        CatalogSchemaName::new(&self.catalog, &self.schema)
    }

    pub(crate) fn validate(&self) -> Result<(), AccessError> {
        require_parts(self, &[&self.catalog, &self.schema, &self.table])
    }
}

impl CatalogSchemaRoutineName {
    #[must_use]
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        routine: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            routine: routine.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), AccessError> {
        require_parts(self, &[&self.catalog, &self.schema, &self.routine])
    }
}

impl SchemaTableName {
    #[must_use]
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    #[must_use]
    pub fn in_catalog(&self, catalog: &str) -> CatalogSchemaTableName {
        CatalogSchemaTableName::new(catalog, &self.schema, &self.table)
    }

    pub(crate) fn validate(&self) -> Result<(), AccessError> {
        require_parts(self, &[&self.schema, &self.table])
    }
}

impl SchemaRoutineName {
    #[must_use]
    pub fn new(schema: impl Into<String>, routine: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            routine: routine.into(),
        }
    }

    #[must_use]
    pub fn in_catalog(&self, catalog: &str) -> CatalogSchemaRoutineName {
        CatalogSchemaRoutineName::new(catalog, &self.schema, &self.routine)
    }

    pub(crate) fn validate(&self) -> Result<(), AccessError> {
        require_parts(self, &[&self.schema, &self.routine])
    }
}

/// Every level of a resource hierarchy must be named.
fn require_parts(resource: &dyn fmt::Display, parts: &[&str]) -> Result<(), AccessError> {
    if parts.iter().any(|part| part.is_empty()) {
        return Err(AccessError::InvalidRequest {
            message: format!("resource name '{resource}' has an empty component"),
        });
    }
    Ok(())
}

pub(crate) fn require_name(kind: &str, name: &str) -> Result<(), AccessError> {
    if name.is_empty() {
        return Err(AccessError::InvalidRequest {
            message: format!("{kind} name must not be empty"),
        });
    }
    Ok(())
}

impl fmt::Display for CatalogSchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.catalog, self.schema)
    }
}

impl fmt::Display for CatalogSchemaTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

impl fmt::Display for CatalogSchemaRoutineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.routine)
    }
}

impl fmt::Display for SchemaTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

impl fmt::Display for SchemaRoutineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.routine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_dotted() {
        let table = CatalogSchemaTableName::new("hive", "web", "clicks");
        assert_eq!(table.to_string(), "hive.web.clicks");
        assert_eq!(table.schema_name().to_string(), "hive.web");
    }

    #[test]
    fn empty_component_is_invalid() {
        let table = CatalogSchemaTableName::new("hive", "", "clicks");
        assert!(matches!(
            table.validate(),
            Err(AccessError::InvalidRequest { .. })
        ));
        assert!(CatalogSchemaName::new("hive", "web").validate().is_ok());
    }

    #[test]
    fn connector_names_qualify_with_catalog() {
        let table = SchemaTableName::new("web", "clicks");
        assert_eq!(table.to_string(), "web.clicks");
        assert_eq!(table.in_catalog("hive").to_string(), "hive.web.clicks");
        assert!(SchemaRoutineName::new("", "f").validate().is_err());
    }
}
