mod access;
mod compile;
pub mod config;
mod connector;
mod error;
mod evaluate;
mod forwarding;
pub mod parse;
mod refresh;
mod source;
mod types;

pub use access::{AccessResult, SystemAccessControl};
pub use config::{build_access_control, build_catalog_access_control, AccessControlConfig};
pub use connector::ConnectorAccessControl;
pub use error::{AccessError, ConfigError, RuleSourceError};
pub use forwarding::ForwardingAccessControl;
pub use refresh::{RefreshingSupplier, MIN_REFRESH_PERIOD};
pub use source::{LocalFileSource, RemoteHttpSource, RuleSource, DEFAULT_REQUEST_TIMEOUT};
pub use types::{
    AccessMode, CatalogPolicyEngine, CatalogRule, CatalogRuleDocument, CatalogSchemaName,
    CatalogSchemaRoutineName, CatalogSchemaTableName, CatalogSessionPropertyRule,
    FunctionPrivilege, FunctionRule, Identity, ImpersonationRule, Pattern, PolicyEngine,
    PrincipalUserMatchRule, QueryAccess, QueryAccessRule, RuleCategory, RuleDocument,
    SchemaRoutineName, SchemaRule, SchemaTableName, SessionPropertyRule, SystemInformationAccess,
    SystemInformationRule, TablePrivilege, TableRule,
};
