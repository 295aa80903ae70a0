//! Configuration for selecting and refreshing the rule source.
//!
//! Property names follow the `security.*` keys engines already use for
//! file-based access control, so a catalog properties file can be passed to
//! [`AccessControlConfig::from_properties`] unchanged.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::forwarding::ForwardingAccessControl;
use crate::parse::parse_duration;
use crate::refresh::{check_refresh_period, RefreshingSupplier};
use crate::source::{validate_pointer, LocalFileSource, RemoteHttpSource, RuleSource};
use crate::{CatalogPolicyEngine, CatalogRuleDocument, PolicyEngine};

pub const CONFIG_FILE: &str = "security.config-file";
pub const CONFIG_URL: &str = "security.config-url";
pub const REST_FLAG: &str = "security.rest";
pub const JSON_POINTER: &str = "security.json-pointer";
pub const REFRESH_PERIOD: &str = "security.refresh-period";

/// Where the rule document lives and how often to re-read it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessControlConfig {
    /// Local path, or an `http(s)://` URL which implies remote mode.
    #[serde(rename = "security.config-file")]
    pub config_file: Option<String>,

    #[serde(rename = "security.config-url")]
    pub config_url: Option<String>,

    /// Fetch over HTTP even if the location does not look like a URL.
    #[serde(rename = "security.rest", default)]
    pub rest: bool,

    /// JSON pointer to the rules inside the fetched document (remote only).
    #[serde(rename = "security.json-pointer", default)]
    pub json_pointer: String,

    /// `None` builds the policy once and keeps it.
    #[serde(
        rename = "security.refresh-period",
        default,
        deserialize_with = "deserialize_refresh_period"
    )]
    pub refresh_period: Option<Duration>,
}

impl AccessControlConfig {
    /// Build a configuration from `key=value` properties and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on unknown keys, unparseable values, or a
    /// configuration that fails [`validate`](Self::validate).
    pub fn from_properties<I, K, V>(properties: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in properties {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            match key {
                CONFIG_FILE => config.config_file = Some(value.to_owned()),
                CONFIG_URL => config.config_url = Some(value.to_owned()),
                REST_FLAG => {
                    config.rest = value.parse().map_err(|_| ConfigError::InvalidProperty {
                        key: key.to_owned(),
                        reason: format!("'{value}' is not a boolean"),
                    })?;
                }
                JSON_POINTER => config.json_pointer = value.to_owned(),
                REFRESH_PERIOD => {
                    let period = parse_duration(value).map_err(|e| ConfigError::InvalidProperty {
                        key: key.to_owned(),
                        reason: e.to_string(),
                    })?;
                    config.refresh_period = Some(period);
                }
                other => {
                    return Err(ConfigError::UnknownProperty {
                        key: other.to_owned(),
                    })
                }
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// True if the rules are fetched over HTTP.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.rest || self.config_url.is_some() || self.config_file.as_deref().is_some_and(is_url)
    }

    /// The file path or URL the rules are read from.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        let location = if self.is_remote() {
            self.config_url.as_deref().or(self.config_file.as_deref())
        } else {
            self.config_file.as_deref()
        };
        location.filter(|l| !l.is_empty())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if no location is configured, the refresh
    /// period is below 1ms, or the pointer is malformed or set for a local
    /// file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.location().is_none() {
            let key = if self.is_remote() { CONFIG_URL } else { CONFIG_FILE };
            return Err(ConfigError::MissingProperty { key });
        }
        if !self.is_remote() && !self.json_pointer.is_empty() {
            return Err(ConfigError::InvalidProperty {
                key: JSON_POINTER.to_owned(),
                reason: "only applies to rules fetched over HTTP".to_owned(),
            });
        }
        if let Some(period) = self.refresh_period {
            check_refresh_period(period)?;
        }
        validate_pointer(&self.json_pointer)
    }

    /// Select the rule source. Called once; the choice is not revisited.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid or the HTTP
    /// client cannot be created.
    pub fn source(&self) -> Result<RuleSource, ConfigError> {
        self.validate()?;
        let location = self
            .location()
            .ok_or(ConfigError::MissingProperty { key: CONFIG_FILE })?;
        if self.is_remote() {
            Ok(RemoteHttpSource::new(location, self.json_pointer.clone())?.into())
        } else {
            Ok(LocalFileSource::new(location).into())
        }
    }
}

/// Wire a configuration into the access control handed to the engine.
///
/// # Errors
///
/// Returns [`ConfigError`] if the configuration is invalid. Problems with the
/// rule document itself are reported by the first access check instead.
pub fn build_access_control(
    config: &AccessControlConfig,
) -> Result<ForwardingAccessControl<PolicyEngine>, ConfigError> {
    let source = config.source()?;
    tracing::info!(
        source = %source,
        refresh_period = ?config.refresh_period,
        "configured system access control"
    );
    let supplier = RefreshingSupplier::new(source, config.refresh_period, |document| {
        Ok(PolicyEngine::from_document(document))
    })?;
    Ok(ForwardingAccessControl::new(supplier))
}

/// Wire a configuration into the access control for a single catalog.
///
/// The document at the configured location holds [`CatalogRuleDocument`]
/// rules, evaluated with `catalog` as the catalog name.
///
/// # Errors
///
/// Returns [`ConfigError`] if the configuration is invalid or `catalog` is
/// empty.
pub fn build_catalog_access_control(
    catalog: &str,
    config: &AccessControlConfig,
) -> Result<ForwardingAccessControl<CatalogPolicyEngine, CatalogRuleDocument>, ConfigError> {
    if catalog.is_empty() {
        return Err(ConfigError::InvalidProperty {
            key: "catalog".to_owned(),
            reason: "catalog name must not be empty".to_owned(),
        });
    }
    let source = config.source()?;
    tracing::info!(
        %catalog,
        source = %source,
        refresh_period = ?config.refresh_period,
        "configured catalog access control"
    );
    let name = catalog.to_owned();
    let supplier = RefreshingSupplier::new(source, config.refresh_period, move |document| {
        Ok(CatalogPolicyEngine::from_document(name.clone(), document))
    })?
    .with_scope(format!("access control for catalog '{catalog}'"));
    Ok(ForwardingAccessControl::new(supplier))
}

fn is_url(location: &str) -> bool {
    location.starts_with("https://") || location.starts_with("http://")
}

fn deserialize_refresh_period<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|value| parse_duration(&value).map_err(serde::de::Error::custom))
        .transpose()
}
