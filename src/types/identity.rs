use std::collections::BTreeSet;

use super::pattern::{matches, matches_any, Pattern};

/// The principal an access check is made on behalf of.
///
/// Carries the session user, the authenticated principal name (if any), and
/// the enabled roles and groups rule matchers are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    user: String,
    principal: Option<String>,
    roles: BTreeSet<String>,
    groups: BTreeSet<String>,
}

impl Identity {
    #[must_use]
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.insert(group.into());
        self
    }

    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    #[must_use]
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// True if every declared principal matcher accepts this identity.
    pub(crate) fn matches(
        &self,
        user: Option<&Pattern>,
        role: Option<&Pattern>,
        group: Option<&Pattern>,
    ) -> bool {
        matches(user, &self.user)
            && matches_any(role, self.roles.iter())
            && matches_any(group, self.groups.iter())
    }
}
