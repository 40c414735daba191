use std::collections::BTreeSet;

use bizdock_core::{ActorId, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::Permission;

/// Authenticated principal as seen by access decisions.
///
/// Held permission identifiers are opaque. Identifiers the catalog does not
/// know are kept and never match a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    subject: NonEmptyString,
    permissions: BTreeSet<String>,
    actor_id: Option<ActorId>,
}

impl Principal {
    /// Creates a principal from its account subject, held permissions and actor link.
    pub fn new<I, S>(
        subject: impl Into<String>,
        permissions: I,
        actor_id: Option<ActorId>,
    ) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            subject: NonEmptyString::new(subject)?,
            permissions: permissions.into_iter().map(Into::into).collect(),
            actor_id,
        })
    }

    /// Returns the account subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the held permission identifiers.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    /// Returns the linked business actor, if any.
    #[must_use]
    pub fn actor_id(&self) -> Option<ActorId> {
        self.actor_id
    }

    /// Returns whether the principal holds the permission.
    #[must_use]
    pub fn holds(&self, permission: Permission) -> bool {
        self.permissions.contains(permission.as_str())
    }
}
