//! Tracked content items and their fetch state machine.
//!
//! ```text
//! NotRequested --issue_claim--> AwaitingGrant --grant received--> Fetching --file located--> Ready
//!       \                            \                               \
//!        `----------------------------`-------------------------------`--> Failed
//! ```
//!
//! `Failed` and `Ready` are never left automatically; a new claim moves the
//! item back to `AwaitingGrant`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ContentId;

/// Why the local peer tracks a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The local account published this item.
    Published,
    /// The local account holds (or is claiming) an entitlement token.
    Collected,
}

/// Accumulated role flags. Roles are never removed once set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    pub published: bool,
    pub collected: bool,
}

impl Roles {
    /// Flags with a single role set.
    pub fn only(role: Role) -> Self {
        let mut roles = Self::default();
        roles.insert(role);
        roles
    }

    /// Set a role. Returns true if it was newly set.
    pub fn insert(&mut self, role: Role) -> bool {
        let flag = match role {
            Role::Published => &mut self.published,
            Role::Collected => &mut self.collected,
        };
        let added = !*flag;
        *flag = true;
        added
    }

    /// Check whether a role is set.
    pub fn contains(&self, role: Role) -> bool {
        match role {
            Role::Published => self.published,
            Role::Collected => self.collected,
        }
    }
}

/// Per-item progress of an access request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchState {
    #[default]
    NotRequested,
    AwaitingGrant,
    Fetching,
    Ready,
    Failed,
}

impl FetchState {
    /// Check whether `self -> next` is a legal transition.
    ///
    /// A new claim may restart any item except one whose fetch is in
    /// flight. `Failed` is reachable from every non-final state.
    pub fn can_transition_to(self, next: FetchState) -> bool {
        use FetchState::*;
        match (self, next) {
            (Fetching, AwaitingGrant) => false,
            (_, AwaitingGrant) => true,
            (AwaitingGrant, Fetching) => true,
            (Fetching, Ready) => true,
            (NotRequested | AwaitingGrant | Fetching, Failed) => true,
            _ => false,
        }
    }

    /// Whether the item has reached a state that is not left automatically.
    pub fn is_final(self) -> bool {
        matches!(self, FetchState::Ready | FetchState::Failed)
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchState::NotRequested => "not-requested",
            FetchState::AwaitingGrant => "awaiting-grant",
            FetchState::Fetching => "fetching",
            FetchState::Ready => "ready",
            FetchState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Resolved local location of a fetched file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One tracked content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Ledger address of the item.
    pub id: ContentId,
    /// Why the item is tracked.
    pub roles: Roles,
    /// Progress of the most recent access request.
    pub fetch_state: FetchState,
    /// Local location of the fetched file; only set once `Ready`.
    pub locator: Option<Locator>,
}

impl ContentItem {
    /// A freshly tracked item with a single role.
    pub fn new(id: ContentId, role: Role) -> Self {
        Self {
            id,
            roles: Roles::only(role),
            fetch_state: FetchState::NotRequested,
            locator: None,
        }
    }
}
