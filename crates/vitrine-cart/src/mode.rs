//! Authentication mode of the cart and the reload decision on mode changes.

use std::fmt;

use serde::Serialize;

/// Which backing store is authoritative for the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Local persistent storage.
    Unauthenticated,
    /// Remote cart endpoint.
    Authenticated,
}

impl AuthMode {
    #[must_use]
    pub fn from_authenticated(authenticated: bool) -> Self {
        if authenticated {
            AuthMode::Authenticated
        } else {
            AuthMode::Unauthenticated
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::Unauthenticated => "unauthenticated",
            AuthMode::Authenticated => "authenticated",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to an anonymous cart when the shopper signs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// The local cart stays on the device untouched and the remote cart is
    /// loaded in its place.
    #[default]
    KeepSeparate,
    /// Every local line is added to the remote cart before it is loaded; the
    /// local copy is cleared once all lines were accepted.
    MergeIntoRemote,
}

impl MergePolicy {
    #[must_use]
    pub fn from_flag(merge_on_login: bool) -> Self {
        if merge_on_login {
            MergePolicy::MergeIntoRemote
        } else {
            MergePolicy::KeepSeparate
        }
    }
}

/// Work the store performs after switching from one mode to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadAction {
    /// Mode unchanged; current contents stay.
    None,
    LoadLocal,
    LoadRemote,
    MergeLocalThenLoadRemote,
}

/// Decides the reload for a mode change. Pure; the store applies the result.
#[must_use]
pub fn transition(old: AuthMode, new: AuthMode, policy: MergePolicy) -> ReloadAction {
    match (old, new) {
        (AuthMode::Unauthenticated, AuthMode::Unauthenticated)
        | (AuthMode::Authenticated, AuthMode::Authenticated) => ReloadAction::None,
        (AuthMode::Authenticated, AuthMode::Unauthenticated) => ReloadAction::LoadLocal,
        (AuthMode::Unauthenticated, AuthMode::Authenticated) => match policy {
            MergePolicy::KeepSeparate => ReloadAction::LoadRemote,
            MergePolicy::MergeIntoRemote => ReloadAction::MergeLocalThenLoadRemote,
        },
    }
}
