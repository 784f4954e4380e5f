//! Visitor identity.
//!
//! The session is read by the guard and the checkout; only the identity
//! provider's sign-in and sign-out results change it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role granted by the identity provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Buys tickets
    Customer,
    /// Manages the platform
    Admin,
    /// Manages their own events
    Artist,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
            Self::Artist => "artist",
        })
    }
}

/// Opaque bearer token attached to backend calls
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Who is using the storefront
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    /// Nobody signed in
    #[default]
    Anonymous,
    /// Signed in with a role; the credential can be missing if the identity
    /// provider has not issued one yet
    Authenticated {
        /// Granted role
        role: Role,
        /// Bearer token, if any
        credential: Option<Credential>,
    },
}

impl Session {
    /// Signed-in session with a credential
    #[must_use]
    pub fn signed_in(role: Role, token: impl Into<String>) -> Self {
        Self::Authenticated {
            role,
            credential: Some(Credential::new(token)),
        }
    }

    /// Whether someone is signed in
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Role of the signed-in visitor
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { role, .. } => Some(*role),
        }
    }

    /// Whether the visitor holds exactly `role`
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    /// Signed in as an admin
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Signed in as an artist
    #[must_use]
    pub fn is_artist(&self) -> bool {
        self.has_role(Role::Artist)
    }

    /// Bearer token, if signed in with one
    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        match self {
            Self::Authenticated {
                credential: Some(credential),
                ..
            } => Some(credential),
            _ => None,
        }
    }
}

/// Results reported by the identity provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// Sign-in completed
    SignedIn {
        /// Granted role
        role: Role,
        /// Issued bearer token
        credential: Option<Credential>,
    },
    /// Sign-out requested
    SignedOut,
}
