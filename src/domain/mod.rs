//! Domain primitives shared by the services and the HTTP layer.
//!
//! IDs are newtypes so a user id cannot be passed where an article id is
//! expected. [`Permission`] is the canonical catalog seeded at startup.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a registered user.
    ///
    /// ```rust
    /// use pressroom::domain::UserId;
    ///
    /// let id = UserId::new(7);
    /// assert_eq!(id.value(), 7);
    /// assert_eq!(id.to_string(), "7");
    /// ```
    UserId
);

id_newtype!(
    /// Identifier of an article.
    ArticleId
);

/// Canonical permissions every deployment carries.
///
/// The catalog table may hold more rows than these; routes only ever declare
/// requirements in terms of this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Manages articles and users. Bypasses article ownership.
    Admin,
    /// Manages their own articles.
    Editor,
    /// Read-only access to member views.
    Reader,
}

impl Permission {
    pub const ALL: [Self; 3] = [Self::Admin, Self::Editor, Self::Reader];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Reader => "reader",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Admin => "Manage articles and users",
            Self::Editor => "Manage own articles",
            Self::Reader => "Read articles only",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
