//! Newtype IDs for type-safe entity references.
//!
//! Content documents are keyed by opaque string ids assigned by the CMS, so
//! the `define_id!` macro wraps `String` rather than an integer. User ids get
//! a hand-written type because guest ids carry meaning in their prefix.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>` and `From<String>` implementations
///
/// # Example
///
/// ```rust
/// # use leureluxe_core::define_id;
/// define_id!(ProductId);
/// define_id!(CategoryId);
///
/// let product_id = ProductId::new("abc");
/// let category_id = CategoryId::new("abc");
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = category_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(CategoryId);

/// Prefix that marks a locally generated, not-yet-authenticated user.
pub const GUEST_PREFIX: &str = "guest-";

/// Number of random base-36 characters after [`GUEST_PREFIX`].
const GUEST_SUFFIX_LEN: usize = 13;

/// Identifier of a shopper who owns a cart and a wishlist.
///
/// Authenticated users carry the id issued by the auth provider. Before
/// sign-in, a guest id of the form `guest-<13 base-36 chars>` is generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an id issued by the authentication provider.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh guest id.
    #[must_use]
    pub fn guest() -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..GUEST_SUFFIX_LEN)
            .map(|_| char::from_digit(rng.random_range(0..36), 36).unwrap_or('0'))
            .collect();
        Self(format!("{GUEST_PREFIX}{suffix}"))
    }

    /// Whether this id was generated locally for an anonymous shopper.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0.starts_with(GUEST_PREFIX)
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_id_shape() {
        let id = UserId::guest();
        assert!(id.is_guest());
        let suffix = id.as_str().strip_prefix(GUEST_PREFIX).unwrap_or_default();
        assert_eq!(suffix.len(), GUEST_SUFFIX_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_guest_ids_differ() {
        assert_ne!(UserId::guest(), UserId::guest());
    }

    #[test]
    fn test_authenticated_id_is_not_guest() {
        assert!(!UserId::new("user_2abcXYZ").is_guest());
        assert!(!UserId::new("guest").is_guest());
    }

    #[test]
    fn test_product_id_serializes_transparently() {
        let id = ProductId::new("prod-1");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"prod-1\""));
        assert_eq!(id.to_string(), "prod-1");
    }
}
