//! Session record layout.
//!
//! Each browser gets one tower-sessions record. The client store lives under
//! [`keys::CART_STORAGE`] as the camelCase JSON document
//! `{ "userCarts": .., "userWishlists": .., "currentUserId": .. }`.

/// Session keys.
pub mod keys {
    /// Key for the persisted cart and wishlist state of this client.
    pub const CART_STORAGE: &str = "cart-storage";
}
