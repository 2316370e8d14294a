//! Per-user cart and wishlist state.
//!
//! One [`StoreState`] holds the carts and wishlists of every user who has
//! shopped from a single client, plus a pointer to the active user. A shopper
//! starts as a guest; after sign-in, [`StoreState::migrate_guest_to_user`]
//! carries the guest's cart and wishlist over to the authenticated id.
//!
//! Every operation is total. When no user is active, mutations do nothing and
//! queries return empty values.
//!
//! # Serialized form
//!
//! The state serializes to the persisted record
//! `{ "userCarts": {..}, "userWishlists": {..}, "currentUserId": ".." }`.
//!
//! # Invariants
//!
//! - At most one cart and one wishlist per user id.
//! - Cart quantities are at least 1; an entry is removed, never stored at 0.
//! - Product ids are unique within a cart and within a wishlist.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId, UserId};

/// A product in a cart with its aggregate quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Price times quantity, counting a missing price as zero.
    ///
    /// Saturates at [`Decimal::MAX`]; checkout rejects such lines through
    /// [`CartItem::checked_line_total`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.checked_line_total().unwrap_or(Decimal::MAX)
    }

    /// Price times quantity, or `None` if it does not fit in a `Decimal`.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.product
            .price_or_zero()
            .checked_mul(Decimal::from(self.quantity))
    }
}

/// Carts and wishlists of every user seen by one client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    user_carts: BTreeMap<UserId, Vec<CartItem>>,
    #[serde(default)]
    user_wishlists: BTreeMap<UserId, Vec<Product>>,
    #[serde(default)]
    current_user_id: Option<UserId>,
}

impl StoreState {
    /// Create an empty state with no active user.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a fresh guest id if no user is active.
    ///
    /// Called once after the persisted record is restored. Returns `true`
    /// when a guest id was generated, meaning the state should be saved.
    pub fn hydrate(&mut self) -> bool {
        if self.current_user_id.is_some() {
            return false;
        }
        self.current_user_id = Some(UserId::guest());
        true
    }

    // =========================================================================
    // User management
    // =========================================================================

    /// The active user, if any.
    #[must_use]
    pub const fn current_user_id(&self) -> Option<&UserId> {
        self.current_user_id.as_ref()
    }

    /// Replace the active user pointer. Other users' data is left untouched.
    pub fn set_current_user(&mut self, user_id: Option<UserId>) {
        self.current_user_id = user_id;
    }

    /// Move a guest shopper onto an authenticated id.
    ///
    /// Only acts when the active user is a guest: the guest's cart and
    /// wishlist (empty if absent) are copied to `user_id` and the pointer is
    /// switched. The guest's own entries are kept. Returns whether a
    /// migration happened.
    pub fn migrate_guest_to_user(&mut self, user_id: UserId) -> bool {
        let Some(guest_id) = self.current_user_id.as_ref().filter(|id| id.is_guest()) else {
            return false;
        };

        let cart = self.user_carts.get(guest_id).cloned().unwrap_or_default();
        let wishlist = self
            .user_wishlists
            .get(guest_id)
            .cloned()
            .unwrap_or_default();

        self.user_carts.insert(user_id.clone(), cart);
        self.user_wishlists.insert(user_id.clone(), wishlist);
        self.current_user_id = Some(user_id);
        true
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add one unit of `product` to the active cart.
    ///
    /// Increments the quantity if the product is already present, otherwise
    /// appends it with quantity 1.
    pub fn add_to_cart(&mut self, product: Product) {
        let Some(cart) = self.active_cart_mut() else {
            return;
        };

        if let Some(item) = cart.iter_mut().find(|item| item.product.id == product.id) {
            item.quantity = item.quantity.saturating_add(1);
        } else {
            cart.push(CartItem {
                product,
                quantity: 1,
            });
        }
    }

    /// Remove `product_id` from the active cart entirely.
    pub fn delete_cart_product(&mut self, product_id: &ProductId) {
        if let Some(cart) = self.active_cart_mut() {
            cart.retain(|item| &item.product.id != product_id);
        }
    }

    /// Empty the active cart.
    pub fn reset_cart(&mut self) {
        if let Some(cart) = self.active_cart_mut() {
            cart.clear();
        }
    }

    /// The active cart's items with their quantities, in insertion order.
    #[must_use]
    pub fn grouped_items(&self) -> Vec<CartItem> {
        self.active_cart().to_vec()
    }

    /// Quantity of `product_id` in the active cart, 0 if absent.
    #[must_use]
    pub fn item_count(&self, product_id: &ProductId) -> u32 {
        self.active_cart()
            .iter()
            .find(|item| &item.product.id == product_id)
            .map_or(0, |item| item.quantity)
    }

    /// Total number of units in the active cart.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.active_cart()
            .iter()
            .fold(0, |sum, item| sum.saturating_add(item.quantity))
    }

    /// Sum of price times quantity over the active cart, saturating at
    /// [`Decimal::MAX`].
    #[must_use]
    pub fn sub_total_price(&self) -> Decimal {
        self.active_cart()
            .iter()
            .map(CartItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Cart total. Discounts are applied at checkout, so this equals the subtotal.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.sub_total_price()
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Add `product` to the active wishlist unless it is already there.
    pub fn add_to_wishlist(&mut self, product: Product) {
        let Some(wishlist) = self.active_wishlist_mut() else {
            return;
        };
        if !wishlist.iter().any(|p| p.id == product.id) {
            wishlist.push(product);
        }
    }

    /// Remove `product_id` from the active wishlist.
    pub fn remove_from_wishlist(&mut self, product_id: &ProductId) {
        if let Some(wishlist) = self.active_wishlist_mut() {
            wishlist.retain(|p| &p.id != product_id);
        }
    }

    /// Empty the active wishlist.
    pub fn reset_wishlist(&mut self) {
        if let Some(wishlist) = self.active_wishlist_mut() {
            wishlist.clear();
        }
    }

    /// The active wishlist, in insertion order.
    #[must_use]
    pub fn wishlist(&self) -> &[Product] {
        self.current_user_id
            .as_ref()
            .and_then(|id| self.user_wishlists.get(id))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether `product_id` is on the active wishlist.
    #[must_use]
    pub fn is_wishlisted(&self, product_id: &ProductId) -> bool {
        self.wishlist().iter().any(|p| &p.id == product_id)
    }

    // =========================================================================
    // Per-user access
    // =========================================================================

    /// Cart of an arbitrary user, empty if they have none.
    #[must_use]
    pub fn cart_of(&self, user_id: &UserId) -> &[CartItem] {
        self.user_carts
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Wishlist of an arbitrary user, empty if they have none.
    #[must_use]
    pub fn wishlist_of(&self, user_id: &UserId) -> &[Product] {
        self.user_wishlists
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn active_cart(&self) -> &[CartItem] {
        self.current_user_id
            .as_ref()
            .map(|id| self.cart_of(id))
            .unwrap_or_default()
    }

    fn active_cart_mut(&mut self) -> Option<&mut Vec<CartItem>> {
        let id = self.current_user_id.clone()?;
        Some(self.user_carts.entry(id).or_default())
    }

    fn active_wishlist_mut(&mut self) -> Option<&mut Vec<Product>> {
        let id = self.current_user_id.clone()?;
        Some(self.user_wishlists.entry(id).or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, price: Option<i64>) -> Product {
        Product {
            id: ProductId::new(id),
            name: Some(format!("Product {id}")),
            slug: None,
            description: None,
            price: price.map(Decimal::from),
            images: Vec::new(),
            stock: None,
        }
    }

    fn state_for(user: &str) -> StoreState {
        let mut state = StoreState::new();
        state.set_current_user(Some(UserId::new(user)));
        state
    }

    #[test]
    fn test_repeated_add_merges_quantity() {
        let mut state = state_for("user_1");
        for _ in 0..5 {
            state.add_to_cart(product("a", Some(10)));
        }
        let items = state.grouped_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(state.item_count(&ProductId::new("a")), 5);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut state = state_for("user_1");
        state.add_to_cart(product("b", Some(1)));
        state.add_to_cart(product("a", Some(1)));
        state.add_to_cart(product("b", Some(1)));
        let ids: Vec<_> = state
            .grouped_items()
            .into_iter()
            .map(|item| item.product.id.into_inner())
            .collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_delete_then_count_is_zero() {
        let mut state = state_for("user_1");
        state.add_to_cart(product("a", Some(10)));
        state.add_to_cart(product("a", Some(10)));
        state.delete_cart_product(&ProductId::new("a"));
        assert_eq!(state.item_count(&ProductId::new("a")), 0);
        assert!(state.grouped_items().is_empty());
    }

    #[test]
    fn test_delete_absent_product_is_noop() {
        let mut state = state_for("user_1");
        state.add_to_cart(product("a", Some(10)));
        let before = state.clone();
        state.delete_cart_product(&ProductId::new("missing"));
        assert_eq!(state.grouped_items(), before.grouped_items());
    }

    #[test]
    fn test_subtotal_sums_price_times_quantity() {
        let mut state = state_for("user_1");
        state.add_to_cart(product("a", Some(100)));
        state.add_to_cart(product("a", Some(100)));
        state.add_to_cart(product("b", Some(250)));
        state.add_to_cart(product("free", None));
        assert_eq!(state.sub_total_price(), Decimal::from(450));
        assert_eq!(state.total_price(), state.sub_total_price());
        assert_eq!(state.total_quantity(), 4);
    }

    #[test]
    fn test_subtotal_isolated_from_other_users() {
        let mut state = state_for("user_1");
        state.add_to_cart(product("a", Some(100)));

        state.set_current_user(Some(UserId::new("user_2")));
        state.add_to_cart(product("b", Some(999)));
        state.add_to_cart(product("b", Some(999)));

        state.set_current_user(Some(UserId::new("user_1")));
        assert_eq!(state.sub_total_price(), Decimal::from(100));
        assert_eq!(state.cart_of(&UserId::new("user_2")).len(), 1);
    }

    #[test]
    fn test_reset_cart_only_clears_active_user() {
        let mut state = state_for("user_1");
        state.add_to_cart(product("a", Some(1)));
        state.set_current_user(Some(UserId::new("user_2")));
        state.add_to_cart(product("b", Some(1)));
        state.reset_cart();
        assert!(state.grouped_items().is_empty());
        assert_eq!(state.cart_of(&UserId::new("user_1")).len(), 1);
    }

    #[test]
    fn test_no_active_user_is_noop() {
        let mut state = StoreState::new();
        state.add_to_cart(product("a", Some(10)));
        state.add_to_wishlist(product("a", Some(10)));
        state.reset_cart();
        state.delete_cart_product(&ProductId::new("a"));
        assert_eq!(state, StoreState::new());
        assert!(state.grouped_items().is_empty());
        assert_eq!(state.item_count(&ProductId::new("a")), 0);
        assert_eq!(state.sub_total_price(), Decimal::ZERO);
        assert!(state.wishlist().is_empty());
    }

    #[test]
    fn test_wishlist_set_semantics() {
        let mut state = state_for("user_1");
        state.add_to_wishlist(product("a", Some(1)));
        state.add_to_wishlist(product("a", Some(1)));
        state.add_to_wishlist(product("b", Some(1)));
        assert_eq!(state.wishlist().len(), 2);
        assert!(state.is_wishlisted(&ProductId::new("a")));

        state.remove_from_wishlist(&ProductId::new("a"));
        assert_eq!(state.wishlist().len(), 1);
        assert!(!state.is_wishlisted(&ProductId::new("a")));

        state.reset_wishlist();
        assert!(state.wishlist().is_empty());
    }

    #[test]
    fn test_hydrate_assigns_guest_once() {
        let mut state = StoreState::new();
        assert!(state.hydrate());
        let guest = state.current_user_id().cloned().unwrap();
        assert!(guest.is_guest());
        assert!(!state.hydrate());
        assert_eq!(state.current_user_id(), Some(&guest));
    }

    #[test]
    fn test_migrate_copies_guest_data() {
        let mut state = StoreState::new();
        state.hydrate();
        let guest = state.current_user_id().cloned().unwrap();
        state.add_to_cart(product("a", Some(10)));
        state.add_to_cart(product("a", Some(10)));
        state.add_to_wishlist(product("w", Some(5)));
        let guest_cart = state.cart_of(&guest).to_vec();
        let guest_wishlist = state.wishlist_of(&guest).to_vec();

        let user = UserId::new("user_42");
        assert!(state.migrate_guest_to_user(user.clone()));

        assert_eq!(state.current_user_id(), Some(&user));
        assert_eq!(state.cart_of(&user), guest_cart.as_slice());
        assert_eq!(state.wishlist_of(&user), guest_wishlist.as_slice());

        // The guest's entries are left behind
        assert_eq!(state.cart_of(&guest), guest_cart.as_slice());
    }

    #[test]
    fn test_migrate_without_guest_data_creates_empty_entries() {
        let mut state = StoreState::new();
        state.hydrate();
        let user = UserId::new("user_42");
        assert!(state.migrate_guest_to_user(user.clone()));
        assert!(state.cart_of(&user).is_empty());
        assert!(state.wishlist_of(&user).is_empty());
    }

    #[test]
    fn test_migrate_is_noop_for_authenticated_user() {
        let mut state = state_for("user_1");
        state.add_to_cart(product("a", Some(10)));
        let before = state.clone();

        assert!(!state.migrate_guest_to_user(UserId::new("user_2")));
        assert_eq!(state, before);
    }

    #[test]
    fn test_migrate_is_noop_without_active_user() {
        let mut state = StoreState::new();
        assert!(!state.migrate_guest_to_user(UserId::new("user_2")));
        assert_eq!(state, StoreState::new());
    }

    /// Guest entries survive migration. This leaves stale data behind after
    /// sign-in; whether it should be purged is an open question.
    #[test]
    fn test_migrate_retains_guest_entries() {
        let mut state = StoreState::new();
        state.hydrate();
        let guest = state.current_user_id().cloned().unwrap();
        state.add_to_cart(product("a", Some(10)));

        state.migrate_guest_to_user(UserId::new("user_42"));
        assert_eq!(state.cart_of(&guest).len(), 1);
    }

    #[test]
    fn test_serialized_record_shape() {
        let mut state = state_for("user_1");
        state.add_to_cart(product("a", Some(10)));
        let value = serde_json::to_value(&state).unwrap();

        assert_eq!(value["currentUserId"], "user_1");
        assert_eq!(value["userCarts"]["user_1"][0]["quantity"], 1);
        assert_eq!(value["userCarts"]["user_1"][0]["product"]["_id"], "a");
        assert!(value["userWishlists"].is_object());

        let restored: StoreState = serde_json::from_value(value).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_subtotal_saturates_instead_of_overflowing() {
        let mut state = state_for("user_1");
        let huge = Product {
            price: Some(Decimal::from_i128_with_scale(10_i128.pow(28), 0)),
            ..product("huge", None)
        };
        for _ in 0..10 {
            state.add_to_cart(huge.clone());
        }
        state.add_to_cart(product("a", Some(10)));

        let line = &state.grouped_items()[0];
        assert_eq!(line.checked_line_total(), None);
        assert_eq!(line.line_total(), Decimal::MAX);
        assert_eq!(state.sub_total_price(), Decimal::MAX);
        assert_eq!(state.total_price(), Decimal::MAX);
    }

    #[test]
    fn test_deserialize_empty_record() {
        let state: StoreState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, StoreState::new());
    }
}
