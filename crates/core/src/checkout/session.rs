//! Provider-neutral checkout session request.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{CheckoutMetadata, Discount, ValidationError};
use crate::image::ImageUrlBuilder;
use crate::store::CartItem;
use crate::types::{CurrencyCode, Email, ProductId, to_minor_units};

/// Literal the provider replaces with the created session's id in the success URL.
pub const CHECKOUT_SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

/// Store-wide checkout settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Public storefront URL that success and cancel redirects point back to.
    pub base_url: String,
    pub currency: CurrencyCode,
    /// ISO country codes accepted for shipping.
    pub shipping_countries: Vec<String>,
    pub images: ImageUrlBuilder,
}

/// How the session identifies the paying customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum CustomerSelection {
    /// Reuse a customer record the provider already has.
    Existing(String),
    /// No record yet; prefill the checkout form with this email.
    Email(Email),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Payment,
}

impl SessionMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Payment => "payment",
        }
    }
}

/// One priced line of the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub currency: CurrencyCode,
    /// Discounted unit price in the currency's smallest unit.
    pub unit_amount: i64,
    pub quantity: u32,
    pub name: String,
    pub description: Option<String>,
    pub images: Vec<String>,
}

/// Everything the payment provider needs to open a hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSessionRequest {
    pub mode: SessionMode,
    pub payment_method_types: Vec<String>,
    pub line_items: Vec<LineItem>,
    pub customer: CustomerSelection,
    /// Let the provider update the saved customer's name from the form.
    pub update_customer_name: bool,
    pub allow_promotion_codes: bool,
    pub invoice_creation: bool,
    pub shipping_countries: Vec<String>,
    pub phone_number_collection: bool,
    pub metadata: BTreeMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

/// Assemble the session request for a validated cart.
///
/// Every line's unit amount is `round(price * (1 - ratio) * 100)`, where the
/// ratio reconciles `subtotal_amount` with `total_amount`. Quantities are kept
/// as they are.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyCart`] for an empty cart and
/// [`ValidationError::UnusablePrice`] for a line whose product has no
/// positive price or whose discounted amount does not fit the provider's
/// integer range.
pub fn build_session_request(
    items: &[CartItem],
    metadata: &CheckoutMetadata,
    customer: CustomerSelection,
    settings: &SessionSettings,
) -> Result<CheckoutSessionRequest, ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    let discount = Discount::from_totals(metadata.subtotal_amount, metadata.total_amount);

    let line_items = items
        .iter()
        .map(|item| line_item(item, &discount, settings))
        .collect::<Result<Vec<_>, _>>()?;

    let update_customer_name = matches!(customer, CustomerSelection::Existing(_))
        && !metadata.customer_name.trim().is_empty();

    let (success_url, cancel_url) = redirect_urls(&settings.base_url, &metadata.order_number);

    Ok(CheckoutSessionRequest {
        mode: SessionMode::Payment,
        payment_method_types: vec!["card".to_string()],
        line_items,
        customer,
        update_customer_name,
        allow_promotion_codes: true,
        invoice_creation: true,
        shipping_countries: settings.shipping_countries.clone(),
        phone_number_collection: true,
        metadata: session_metadata(metadata, &discount, items.len()),
        success_url,
        cancel_url,
    })
}

fn line_item(
    item: &CartItem,
    discount: &Discount,
    settings: &SessionSettings,
) -> Result<LineItem, ValidationError> {
    let product = &item.product;
    let unusable = || ValidationError::UnusablePrice {
        product_id: product.id.clone(),
    };

    let price = product.chargeable_price().ok_or_else(unusable)?;
    let unit_amount = to_minor_units(discount.apply(price)).ok_or_else(unusable)?;

    Ok(LineItem {
        product_id: product.id.clone(),
        currency: settings.currency,
        unit_amount,
        quantity: item.quantity,
        name: product
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string()),
        description: product.description.clone().filter(|d| !d.is_empty()),
        images: settings
            .images
            .first_url(&product.images)
            .into_iter()
            .collect(),
    })
}

fn session_metadata(
    metadata: &CheckoutMetadata,
    discount: &Discount,
    item_count: usize,
) -> BTreeMap<String, String> {
    let mut map = BTreeMap::from([
        ("orderNumber".to_string(), metadata.order_number.clone()),
        ("customerName".to_string(), metadata.customer_name.clone()),
        ("customerEmail".to_string(), metadata.customer_email.trim().to_string()),
        (
            "totalAmount".to_string(),
            metadata.total_amount.normalize().to_string(),
        ),
        (
            "subtotalAmount".to_string(),
            metadata.subtotal_amount.normalize().to_string(),
        ),
        (
            "discountAmount".to_string(),
            discount.amount.normalize().to_string(),
        ),
        ("discountPercentage".to_string(), discount.percentage_label()),
        ("itemsCount".to_string(), item_count.to_string()),
    ]);

    if let Some(user_id) = &metadata.user_id {
        map.insert("clerkUserId".to_string(), user_id.to_string());
    }
    if let Some(address) = metadata
        .address
        .as_ref()
        .and_then(|address| serde_json::to_string(address).ok())
    {
        map.insert("address".to_string(), address);
    }
    if let Some(code) = metadata.discount_code.as_ref().filter(|c| !c.is_empty()) {
        map.insert("discountCode".to_string(), code.clone());
    }

    map
}

fn redirect_urls(base_url: &str, order_number: &str) -> (String, String) {
    let base = base_url.trim_end_matches('/');
    let order: String = url::form_urlencoded::byte_serialize(order_number.as_bytes()).collect();
    (
        format!("{base}/success?session_id={CHECKOUT_SESSION_PLACEHOLDER}&orderNumber={order}"),
        format!("{base}/cart?orderNumber={order}"),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::{Address, ImageRef, Product, UserId};

    fn settings() -> SessionSettings {
        SessionSettings {
            base_url: "https://shop.example.com/".to_string(),
            currency: CurrencyCode::PHP,
            shipping_countries: vec!["PH".to_string()],
            images: ImageUrlBuilder::new("proj", "production"),
        }
    }

    fn item(id: &str, price: Option<Decimal>, quantity: u32) -> CartItem {
        CartItem {
            product: Product {
                id: ProductId::new(id),
                name: Some("Pearl Earrings".to_string()),
                slug: None,
                description: Some("Freshwater pearls".to_string()),
                price,
                images: vec![ImageRef::new("image-abc-800x800-png")],
                stock: Some(3),
            },
            quantity,
        }
    }

    fn metadata(subtotal: i64, total: i64) -> CheckoutMetadata {
        CheckoutMetadata {
            order_number: "ORD 7".to_string(),
            customer_name: "Maria Santos".to_string(),
            customer_email: "maria@example.com".to_string(),
            user_id: None,
            address: None,
            subtotal_amount: Decimal::from(subtotal),
            total_amount: Decimal::from(total),
            discount_code: None,
        }
    }

    fn guest() -> CustomerSelection {
        CustomerSelection::Email(Email::parse("maria@example.com").unwrap())
    }

    #[test]
    fn test_discount_spread_across_lines() {
        let request = build_session_request(
            &[item("a", Some(Decimal::from(500)), 2)],
            &metadata(1000, 900),
            guest(),
            &settings(),
        )
        .unwrap();

        let line = &request.line_items[0];
        assert_eq!(line.unit_amount, 45_000);
        assert_eq!(line.quantity, 2);
        assert_eq!(line.currency, CurrencyCode::PHP);
        assert_eq!(request.metadata["discountAmount"], "100");
        assert_eq!(request.metadata["discountPercentage"], "10%");
        assert_eq!(request.metadata["itemsCount"], "1");
    }

    #[test]
    fn test_zero_subtotal_keeps_full_price() {
        let request = build_session_request(
            &[item("a", Some(Decimal::new(1999, 2)), 1)],
            &metadata(0, 0),
            guest(),
            &settings(),
        )
        .unwrap();
        assert_eq!(request.line_items[0].unit_amount, 1999);
        assert_eq!(request.metadata["discountPercentage"], "0%");
    }

    #[test]
    fn test_unpriced_line_is_an_error_not_a_panic() {
        let err = build_session_request(
            &[item("a", None, 1)],
            &metadata(0, 0),
            guest(),
            &settings(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnusablePrice {
                product_id: ProductId::new("a")
            }
        );
    }

    #[test]
    fn test_empty_items_rejected() {
        assert_eq!(
            build_session_request(&[], &metadata(0, 0), guest(), &settings()),
            Err(ValidationError::EmptyCart)
        );
    }

    #[test]
    fn test_redirect_urls() {
        let request = build_session_request(
            &[item("a", Some(Decimal::from(10)), 1)],
            &metadata(10, 10),
            guest(),
            &settings(),
        )
        .unwrap();
        assert_eq!(
            request.success_url,
            "https://shop.example.com/success?session_id={CHECKOUT_SESSION_ID}&orderNumber=ORD+7"
        );
        assert_eq!(
            request.cancel_url,
            "https://shop.example.com/cart?orderNumber=ORD+7"
        );
    }

    #[test]
    fn test_product_data() {
        let mut unnamed = item("b", Some(Decimal::from(10)), 1);
        unnamed.product.name = None;
        unnamed.product.description = Some(String::new());
        unnamed.product.images.clear();

        let request = build_session_request(
            &[item("a", Some(Decimal::from(10)), 1), unnamed],
            &metadata(20, 20),
            guest(),
            &settings(),
        )
        .unwrap();

        let first = &request.line_items[0];
        assert_eq!(first.name, "Pearl Earrings");
        assert_eq!(first.description.as_deref(), Some("Freshwater pearls"));
        assert_eq!(
            first.images,
            ["https://cdn.sanity.io/images/proj/production/abc-800x800.png"]
        );

        let second = &request.line_items[1];
        assert_eq!(second.name, "Unknown Product");
        assert_eq!(second.description, None);
        assert!(second.images.is_empty());
    }

    #[test]
    fn test_customer_name_update_only_for_existing_customer() {
        let items = [item("a", Some(Decimal::from(10)), 1)];
        let existing = build_session_request(
            &items,
            &metadata(10, 10),
            CustomerSelection::Existing("cus_123".to_string()),
            &settings(),
        )
        .unwrap();
        assert!(existing.update_customer_name);

        let new_customer =
            build_session_request(&items, &metadata(10, 10), guest(), &settings()).unwrap();
        assert!(!new_customer.update_customer_name);
    }

    #[test]
    fn test_optional_metadata() {
        let mut meta = metadata(10, 10);
        let bare = build_session_request(
            &[item("a", Some(Decimal::from(10)), 1)],
            &meta,
            guest(),
            &settings(),
        )
        .unwrap();
        assert!(!bare.metadata.contains_key("clerkUserId"));
        assert!(!bare.metadata.contains_key("address"));
        assert!(!bare.metadata.contains_key("discountCode"));

        meta.user_id = Some(UserId::new("user_42"));
        meta.discount_code = Some("WELCOME10".to_string());
        meta.address = Some(Address {
            street: "1 Ayala Ave".to_string(),
            city: "Makati".to_string(),
            state: None,
            postal_code: Some("1226".to_string()),
            country: "PH".to_string(),
            is_default: true,
        });
        let full = build_session_request(
            &[item("a", Some(Decimal::from(10)), 1)],
            &meta,
            guest(),
            &settings(),
        )
        .unwrap();
        assert_eq!(full.metadata["clerkUserId"], "user_42");
        assert_eq!(full.metadata["discountCode"], "WELCOME10");
        let address: serde_json::Value = serde_json::from_str(&full.metadata["address"]).unwrap();
        assert_eq!(address["city"], "Makati");
        assert_eq!(address["postalCode"], "1226");
    }
}
