//! Stripe's bracketed form encoding for checkout session requests.
//!
//! Stripe takes nested parameters as `application/x-www-form-urlencoded`
//! pairs such as `line_items[0][price_data][unit_amount]=45000`. The pairs
//! are produced here in a stable order and handed to `reqwest`'s `.form()`,
//! which does the percent-encoding.

use leureluxe_core::checkout::{CheckoutSessionRequest, CustomerSelection, LineItem};

/// Flatten a session request into Stripe form pairs.
#[must_use]
pub fn encode_session_request(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form = Form::default();

    form.push("mode", request.mode.as_str());
    for (i, method) in request.payment_method_types.iter().enumerate() {
        form.push(format!("payment_method_types[{i}]"), method);
    }

    for (i, item) in request.line_items.iter().enumerate() {
        encode_line_item(&mut form, i, item);
    }

    match &request.customer {
        CustomerSelection::Existing(id) => form.push("customer", id),
        CustomerSelection::Email(email) => form.push("customer_email", email.as_str()),
    }
    if request.update_customer_name {
        form.push("customer_update[name]", "auto");
    }

    if request.allow_promotion_codes {
        form.push("allow_promotion_codes", "true");
    }
    if request.invoice_creation {
        form.push("invoice_creation[enabled]", "true");
    }
    for (i, country) in request.shipping_countries.iter().enumerate() {
        form.push(
            format!("shipping_address_collection[allowed_countries][{i}]"),
            country,
        );
    }
    if request.phone_number_collection {
        form.push("phone_number_collection[enabled]", "true");
    }

    for (key, value) in &request.metadata {
        form.push(format!("metadata[{key}]"), value);
    }

    form.push("success_url", &request.success_url);
    form.push("cancel_url", &request.cancel_url);

    form.into_pairs()
}

fn encode_line_item(form: &mut Form, index: usize, item: &LineItem) {
    let prefix = format!("line_items[{index}]");
    let price = format!("{prefix}[price_data]");
    let product = format!("{price}[product_data]");

    form.push(format!("{price}[currency]"), item.currency.as_str());
    form.push(format!("{price}[unit_amount]"), item.unit_amount.to_string());
    form.push(format!("{product}[name]"), &item.name);
    if let Some(description) = &item.description {
        form.push(format!("{product}[description]"), description);
    }
    for (i, image) in item.images.iter().enumerate() {
        form.push(format!("{product}[images][{i}]"), image);
    }
    form.push(format!("{product}[metadata][id]"), item.product_id.as_str());
    form.push(format!("{prefix}[quantity]"), item.quantity.to_string());
}

#[derive(Default)]
struct Form(Vec<(String, String)>);

impl Form {
    fn push(&mut self, key: impl Into<String>, value: impl AsRef<str>) {
        self.0.push((key.into(), value.as_ref().to_owned()));
    }

    fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}
