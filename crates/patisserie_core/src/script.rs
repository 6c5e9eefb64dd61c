//! Delivery message composition.

use crate::Order;

/// Used when a deliverer has not stored a script.
pub const DEFAULT_DELIVERY_SCRIPT: &str = "Here is your order! 🍩";

/// Text a deliverer posts for the customer.
///
/// The first line mentions the customer followed by the script, then the
/// chef, then one image reference per line.
pub fn compose_delivery_message(order: &Order, script: Option<&str>) -> String {
    let script = script.unwrap_or(DEFAULT_DELIVERY_SCRIPT);
    format!(
        "{} {}\nChef: {}\n{}",
        order.customer_id().mention(),
        script,
        chef_label(order),
        images_block(order)
    )
}

/// Chef display name, or `Unknown` for orders that were never claimed.
pub fn chef_label(order: &Order) -> &str {
    order.chef_name().as_deref().unwrap_or("Unknown")
}

/// Image references one per line.
pub fn images_block(order: &Order) -> String {
    if order.images().is_empty() {
        "No Image Attached".to_string()
    } else {
        order.images().join("\n")
    }
}
