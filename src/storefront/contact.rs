//! Messaging deep links.

/// Message sent on the customer's behalf, followed by the product name
pub const CONTACT_MESSAGE_PREFIX: &str = "Bonjour je veux plus d'information sur ";

const WHATSAPP_BASE: &str = "https://wa.me/";

/// Build a WhatsApp deep link asking the shop about `product_name`.
///
/// The contact number is used as stored; only the message is encoded.
pub fn contact_link(contact_number: &str, product_name: &str) -> String {
    let message = format!("{CONTACT_MESSAGE_PREFIX}{product_name}");
    format!(
        "{WHATSAPP_BASE}{}?text={}",
        contact_number.trim(),
        urlencoding::encode(&message)
    )
}
