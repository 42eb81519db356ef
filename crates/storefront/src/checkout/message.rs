//! How the shopper pays once the order exists.

use askama::Template;
use freshcatch_core::{Order, PaymentMethod};
use serde::Serialize;

use crate::config::CheckoutConfig;

#[derive(Template)]
#[template(path = "checkout/whatsapp_order.txt")]
struct WhatsappOrderMessage<'a> {
    order_id: &'a str,
    lines: Vec<MessageLine<'a>>,
    total: String,
    address: String,
    phone: &'a str,
    date: String,
    slot: &'static str,
}

struct MessageLine<'a> {
    name: &'a str,
    quantity: String,
    total: String,
}

/// Next step shown after an order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum PaymentInstructions {
    /// Send the prepared message to the shop on WhatsApp.
    Whatsapp { link: String, message: String },
    /// Pay the amount on the hosted payment page.
    RazorpayLink { link: String, amount: String },
}

impl PaymentInstructions {
    /// Instructions for `order` according to its payment method.
    ///
    /// # Errors
    ///
    /// Returns an error if the WhatsApp message fails to render.
    pub fn for_order(order: &Order, config: &CheckoutConfig) -> Result<Self, askama::Error> {
        match order.payment_method {
            PaymentMethod::Whatsapp => {
                let message = render_message(order)?;
                let link = format!(
                    "https://wa.me/{}?text={}",
                    config.whatsapp_number,
                    urlencoding::encode(&message)
                );
                Ok(Self::Whatsapp { link, message })
            }
            PaymentMethod::RazorpayLink => Ok(Self::RazorpayLink {
                link: config.payment_link.to_string(),
                amount: order.total_amount.display(),
            }),
        }
    }
}

fn render_message(order: &Order) -> Result<String, askama::Error> {
    WhatsappOrderMessage {
        order_id: order.id.as_str(),
        lines: order
            .items
            .iter()
            .map(|item| MessageLine {
                name: &item.product.name,
                quantity: item.quantity.to_string(),
                total: item.line_total().display(),
            })
            .collect(),
        total: order.total_amount.display(),
        address: order.delivery.address.one_line(),
        phone: order.delivery.phone.as_str(),
        date: order.delivery.date.format("%a %d %b").to_string(),
        slot: order.delivery.time.label(),
    }
    .render()
}
