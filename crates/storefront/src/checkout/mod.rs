//! Checkout: delivery details, order submission and payment instructions.

mod flow;
mod message;

pub use flow::{
    CheckoutError, CheckoutFlow, CheckoutForm, CheckoutSummary, PROFILE_EDIT_PATH, PlacedOrder,
    SummaryLine, service_today,
};
pub use message::PaymentInstructions;
