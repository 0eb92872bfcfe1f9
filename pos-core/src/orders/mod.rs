//! Order lifecycle management
//!
//! Turns a composed cart into a durable order aggregate, walks the order
//! through the fulfillment state machine, and settles it at checkout.
//! All remote writes go through the persistence collaborator; the local
//! projection is updated first and never rolled back.

mod error;
mod manager;
mod numbering;

pub use error::{OrderError, OrderResult};
pub use manager::{CheckoutOutcome, OrderManager};
pub use numbering::OrderNumberGenerator;
