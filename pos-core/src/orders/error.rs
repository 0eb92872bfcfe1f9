use crate::persist::PersistError;
use shared::models::OrderStatus;

/// Order operation failure
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order not found: {0}")]
    NotFound(String),
    #[error("dine-in order requires a table")]
    TableRequired,
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error("cannot create an order from an empty cart")]
    EmptyCart,
    #[error("cannot cancel an order in status {0:?}")]
    CancellationNotAllowed(OrderStatus),
    #[error(transparent)]
    Persistence(#[from] PersistError),
}

pub type OrderResult<T> = Result<T, OrderError>;
