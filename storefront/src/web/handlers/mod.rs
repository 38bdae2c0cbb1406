// storefront/src/web/handlers/mod.rs

pub mod order_handlers;
pub mod refund_handlers;
