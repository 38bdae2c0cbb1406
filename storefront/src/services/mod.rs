// storefront/src/services/mod.rs

//! Outbound collaborators: the payment gateway and the identity provider.

pub mod identity;
pub mod razorpay;

pub use identity::HttpIdentityProvider;
pub use razorpay::RazorpayGateway;
