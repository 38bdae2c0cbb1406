// lustre/src/model/mod.rs

//! Typed records for the lifecycle tables. Rows are decoded into these at the
//! data-access boundary; controllers never see loosely-shaped data.

/// Declares a status-like enum stored as lowercase text, with `as_str`,
/// `Display` and a `FromStr` that rejects unknown labels as validation errors.
macro_rules! text_enum {
  (
    $(#[$meta:meta])*
    pub enum $name:ident ($label:literal) {
      $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
    }
  ) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum $name {
      $($(#[$vmeta])* $variant),+
    }

    impl $name {
      pub const ALL: &'static [$name] = &[$($name::$variant),+];

      pub fn as_str(&self) -> &'static str {
        match self {
          $($name::$variant => $text),+
        }
      }
    }

    impl std::fmt::Display for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
      }
    }

    impl std::str::FromStr for $name {
      type Err = crate::error::LifecycleError;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
          $($text => Ok($name::$variant),)+
          other => Err(crate::error::LifecycleError::Validation(format!(
            "unknown {} '{}'",
            $label, other
          ))),
        }
      }
    }
  };
}

pub mod admin;
pub mod history;
pub mod money;
pub mod notification;
pub mod order;
pub mod refund;
pub mod transaction;

pub use admin::{AdminAccount, AdminRole};
pub use history::{HistorySubject, StatusHistoryEntry};
pub use money::to_minor_units;
pub use notification::{DeliveryStatus, Notification, NotificationChannel};
pub use order::{Order, OrderStatus, PaymentStatus};
pub use refund::{Refund, RefundStatus};
pub use transaction::PaymentTransaction;
