// lustre/src/model/money.rs

use crate::error::LifecycleError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Converts a major-unit amount (rupees) into the gateway's minor unit (paise).
pub fn to_minor_units(amount: Decimal) -> Result<i64, LifecycleError> {
  if amount.is_sign_negative() {
    return Err(LifecycleError::Validation(format!(
      "amount must not be negative, got {}",
      amount
    )));
  }
  let minor = amount
    .checked_mul(Decimal::ONE_HUNDRED)
    .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
    .and_then(|v| v.to_i64())
    .ok_or_else(|| LifecycleError::Validation(format!("amount {} is out of range", amount)))?;
  Ok(minor)
}
