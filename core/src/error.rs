// lustre/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Every failure a lifecycle operation can surface to its caller.
///
/// Validation, auth and not-found errors are raised before any write happens.
/// `PaymentGateway` aborts a refund before anything is persisted. Failures of
/// best-effort side effects (history, notifications) never appear here; they
/// are reported through `SideEffects` on the operation outcome instead.
#[derive(Debug, Error)]
pub enum LifecycleError {
  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Validation error: {0}")]
  Validation(String),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("Invalid transition for {entity}: {from} -> {to}")]
  InvalidTransition {
    entity: &'static str,
    from: String,
    to: String,
  },

  /// The row changed between the read and the compare-and-set write.
  #[error("Concurrent update detected for {entity} {id}; expected status '{expected}'")]
  Conflict {
    entity: &'static str,
    id: String,
    expected: String,
  },

  #[error("Payment gateway error: {message}")]
  PaymentGateway { message: String },

  #[error("Workflow step '{step_name}' has no handler")]
  HandlerMissing { step_name: String },

  #[error("Internal error: {source}")]
  Internal {
    #[source]
    source: AnyhowError,
  },
}

impl LifecycleError {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    LifecycleError::NotFound {
      entity,
      id: id.to_string(),
    }
  }

  pub fn invalid_transition(entity: &'static str, from: impl ToString, to: impl ToString) -> Self {
    LifecycleError::InvalidTransition {
      entity,
      from: from.to_string(),
      to: to.to_string(),
    }
  }

  pub fn gateway(message: impl Into<String>) -> Self {
    LifecycleError::PaymentGateway { message: message.into() }
  }
}

// Store and identity collaborators speak anyhow; anything that reaches a
// controller that way is an unexpected persistence failure.
impl From<AnyhowError> for LifecycleError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<LifecycleError>() {
      Ok(lifecycle_err) => lifecycle_err,
      Err(other) => LifecycleError::Internal { source: other },
    }
  }
}

pub type LifecycleResult<T, E = LifecycleError> = std::result::Result<T, E>;
