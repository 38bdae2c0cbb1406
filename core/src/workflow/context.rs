// lustre/src/workflow/context.rs
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared state threaded through every step of a lifecycle workflow run.
///
/// IMPORTANT: guards are blocking and MUST be dropped before any `.await`.
/// Steps copy what they need out of the guard, await their collaborator, then
/// take a short write guard to record the result.
#[derive(Debug)]
pub struct ContextData<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> ContextData<T> {
  pub fn new(data: T) -> Self {
    ContextData(Arc::new(RwLock::new(data)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  /// Takes the state back out once the run is over.
  /// Falls back to a clone while a step still holds a handle.
  pub fn into_inner(self) -> T
  where
    T: Clone,
  {
    match Arc::try_unwrap(self.0) {
      Ok(lock) => lock.into_inner(),
      Err(shared) => shared.read().clone(),
    }
  }
}

impl<T: Send + Sync + 'static> Clone for ContextData<T> {
  fn clone(&self) -> Self {
    ContextData(Arc::clone(&self.0))
  }
}
