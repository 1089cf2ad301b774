//! Permission gate.

use super::CameraDelegate;
use std::sync::Arc;

type Callback = Box<dyn FnOnce(bool) + Send + 'static>;

/// One-shot answer to a camera access check.
///
/// Consumed by [`resolve`](Self::resolve). If dropped unresolved it
/// resolves as denied, so setup always reaches a terminal decision.
pub struct AccessCompletion {
    callback: Option<Callback>,
}

impl AccessCompletion {
    pub fn new(callback: impl FnOnce(bool) + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    pub fn resolve(mut self, granted: bool) {
        if let Some(callback) = self.callback.take() {
            callback(granted);
        }
    }
}

impl Drop for AccessCompletion {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            tracing::warn!("Access check dropped without an answer, treating as denied");
            callback(false);
        }
    }
}

impl std::fmt::Debug for AccessCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCompletion")
            .field("resolved", &self.callback.is_none())
            .finish()
    }
}

/// Routes the access check to the delegate.
pub struct PermissionGate;

impl PermissionGate {
    /// Asks `delegate` for camera access. Without a delegate the answer is
    /// an immediate denial.
    pub fn check_access(
        delegate: Option<Arc<dyn CameraDelegate>>,
        completion: impl FnOnce(bool) + Send + 'static,
    ) {
        let completion = AccessCompletion::new(completion);
        match delegate {
            Some(delegate) => {
                tracing::debug!("Requesting camera access from delegate");
                delegate.check_access(completion);
            }
            None => {
                tracing::warn!("No delegate to decide camera access");
                completion.resolve(false);
            }
        }
    }
}
