//! Liveness tokens for work that may outlive the view that started it.
//!
//! A [`Liveness`] is handed to every asynchronous unit of work (a service
//! call, a poll tick). Once the owning view is retired, every token derived
//! from it reports dead, and results computed under a dead token must be
//! dropped instead of applied.

use tokio_util::sync::CancellationToken;

/// Cloneable liveness flag backed by a cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    token: CancellationToken,
}

impl Liveness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a token that dies with this one, or earlier if retired itself.
    #[must_use]
    pub fn child(&self) -> Liveness {
        Liveness {
            token: self.token.child_token(),
        }
    }

    /// Returns `true` until [`retire`](Self::retire) is called on this
    /// token or any ancestor.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Mark the owner as retired.
    pub fn retire(&self) {
        self.token.cancel();
    }

    /// Resolves once the token is retired.
    pub async fn retired(&self) {
        self.token.cancelled().await;
    }

    /// Apply `apply` to `value` only if still alive.
    ///
    /// Returns `true` if the value was applied.
    pub fn apply_if_alive<T>(&self, value: T, apply: impl FnOnce(T)) -> bool {
        if self.is_alive() {
            apply(value);
            true
        } else {
            false
        }
    }
}
