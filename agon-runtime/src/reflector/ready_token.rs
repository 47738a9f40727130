use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// A one-way readiness flag shared between a [`Writer`](super::store::Writer) and its stores
///
/// Backed by a `CancellationToken` since that already gives us a cloneable,
/// awaitable, never-reset flag.
#[derive(Clone, Debug, Default)]
pub(crate) struct ReadyToken(CancellationToken);

impl ReadyToken {
    pub(crate) fn is_ready(&self) -> bool {
        self.0.is_cancelled()
    }

    pub(crate) fn ready(&self) -> WaitForCancellationFuture<'_> {
        self.0.cancelled()
    }

    pub(crate) fn make_ready(&self) {
        self.0.cancel();
    }
}
