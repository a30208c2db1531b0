//! In-process change bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use scoreboard_domain::error::ScoreboardError;
use scoreboard_domain::table::TableChange;

use crate::ports::{ChangePublisher, ChangeSubscriber};

/// In-process change bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the change is simply dropped). A subscriber that falls behind by more
/// than the channel capacity observes a lag, which live queries treat as
/// "something changed".
pub struct InProcessChangeBus {
    sender: broadcast::Sender<TableChange>,
}

impl InProcessChangeBus {
    /// Create a new change bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }
}

impl ChangeSubscriber for InProcessChangeBus {
    fn subscribe(&self) -> broadcast::Receiver<TableChange> {
        self.sender.subscribe()
    }
}

impl ChangePublisher for InProcessChangeBus {
    fn publish(
        &self,
        change: TableChange,
    ) -> impl Future<Output = Result<(), ScoreboardError>> + Send {
        // broadcast::send fails only when there are zero receivers.
        let _ = self.sender.send(change);
        async { Ok(()) }
    }
}
