//! Change feed ports — announce and observe committed table changes.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;

use scoreboard_domain::error::ScoreboardError;
use scoreboard_domain::table::TableChange;

/// Announces committed changes to interested live queries.
///
/// Repositories call this after a transaction commits and before releasing
/// the writer, so changes are announced in commit order.
pub trait ChangePublisher {
    /// Publish a change to all current subscribers.
    fn publish(
        &self,
        change: TableChange,
    ) -> impl Future<Output = Result<(), ScoreboardError>> + Send;
}

impl<T: ChangePublisher + Send + Sync> ChangePublisher for Arc<T> {
    fn publish(
        &self,
        change: TableChange,
    ) -> impl Future<Output = Result<(), ScoreboardError>> + Send {
        (**self).publish(change)
    }
}

/// Hands out receivers for committed changes.
pub trait ChangeSubscriber {
    /// Subscribe to changes published *after* this call.
    fn subscribe(&self) -> broadcast::Receiver<TableChange>;
}

impl<T: ChangeSubscriber> ChangeSubscriber for Arc<T> {
    fn subscribe(&self) -> broadcast::Receiver<TableChange> {
        (**self).subscribe()
    }
}
