//! Live queries — reads that re-deliver their results after every relevant
//! committed change.
//!
//! A [`LiveQuery`] owns a background task that fetches once immediately and
//! again after each [`TableChange`] touching the tables it observes. Results
//! are handed over through a `watch` slot holding only the latest delivery:
//! a slow consumer skips intermediate states but always ends up seeing the
//! latest committed one, and deliveries never go backwards in commit order.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tokio_stream::wrappers::WatchStream;

use scoreboard_domain::error::ScoreboardError;
use scoreboard_domain::table::{TableChange, TableSet};

/// One result delivered by a [`LiveQuery`].
///
/// A failed fetch is delivered once and ends the stream.
pub type Delivery<T> = Result<Vec<T>, Arc<ScoreboardError>>;

type Slot<T> = Option<Delivery<T>>;

/// An infinite stream of query results. Dropping it cancels the query.
pub struct LiveQuery<T> {
    deliveries: WatchStream<Slot<T>>,
    task: JoinHandle<()>,
}

impl<T> LiveQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start observing `tables`, running `fetch` on a background task.
    ///
    /// `changes` must be subscribed *before* this call returns control to any
    /// writer whose changes the first delivery may miss; the usual way is to
    /// pass a freshly subscribed receiver.
    pub fn spawn<F, Fut>(
        changes: broadcast::Receiver<TableChange>,
        tables: TableSet,
        fetch: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<T>, ScoreboardError>> + Send + 'static,
    {
        let (sender, receiver) = watch::channel(None);
        let task = tokio::spawn(run(changes, tables, fetch, sender));
        Self {
            deliveries: WatchStream::new(receiver),
            task,
        }
    }
}

impl<T> Stream for LiveQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = Delivery<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.deliveries).poll_next(cx)) {
                Some(Some(delivery)) => return Poll::Ready(Some(delivery)),
                // the slot is empty until the first fetch completes
                Some(None) => {}
                None => return Poll::Ready(None),
            }
        }
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T, F, Fut>(
    mut changes: broadcast::Receiver<TableChange>,
    tables: TableSet,
    mut fetch: F,
    sender: watch::Sender<Slot<T>>,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<T>, ScoreboardError>>,
{
    loop {
        let delivery = fetch().await.map_err(Arc::new);
        let failed = match &delivery {
            Ok(rows) => {
                tracing::debug!(rows = rows.len(), "live query fetched");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "live query fetch failed, ending subscription");
                true
            }
        };
        if sender.send(Some(delivery)).is_err() || failed {
            return;
        }
        if !wait_for_change(&mut changes, tables, &sender).await {
            return;
        }
    }
}

/// Wait until a change touching `tables` arrives, then drain whatever else is
/// already queued so one fetch covers all of it.
///
/// Returns `false` when the query should stop.
async fn wait_for_change<T>(
    changes: &mut broadcast::Receiver<TableChange>,
    tables: TableSet,
    sender: &watch::Sender<Slot<T>>,
) -> bool {
    loop {
        tokio::select! {
            () = sender.closed() => {
                tracing::debug!("live query cancelled");
                return false;
            }
            received = changes.recv() => match received {
                Ok(change) if change.affects(tables) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "live query lagged behind change feed");
                    break;
                }
                Err(RecvError::Closed) => return false,
            },
        }
    }

    let mut coalesced = 0_usize;
    loop {
        match changes.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => coalesced += 1,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    if coalesced > 0 {
        tracing::debug!(coalesced, "live query coalesced pending changes");
    }
    true
}
