//! Dashboard session
//!
//! Binds the four collections the dashboard renders from and folds their
//! updates into one [`DashboardAggregate`]. A single merge task applies
//! updates in the order the bindings publish them.

use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;
use tracing::{debug, info};

use super::aggregate::{DashboardAggregate, StatsUpdate};
use crate::application::live::{LiveCollection, LiveCollectionBinder, LiveStatus, LiveView};
use crate::domain::{
    collections, Document, DomainResult, ErrorRecord, FromDocument, MetricsSnapshot, UserRecord,
};
use crate::shared::RetryConfig;

pub struct DashboardSession {
    users: LiveCollection<UserRecord>,
    errors: LiveCollection<ErrorRecord>,
    api_metrics: LiveCollection<Document>,
    dashboard_stats: LiveCollection<Document>,
    aggregate: watch::Receiver<DashboardAggregate>,
}

impl DashboardSession {
    /// Open every binding, retrying transient failures with `retry`.
    pub async fn open(binder: &LiveCollectionBinder, retry: &RetryConfig) -> DomainResult<Self> {
        let users = binder
            .bind_with_retry::<UserRecord>(collections::USERS, retry)
            .await?;
        let errors = binder
            .bind_with_retry::<ErrorRecord>(collections::LOGIN_ERRORS, retry)
            .await?;
        let api_metrics = binder
            .bind_with_retry::<Document>(collections::API_METRICS, retry)
            .await?;
        let dashboard_stats = binder
            .bind_with_retry::<Document>(collections::DASHBOARD_STATS, retry)
            .await?;

        let (sender, aggregate) = watch::channel(DashboardAggregate::default());
        let updates: Vec<BoxStream<'static, StatsUpdate>> = vec![
            settled(users.updates())
                .map(|items| StatsUpdate::UserCount(items.len()))
                .boxed(),
            settled(errors.updates())
                .map(|items| StatsUpdate::ErrorCount(items.len()))
                .boxed(),
            settled(api_metrics.updates())
                .map(StatsUpdate::ApiMetrics)
                .boxed(),
            settled(dashboard_stats.updates())
                .map(StatsUpdate::DashboardStats)
                .boxed(),
        ];
        tokio::spawn(merge(stream::select_all(updates), sender));

        info!("Dashboard session opened");
        Ok(Self {
            users,
            errors,
            api_metrics,
            dashboard_stats,
            aggregate,
        })
    }

    pub fn aggregate(&self) -> DashboardAggregate {
        *self.aggregate.borrow()
    }

    /// Receiver notified whenever the aggregate changes.
    pub fn watch(&self) -> watch::Receiver<DashboardAggregate> {
        self.aggregate.clone()
    }

    pub fn users(&self) -> LiveView<UserRecord> {
        self.users.current()
    }

    pub fn errors(&self) -> LiveView<ErrorRecord> {
        self.errors.current()
    }

    pub fn error_updates(&self) -> impl futures_util::Stream<Item = LiveView<ErrorRecord>> {
        self.errors.updates()
    }

    /// Login metrics from the `apiMetrics` binding; zeros while absent.
    pub fn metrics(&self) -> LiveView<MetricsSnapshot> {
        let view = self.api_metrics.current();
        let snapshot = view
            .items
            .iter()
            .find(|doc| doc.id == collections::LOGIN_METRICS_DOC)
            .map(MetricsSnapshot::from_document)
            .unwrap_or_default();
        LiveView {
            status: view.status,
            items: vec![snapshot],
            version: view.version,
        }
    }

    /// Ticks once per binding straight away, then once per update any
    /// binding publishes.
    pub fn changes(&self) -> BoxStream<'static, ()> {
        stream::select_all(vec![
            self.users.updates().map(|_| ()).boxed(),
            self.errors.updates().map(|_| ()).boxed(),
            self.api_metrics.updates().map(|_| ()).boxed(),
            self.dashboard_stats.updates().map(|_| ()).boxed(),
        ])
        .boxed()
    }

    pub fn status(&self) -> LiveStatus {
        let statuses = [
            self.users.current().status,
            self.errors.current().status,
            self.api_metrics.current().status,
            self.dashboard_stats.current().status,
        ];
        if let Some(failed) = statuses
            .iter()
            .find(|s| matches!(s, LiveStatus::Failed(_)))
        {
            return failed.clone();
        }
        if statuses.contains(&LiveStatus::Loading) {
            LiveStatus::Loading
        } else {
            LiveStatus::Ready
        }
    }

    pub fn cancel(&self) {
        self.users.cancel();
        self.errors.cancel();
        self.api_metrics.cancel();
        self.dashboard_stats.cancel();
    }
}

/// Items of every view past the loading phase.
fn settled<T, S>(views: S) -> impl futures_util::Stream<Item = Vec<T>> + Send + 'static
where
    T: Send + 'static,
    S: futures_util::Stream<Item = LiveView<T>> + Send + 'static,
{
    views.filter_map(|view| async move { (!view.is_loading()).then_some(view.items) })
}

async fn merge(
    mut updates: stream::SelectAll<BoxStream<'static, StatsUpdate>>,
    sender: watch::Sender<DashboardAggregate>,
) {
    while let Some(update) = updates.next().await {
        sender.send_if_modified(|aggregate| aggregate.apply(update));
    }
    debug!("Dashboard merge task finished");
}
