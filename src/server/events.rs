// src/server/events.rs
//! Server-sent estado updates for one parte.

use super::response::ErrorBody;
use crate::model::WorkOrderStatus;
use crate::repository::WorkOrderRepository;
use crate::types::RecordId;
use axum::response::sse::Event;
use futures::stream::{self, Stream};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// One item of the estado stream.
#[derive(Debug)]
pub enum StatusUpdate {
    Changed(WorkOrderStatus),
    Failed(ErrorBody),
}

impl StatusUpdate {
    pub fn into_event(self) -> Event {
        let (name, event) = match self {
            StatusUpdate::Changed(status) => ("estado", Event::default().json_data(status)),
            StatusUpdate::Failed(body) => ("error", Event::default().json_data(body)),
        };
        match event {
            Ok(event) => event.event(name),
            Err(err) => Event::default().event("error").data(err.to_string()),
        }
    }
}

struct Watch {
    repo: Arc<dyn WorkOrderRepository>,
    id: RecordId,
    last: WorkOrderStatus,
    pending: Option<WorkOrderStatus>,
    ticker: Interval,
}

/// Emits `initial` right away, then every observed change of estado or
/// ultimaEdicion. Read failures are reported and polling goes on.
pub fn status_updates(
    repo: Arc<dyn WorkOrderRepository>,
    id: RecordId,
    initial: WorkOrderStatus,
    every: Duration,
) -> impl Stream<Item = StatusUpdate> + Send + 'static {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let watch = Watch {
        repo,
        id,
        last: initial.clone(),
        pending: Some(initial),
        ticker,
    };

    stream::unfold(watch, |mut watch| async move {
        if let Some(initial) = watch.pending.take() {
            return Some((StatusUpdate::Changed(initial), watch));
        }
        loop {
            watch.ticker.tick().await;
            match watch.repo.work_order_status(&watch.id).await {
                Ok(current) if current != watch.last => {
                    log::debug!(
                        "Parte {} moved from {} to {}",
                        watch.id,
                        watch.last.status,
                        current.status
                    );
                    watch.last = current.clone();
                    return Some((StatusUpdate::Changed(current), watch));
                }
                Ok(_) => continue,
                Err(err) => {
                    log::warn!("Estado poll for parte {} failed: {}", watch.id, err);
                    return Some((StatusUpdate::Failed(ErrorBody::from_error(&err)), watch));
                }
            }
        }
    })
}
