// src/sync/watcher.rs
//! Watches one parte and reports every estado change.

use super::client::WorkOrderClient;
use super::polling::PollSchedule;
use crate::error::AppError;
use crate::model::{WorkOrderState, WorkOrderStatus};
use crate::types::RecordId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Where the watcher reads the current estado from.
#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    async fn work_order_status(&self, id: &RecordId) -> Result<WorkOrderStatus, AppError>;
}

#[async_trait::async_trait]
impl StatusSource for WorkOrderClient {
    async fn work_order_status(&self, id: &RecordId) -> Result<WorkOrderStatus, AppError> {
        WorkOrderClient::work_order_status(self, id).await
    }
}

/// An observed transition. `previous` is `None` for the first observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub parte_id: RecordId,
    pub previous: Option<WorkOrderStatus>,
    pub current: WorkOrderStatus,
}

impl StatusChange {
    /// Whether the parte can no longer be edited.
    pub fn is_final(&self) -> bool {
        !WorkOrderState::parse(&self.current.status).is_editable()
    }
}

pub struct StatusWatcher {
    source: Arc<dyn StatusSource>,
    parte_id: RecordId,
    schedule: PollSchedule,
    stop_when_final: bool,
}

impl StatusWatcher {
    pub fn new(source: Arc<dyn StatusSource>, parte_id: RecordId) -> Self {
        Self {
            source,
            parte_id,
            schedule: PollSchedule::default(),
            stop_when_final: false,
        }
    }

    pub fn with_schedule(mut self, schedule: PollSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Stop once the parte leaves the editable states.
    pub fn stop_when_final(mut self, stop: bool) -> Self {
        self.stop_when_final = stop;
        self
    }

    /// Runs the watcher on its own task.
    pub fn spawn(self, buffer: usize) -> (mpsc::Receiver<StatusChange>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let handle = tokio::spawn(self.run(tx));
        (rx, handle)
    }

    /// Polls until the receiver goes away or, with `stop_when_final`, the
    /// parte is frozen.
    pub async fn run(mut self, tx: mpsc::Sender<StatusChange>) {
        let mut last: Option<WorkOrderStatus> = None;

        loop {
            match self.source.work_order_status(&self.parte_id).await {
                Ok(current) if last.as_ref() == Some(&current) => {
                    self.schedule.record_unchanged();
                }
                Ok(current) => {
                    if last.is_some() {
                        self.schedule.record_change();
                    } else {
                        self.schedule.record_unchanged();
                    }
                    let change = StatusChange {
                        parte_id: self.parte_id.clone(),
                        previous: last.replace(current.clone()),
                        current,
                    };
                    let is_final = change.is_final();
                    if tx.send(change).await.is_err() {
                        log::debug!("Watcher for parte {} dropped", self.parte_id);
                        return;
                    }
                    if is_final && self.stop_when_final {
                        log::info!("Parte {} is final, watcher stopping", self.parte_id);
                        return;
                    }
                }
                Err(err) => {
                    self.schedule.record_failure();
                    log::warn!(
                        "Estado poll for parte {} failed ({} in a row): {}",
                        self.parte_id,
                        self.schedule.failures(),
                        err
                    );
                }
            }

            let delay = self.schedule.next_delay_jittered();
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = tx.closed() => {
                    log::debug!("Watcher for parte {} dropped", self.parte_id);
                    return;
                }
            }
        }
    }
}
