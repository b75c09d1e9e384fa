// src/repository/mod.rs
//! The work-order store seam.
//!
//! The HTTP layer depends on [`WorkOrderRepository`] only. The Notion
//! adapter and the in-memory mock both implement it, and
//! [`CachedRepository`] decorates either one.

pub mod cache;

use crate::error::AppError;
use crate::model::{
    BackendMode, CompleteData, Employee, HealthStatus, HoursEntry, NewWorkOrder, SendDataOutcome,
    Site, StatusOptions, Supervisor, WorkOrder, WorkOrderChanges, WorkOrderDetail,
    WorkOrderFilter, WorkOrderMutation, WorkOrderStatus,
};
use crate::types::RecordId;

pub use cache::CachedRepository;

/// The ability to read and write partes and their reference data.
#[async_trait::async_trait]
pub trait WorkOrderRepository: Send + Sync {
    fn mode(&self) -> BackendMode;

    async fn health(&self) -> Result<HealthStatus, AppError>;

    async fn sites(&self) -> Result<Vec<Site>, AppError>;
    async fn supervisors(&self) -> Result<Vec<Supervisor>, AppError>;
    async fn employees(&self) -> Result<Vec<Employee>, AppError>;
    async fn employees_for_site(&self, site: &RecordId) -> Result<Vec<Employee>, AppError>;

    /// Allowed values of the employee estado property.
    async fn status_options(&self) -> Result<StatusOptions, AppError>;
    async fn update_employee_status(
        &self,
        employee: &RecordId,
        estado: &str,
    ) -> Result<Employee, AppError>;

    /// Partes, newest first.
    async fn work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError>;
    async fn hours_entries(&self, work_order: &RecordId) -> Result<Vec<HoursEntry>, AppError>;
    async fn work_order_detail(&self, work_order: &RecordId) -> Result<WorkOrderDetail, AppError>;
    async fn work_order_status(&self, work_order: &RecordId) -> Result<WorkOrderStatus, AppError>;

    async fn create_work_order(&self, command: NewWorkOrder) -> Result<WorkOrderMutation, AppError>;
    async fn update_work_order(
        &self,
        work_order: &RecordId,
        changes: WorkOrderChanges,
    ) -> Result<WorkOrderMutation, AppError>;

    /// Hands a draft parte to the signing flow and marks it as sent.
    async fn send_work_order_data(&self, work_order: &RecordId)
        -> Result<SendDataOutcome, AppError>;

    /// Loads the four listings the web client needs on startup, concurrently.
    async fn complete_data(&self) -> Result<CompleteData, AppError> {
        let all = WorkOrderFilter::default();
        let (sites, supervisors, employees, work_orders) = tokio::try_join!(
            self.sites(),
            self.supervisors(),
            self.employees(),
            self.work_orders(&all),
        )?;
        Ok(CompleteData {
            sites,
            supervisors,
            employees,
            work_orders,
        })
    }
}
