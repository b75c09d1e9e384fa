// src/server/handlers.rs
//! Route handlers. Each one validates its input, calls the store and
//! returns JSON; failures become [`AppError`] responses.

use super::events::status_updates;
use super::AppState;
use crate::constants::{EVENTS_KEEP_ALIVE_SECS, MAX_NAME_LENGTH};
use crate::error::AppError;
use crate::model::{
    parse_work_date, CompleteData, CreateWorkOrderRequest, Employee, HealthStatus, HoursEntry,
    SendDataOutcome, Site, StatusOptions, Supervisor, UpdateEmployeeStatusRequest,
    UpdateWorkOrderRequest, WorkOrder, WorkOrderDetail, WorkOrderFilter, WorkOrderMutation,
    WorkOrderStatus,
};
use crate::sanitize::clean_optional;
use crate::types::{RecordId, ValidationError};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::Uri;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;

type ApiResult<T> = Result<Json<T>, AppError>;

fn record_id(raw: &str) -> Result<RecordId, AppError> {
    Ok(RecordId::parse(raw)?)
}

/// Parses a JSON body. An empty body counts as `{}`.
fn json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(raw)
        .map_err(|e| ValidationError::InvalidBody(e.to_string()).into())
}

/// `?obra=&fecha=` on the parte listing.
#[derive(Debug, Default, Deserialize)]
pub struct WorkOrderQuery {
    pub obra: Option<String>,
    pub fecha: Option<String>,
}

impl WorkOrderQuery {
    pub fn into_filter(self) -> Result<WorkOrderFilter, AppError> {
        let date = match clean_optional(self.fecha.as_deref(), MAX_NAME_LENGTH) {
            None => None,
            Some(value) => Some(
                parse_work_date(&value).ok_or(ValidationError::InvalidDate { value })?,
            ),
        };
        Ok(WorkOrderFilter {
            site: clean_optional(self.obra.as_deref(), MAX_NAME_LENGTH),
            date,
        })
    }
}

pub async fn health(State(state): State<AppState>) -> ApiResult<HealthStatus> {
    Ok(Json(state.repo.health().await?))
}

pub async fn sites(State(state): State<AppState>) -> ApiResult<Vec<Site>> {
    Ok(Json(state.repo.sites().await?))
}

pub async fn site_employees(
    State(state): State<AppState>,
    Path(site): Path<String>,
) -> ApiResult<Vec<Employee>> {
    let site = record_id(&site)?;
    Ok(Json(state.repo.employees_for_site(&site).await?))
}

pub async fn supervisors(State(state): State<AppState>) -> ApiResult<Vec<Supervisor>> {
    Ok(Json(state.repo.supervisors().await?))
}

pub async fn employees(State(state): State<AppState>) -> ApiResult<Vec<Employee>> {
    Ok(Json(state.repo.employees().await?))
}

pub async fn employee_status_options(State(state): State<AppState>) -> ApiResult<StatusOptions> {
    Ok(Json(state.repo.status_options().await?))
}

pub async fn update_employee_status(
    State(state): State<AppState>,
    Path(employee): Path<String>,
    body: Bytes,
) -> ApiResult<Employee> {
    let employee = record_id(&employee)?;
    let estado = json_body::<UpdateEmployeeStatusRequest>(&body)?.validate()?;
    let updated = state.repo.update_employee_status(&employee, &estado).await?;
    log::info!("Empleado {} estado set to {}", employee, updated.status);
    Ok(Json(updated))
}

pub async fn work_orders(
    State(state): State<AppState>,
    Query(query): Query<WorkOrderQuery>,
) -> ApiResult<Vec<WorkOrder>> {
    let filter = query.into_filter()?;
    Ok(Json(state.repo.work_orders(&filter).await?))
}

pub async fn create_work_order(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<WorkOrderMutation> {
    let command = json_body::<CreateWorkOrderRequest>(&body)?.validate()?;
    let created = state.repo.create_work_order(command).await?;
    log::info!(
        "Parte {} created with {} detalles ({} errors)",
        created.work_order.id,
        created.entries_created,
        created.entry_errors
    );
    Ok(Json(created))
}

pub async fn update_work_order(
    State(state): State<AppState>,
    Path(work_order): Path<String>,
    body: Bytes,
) -> ApiResult<WorkOrderMutation> {
    let work_order = record_id(&work_order)?;
    let changes = json_body::<UpdateWorkOrderRequest>(&body)?.validate()?;
    let updated = state.repo.update_work_order(&work_order, changes).await?;
    log::info!(
        "Parte {} updated with {} detalles ({} errors)",
        work_order,
        updated.entries_created,
        updated.entry_errors
    );
    Ok(Json(updated))
}

pub async fn work_order_employees(
    State(state): State<AppState>,
    Path(work_order): Path<String>,
) -> ApiResult<Vec<HoursEntry>> {
    let work_order = record_id(&work_order)?;
    Ok(Json(state.repo.hours_entries(&work_order).await?))
}

pub async fn work_order_detail(
    State(state): State<AppState>,
    Path(work_order): Path<String>,
) -> ApiResult<WorkOrderDetail> {
    let work_order = record_id(&work_order)?;
    Ok(Json(state.repo.work_order_detail(&work_order).await?))
}

pub async fn work_order_status(
    State(state): State<AppState>,
    Path(work_order): Path<String>,
) -> ApiResult<WorkOrderStatus> {
    let work_order = record_id(&work_order)?;
    Ok(Json(state.repo.work_order_status(&work_order).await?))
}

pub async fn work_order_events(
    State(state): State<AppState>,
    Path(work_order): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let work_order = record_id(&work_order)?;
    let initial = state.repo.work_order_status(&work_order).await?;
    log::debug!("Streaming estado of parte {}", work_order);

    let events = status_updates(state.repo.clone(), work_order, initial, state.events_interval)
        .map(|update| Ok(update.into_event()));
    Ok(Sse::new(events).keep_alive(
        KeepAlive::new().interval(Duration::from_secs(EVENTS_KEEP_ALIVE_SECS)),
    ))
}

pub async fn send_work_order_data(
    State(state): State<AppState>,
    Path(work_order): Path<String>,
) -> ApiResult<SendDataOutcome> {
    let work_order = record_id(&work_order)?;
    let outcome = state.repo.send_work_order_data(&work_order).await?;
    log::info!(
        "Parte {} data sent, estado now {}",
        work_order,
        outcome.work_order.status
    );
    Ok(Json(outcome))
}

pub async fn complete_data(State(state): State<AppState>) -> ApiResult<CompleteData> {
    Ok(Json(state.repo.complete_data().await?))
}

pub async fn fallback(uri: Uri) -> AppError {
    AppError::not_found("Ruta", uri.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn empty_bodies_read_as_empty_objects() {
        let request: UpdateWorkOrderRequest = json_body(&Bytes::from_static(b"  ")).unwrap();
        assert_eq!(request, UpdateWorkOrderRequest::default());
    }

    #[test]
    fn malformed_bodies_are_validation_errors() {
        let err = json_body::<CreateWorkOrderRequest>(&Bytes::from_static(b"{\"obra\":"))
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn listing_query_builds_a_filter() {
        let filter = WorkOrderQuery {
            obra: Some("  Reforma Sede Central ".into()),
            fecha: Some("2024-03-10".into()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.site.as_deref(), Some("Reforma Sede Central"));
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(2024, 3, 10));

        assert!(WorkOrderQuery::default().into_filter().unwrap().is_empty());

        let err = WorkOrderQuery {
            obra: None,
            fecha: Some("10/03/2024".into()),
        }
        .into_filter()
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
