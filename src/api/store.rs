// src/api/store.rs
//! Work-order store backed by the Notion databases.

use super::client::NotionHttpClient;
use super::properties::{write, OptionKind};
use super::responses::{NotionDatabase, NotionPage};
use super::schema::NotionSchema;
use crate::constants::{DATA_SENT_STATE, DRAFT_STATE};
use crate::error::AppError;
use crate::model::{
    date_part, now_timestamp, work_order_name, Assignment, BackendMode, Employee, HealthStatus,
    HoursBreakdown, HoursEntry, NewWorkOrder, SendDataOutcome, SendDataPayload, Site,
    StatusOption, StatusOptions, Supervisor, WorkOrder, WorkOrderChanges, WorkOrderDetail,
    WorkOrderFilter, WorkOrderMutation, WorkOrderStatus,
};
use crate::repository::WorkOrderRepository;
use crate::types::{RecordId, ValidatedUrl, ValidationError};
use serde_json::{json, Map, Value};

/// Outcome of writing the hours rows of one parte.
struct HoursWrite {
    created: usize,
    errors: usize,
    breakdown: HoursBreakdown,
}

pub struct NotionWorkOrders {
    client: NotionHttpClient,
    schema: NotionSchema,
    signing_base: Option<ValidatedUrl>,
}

impl NotionWorkOrders {
    pub fn new(
        client: NotionHttpClient,
        schema: NotionSchema,
        signing_base: Option<ValidatedUrl>,
    ) -> Self {
        Self {
            client,
            schema,
            signing_base,
        }
    }

    /// Retrieves a page, reporting a missing or archived one as `entity` not found.
    async fn page(&self, entity: &'static str, id: &RecordId) -> Result<NotionPage, AppError> {
        let page: NotionPage = self
            .client
            .get(&format!("pages/{}", id.to_notion_dashed()))
            .await
            .map_err(|e| not_found_as(e, entity, id))?;
        if page.archived {
            return Err(AppError::not_found(entity, id));
        }
        Ok(page)
    }

    async fn patch_page(
        &self,
        entity: &'static str,
        id: &RecordId,
        body: Value,
    ) -> Result<NotionPage, AppError> {
        self.client
            .patch(&format!("pages/{}", id.to_notion_dashed()), &body)
            .await
            .map_err(|e| not_found_as(e, entity, id))
    }

    async fn query(&self, database: &str, body: Value) -> Result<Vec<NotionPage>, AppError> {
        let pages = self.client.query_all(database, body).await?;
        Ok(pages.into_iter().filter(|p| !p.archived).collect())
    }

    async fn hours_pages(&self, work_order: &RecordId) -> Result<Vec<NotionPage>, AppError> {
        self.query(
            &self.schema.databases.hours,
            json!({
                "filter": {
                    "property": self.schema.hours.work_order,
                    "relation": { "contains": work_order.to_notion_dashed() }
                }
            }),
        )
        .await
    }

    /// Creates one hours row per assignment. Unknown employees and rows
    /// Notion refuses are counted as errors and skipped. The parte already
    /// exists at this point, so nothing here fails the whole write.
    async fn write_hours(
        &self,
        work_order: &RecordId,
        date: &str,
        assignments: &[Assignment],
    ) -> HoursWrite {
        let employees = if assignments.is_empty() {
            Vec::new()
        } else {
            match self.employees().await {
                Ok(employees) => employees,
                Err(e) => {
                    log::error!(
                        "Could not load employees for the hours of parte {}: {}",
                        work_order,
                        e
                    );
                    return HoursWrite {
                        created: 0,
                        errors: assignments.len(),
                        breakdown: HoursBreakdown::default(),
                    };
                }
            }
        };
        let columns = &self.schema.hours;
        let mut created = Vec::new();
        let mut errors = 0;

        for assignment in assignments {
            let Some(employee) = employees
                .iter()
                .find(|e| e.id.same_object(&assignment.employee_id))
            else {
                log::warn!(
                    "Skipping hours for unknown employee {} on parte {}",
                    assignment.employee_id,
                    work_order
                );
                errors += 1;
                continue;
            };

            let mut properties = Map::new();
            properties.insert(
                columns.description.to_string(),
                write::title(&format!("Horas registradas para {}", employee.name)),
            );
            properties.insert(
                columns.work_order.to_string(),
                write::relation([work_order.to_notion_dashed().as_str()]),
            );
            properties.insert(
                columns.employee.to_string(),
                write::relation([employee.id.to_notion_dashed().as_str()]),
            );
            properties.insert(columns.hours.to_string(), write::number(assignment.hours));
            properties.insert(columns.date.to_string(), write::date(date_part(date)));

            let body = json!({
                "parent": { "database_id": self.schema.databases.hours },
                "properties": properties,
            });
            match self.client.post::<NotionPage, _>("pages", &body).await {
                Ok(_) => created.push((employee.category.as_str(), assignment.hours)),
                Err(e) => {
                    log::error!(
                        "Failed to create hours for employee {} on parte {}: {}",
                        employee.id,
                        work_order,
                        e
                    );
                    errors += 1;
                }
            }
        }

        HoursWrite {
            created: created.len(),
            errors,
            breakdown: HoursBreakdown::from_entries(created),
        }
    }

    fn flatten_work_order(&self, page: &NotionPage) -> Result<WorkOrder, AppError> {
        self.schema.work_order(page, self.signing_base.as_ref())
    }
}

fn not_found_as(err: AppError, entity: &'static str, id: &RecordId) -> AppError {
    if err.is_not_found() {
        AppError::not_found(entity, id)
    } else {
        err
    }
}

fn option_kind(kind: &str) -> OptionKind {
    if kind == OptionKind::Select.as_str() {
        OptionKind::Select
    } else {
        OptionKind::Status
    }
}

#[async_trait::async_trait]
impl WorkOrderRepository for NotionWorkOrders {
    fn mode(&self) -> BackendMode {
        BackendMode::Notion
    }

    async fn health(&self) -> Result<HealthStatus, AppError> {
        Ok(HealthStatus {
            status: "ok".to_string(),
            timestamp: now_timestamp(),
            notion_token: "configured".to_string(),
            mode: BackendMode::Notion,
        })
    }

    async fn sites(&self) -> Result<Vec<Site>, AppError> {
        let pages = self.query(&self.schema.databases.sites, json!({})).await?;
        pages.iter().map(|p| self.schema.site(p)).collect()
    }

    async fn supervisors(&self) -> Result<Vec<Supervisor>, AppError> {
        let pages = self
            .query(&self.schema.databases.supervisors, json!({}))
            .await?;
        pages.iter().map(|p| self.schema.supervisor(p)).collect()
    }

    async fn employees(&self) -> Result<Vec<Employee>, AppError> {
        let pages = self
            .query(&self.schema.databases.employees, json!({}))
            .await?;
        pages.iter().map(|p| self.schema.employee(p)).collect()
    }

    async fn employees_for_site(&self, site: &RecordId) -> Result<Vec<Employee>, AppError> {
        let pages = self
            .query(
                &self.schema.databases.employees,
                json!({
                    "filter": {
                        "property": self.schema.employees.sites,
                        "relation": { "contains": site.to_notion_dashed() }
                    }
                }),
            )
            .await?;
        pages.iter().map(|p| self.schema.employee(p)).collect()
    }

    async fn status_options(&self) -> Result<StatusOptions, AppError> {
        let database: NotionDatabase = self
            .client
            .get(&format!("databases/{}", self.schema.databases.employees))
            .await?;
        let column = self.schema.employees.status;
        let (kind, options) = database
            .properties
            .get(column)
            .and_then(|p| p.options())
            .ok_or_else(|| {
                AppError::MalformedResponse(format!(
                    "Property '{}' is not a status or select column",
                    column
                ))
            })?;

        Ok(StatusOptions {
            kind: kind.as_str().to_string(),
            options: options
                .iter()
                .map(|o| StatusOption {
                    name: o.name.clone(),
                    color: o.color.clone().unwrap_or_else(|| "default".to_string()),
                })
                .collect(),
        })
    }

    async fn update_employee_status(
        &self,
        employee: &RecordId,
        estado: &str,
    ) -> Result<Employee, AppError> {
        let options = self.status_options().await?;
        let option = options
            .find(estado)
            .ok_or_else(|| ValidationError::UnknownStatus {
                value: estado.to_string(),
                options: options.names(),
            })?;

        let body = json!({
            "properties": {
                self.schema.employees.status: write::option(option_kind(&options.kind), &option.name)
            }
        });
        let page = self.patch_page("Empleado", employee, body).await?;
        log::info!("Employee {} estado set to {}", employee, option.name);
        self.schema.employee(&page)
    }

    async fn work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
        let pages = self
            .query(
                &self.schema.databases.work_orders,
                json!({
                    "sorts": [{ "property": self.schema.work_orders.date, "direction": "descending" }]
                }),
            )
            .await?;

        let mut orders = Vec::with_capacity(pages.len());
        for page in &pages {
            let order = self.flatten_work_order(page)?;
            if filter.matches(&order) {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    async fn hours_entries(&self, work_order: &RecordId) -> Result<Vec<HoursEntry>, AppError> {
        let (pages, employees) = tokio::try_join!(self.hours_pages(work_order), self.employees())?;
        pages
            .iter()
            .map(|p| self.schema.hours_entry(p, &employees))
            .collect()
    }

    async fn work_order_detail(&self, work_order: &RecordId) -> Result<WorkOrderDetail, AppError> {
        let page = self.page("Parte", work_order).await?;
        let order = self.flatten_work_order(&page)?;
        let entries = self.hours_entries(work_order).await?;
        Ok(WorkOrderDetail {
            work_order: order.summary(),
            entries,
        })
    }

    async fn work_order_status(&self, work_order: &RecordId) -> Result<WorkOrderStatus, AppError> {
        let page = self.page("Parte", work_order).await?;
        Ok(WorkOrderStatus {
            status: page.reader().text(self.schema.work_orders.status),
            last_edited: page.last_edited_time.clone(),
        })
    }

    async fn create_work_order(&self, command: NewWorkOrder) -> Result<WorkOrderMutation, AppError> {
        tokio::try_join!(
            self.page("Obra", &command.site_id),
            self.page("Persona Autorizada", &command.supervisor_id),
        )?;

        let columns = &self.schema.work_orders;
        let mut properties = Map::new();
        properties.insert(
            columns.name.to_string(),
            write::title(&work_order_name(&command.site_name, &command.date)),
        );
        properties.insert(columns.date.to_string(), write::date(&command.date));
        properties.insert(
            columns.status.to_string(),
            write::option(self.schema.work_order_status_kind, DRAFT_STATE),
        );
        properties.insert(
            columns.site.to_string(),
            write::relation([command.site_id.to_notion_dashed().as_str()]),
        );
        properties.insert(
            columns.supervisor.to_string(),
            write::relation([command.supervisor_id.to_notion_dashed().as_str()]),
        );
        properties.insert(columns.notes.to_string(), write::rich_text(&command.notes));

        let body = json!({
            "parent": { "database_id": self.schema.databases.work_orders },
            "properties": properties,
        });
        let page: NotionPage = self.client.post("pages", &body).await?;
        let mut order = self.flatten_work_order(&page)?;
        if order.site_name.is_empty() {
            order.site_name = command.site_name.clone();
        }
        log::info!("Created parte {} ({})", order.id, order.name);

        let hours = self
            .write_hours(&order.id, &command.date, &command.assignments)
            .await;
        order.apply_hours(&hours.breakdown);

        Ok(WorkOrderMutation::created(
            order,
            command.assignments.len(),
            hours.created,
            hours.errors,
        ))
    }

    async fn update_work_order(
        &self,
        work_order: &RecordId,
        changes: WorkOrderChanges,
    ) -> Result<WorkOrderMutation, AppError> {
        let page = self.page("Parte", work_order).await?;
        let current = self.flatten_work_order(&page)?;
        if !current.state().is_editable() {
            return Err(AppError::NotEditable {
                estado: current.status,
            });
        }

        if let Some(site) = &changes.site_id {
            self.page("Obra", site).await?;
        }
        if let Some(supervisor) = &changes.supervisor_id {
            self.page("Persona Autorizada", supervisor).await?;
        }

        let columns = &self.schema.work_orders;
        let mut properties = Map::new();
        properties.insert(columns.notes.to_string(), write::rich_text(&changes.notes));
        if let Some(date) = &changes.date {
            properties.insert(columns.date.to_string(), write::date(date));
        }
        if let Some(site) = &changes.site_id {
            properties.insert(
                columns.site.to_string(),
                write::relation([site.to_notion_dashed().as_str()]),
            );
        }
        if let Some(supervisor) = &changes.supervisor_id {
            properties.insert(
                columns.supervisor.to_string(),
                write::relation([supervisor.to_notion_dashed().as_str()]),
            );
        }
        let updated = self
            .patch_page("Parte", work_order, json!({ "properties": properties }))
            .await?;

        let previous = self.hours_pages(work_order).await?;
        for entry in &previous {
            let id = RecordId::parse(&entry.id)?;
            self.patch_page("Detalle", &id, json!({ "archived": true }))
                .await?;
        }
        log::debug!(
            "Archived {} hours rows of parte {}",
            previous.len(),
            work_order
        );

        let date = changes.date.as_deref().unwrap_or(&current.date);
        let hours = self
            .write_hours(work_order, date, &changes.assignments)
            .await;

        let mut order = self.flatten_work_order(&updated)?;
        order.apply_hours(&hours.breakdown);
        log::info!("Updated parte {}", work_order);

        Ok(WorkOrderMutation::updated(
            order,
            changes.assignments.len(),
            hours.created,
            hours.errors,
        ))
    }

    async fn send_work_order_data(
        &self,
        work_order: &RecordId,
    ) -> Result<SendDataOutcome, AppError> {
        let page = self.page("Parte", work_order).await?;
        let current = self.flatten_work_order(&page)?;
        if !current.state().can_send_data() {
            return Err(AppError::InvalidState {
                estado: current.status,
            });
        }

        let columns = &self.schema.work_orders;
        let property_id = page.reader().unsupported_id(columns.send_data);
        let payload = SendDataPayload::new(current, property_id, BackendMode::Notion);

        let body = json!({
            "properties": {
                columns.status: write::option(self.schema.work_order_status_kind, DATA_SENT_STATE)
            }
        });
        let updated = self.patch_page("Parte", work_order, body).await?;
        log::info!("Parte {} marked as {}", work_order, DATA_SENT_STATE);

        Ok(SendDataOutcome {
            work_order: self.flatten_work_order(&updated)?,
            payload,
        })
    }
}
