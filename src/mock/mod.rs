// src/mock/mod.rs
//! In-memory work-order store used when no Notion token is configured.
//!
//! Follows the same rules as the Notion store: frozen partes reject
//! edits, only drafts can be sent, and hour totals are derived from the
//! hours rows on every read.

mod fixtures;

use crate::constants::{DATA_SENT_STATE, DRAFT_STATE};
use crate::error::AppError;
use crate::model::{
    date_part, now_timestamp, signing_url, work_order_name, Assignment, BackendMode, Employee,
    HealthStatus, HoursBreakdown, HoursEntry, NewWorkOrder, SendDataOutcome, SendDataPayload,
    Site, StatusOptions, Supervisor, WorkOrder, WorkOrderChanges, WorkOrderDetail,
    WorkOrderFilter, WorkOrderMutation, WorkOrderStatus,
};
use crate::repository::WorkOrderRepository;
use crate::types::{RecordId, ValidatedUrl, ValidationError};
use parking_lot::RwLock;

/// Property ID reported for the send-data button of mock partes.
const MOCK_SEND_DATA_PROPERTY_ID: &str = "mock-enviar-datos";

struct MockState {
    sites: Vec<Site>,
    supervisors: Vec<Supervisor>,
    employees: Vec<Employee>,
    status_options: StatusOptions,
    /// Newest first.
    work_orders: Vec<WorkOrder>,
    entries: Vec<(RecordId, HoursEntry)>,
}

impl MockState {
    fn seeded() -> Self {
        Self {
            sites: fixtures::sites(),
            supervisors: fixtures::supervisors(),
            employees: fixtures::employees(),
            status_options: fixtures::status_options(),
            work_orders: fixtures::work_orders(),
            entries: fixtures::hours_entries(),
        }
    }

    fn work_order_index(&self, id: &RecordId) -> Result<usize, AppError> {
        self.work_orders
            .iter()
            .position(|w| w.id.same_object(id))
            .ok_or_else(|| AppError::not_found("Parte", id))
    }

    fn entries_of<'a>(&'a self, id: &'a RecordId) -> impl Iterator<Item = &'a HoursEntry> + 'a {
        self.entries
            .iter()
            .filter(move |(parte, _)| parte.same_object(id))
            .map(|(_, entry)| entry)
    }

    /// The parte with hour totals recomputed from its hours rows.
    fn with_hours(&self, order: &WorkOrder) -> WorkOrder {
        let breakdown = HoursBreakdown::from_entries(
            self.entries_of(&order.id)
                .map(|e| (e.category.as_str(), e.hours)),
        );
        let mut order = order.clone();
        order.apply_hours(&breakdown);
        order
    }

    fn require_site(&self, id: &RecordId) -> Result<&Site, AppError> {
        self.sites
            .iter()
            .find(|s| s.id.same_object(id))
            .ok_or_else(|| AppError::not_found("Obra", id))
    }

    fn require_supervisor(&self, id: &RecordId) -> Result<&Supervisor, AppError> {
        self.supervisors
            .iter()
            .find(|s| s.id.same_object(id))
            .ok_or_else(|| AppError::not_found("Persona Autorizada", id))
    }

    /// Adds one hours row per known employee; returns (created, errors).
    fn add_entries(
        &mut self,
        work_order: &RecordId,
        date: &str,
        assignments: &[Assignment],
    ) -> (usize, usize) {
        let mut created = 0;
        let mut errors = 0;
        for assignment in assignments {
            let Some(employee) = self
                .employees
                .iter()
                .find(|e| e.id.same_object(&assignment.employee_id))
            else {
                log::warn!(
                    "Skipping hours for unknown employee {}",
                    assignment.employee_id
                );
                errors += 1;
                continue;
            };
            let entry = HoursEntry {
                id: RecordId::new_v4(),
                employee_id: Some(employee.id.clone()),
                employee_name: employee.name.clone(),
                category: employee.category.clone(),
                hours: assignment.hours,
                date: date_part(date).to_string(),
                description: format!("Horas registradas para {}", employee.name),
            };
            self.entries.push((work_order.clone(), entry));
            created += 1;
        }
        (created, errors)
    }
}

pub struct MockWorkOrders {
    state: RwLock<MockState>,
    signing_base: Option<ValidatedUrl>,
}

impl MockWorkOrders {
    pub fn new(signing_base: Option<ValidatedUrl>) -> Self {
        Self {
            state: RwLock::new(MockState::seeded()),
            signing_base,
        }
    }
}

impl Default for MockWorkOrders {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait::async_trait]
impl WorkOrderRepository for MockWorkOrders {
    fn mode(&self) -> BackendMode {
        BackendMode::Mock
    }

    async fn health(&self) -> Result<HealthStatus, AppError> {
        Ok(HealthStatus {
            status: "ok".to_string(),
            timestamp: now_timestamp(),
            notion_token: "mock".to_string(),
            mode: BackendMode::Mock,
        })
    }

    async fn sites(&self) -> Result<Vec<Site>, AppError> {
        Ok(self.state.read().sites.clone())
    }

    async fn supervisors(&self) -> Result<Vec<Supervisor>, AppError> {
        Ok(self.state.read().supervisors.clone())
    }

    async fn employees(&self) -> Result<Vec<Employee>, AppError> {
        Ok(self.state.read().employees.clone())
    }

    async fn employees_for_site(&self, site: &RecordId) -> Result<Vec<Employee>, AppError> {
        Ok(self
            .state
            .read()
            .employees
            .iter()
            .filter(|e| e.site_id.as_ref().is_some_and(|s| s.same_object(site)))
            .cloned()
            .collect())
    }

    async fn status_options(&self) -> Result<StatusOptions, AppError> {
        Ok(self.state.read().status_options.clone())
    }

    async fn update_employee_status(
        &self,
        employee: &RecordId,
        estado: &str,
    ) -> Result<Employee, AppError> {
        let mut state = self.state.write();
        let option = state
            .status_options
            .find(estado)
            .map(|o| o.name.clone())
            .ok_or_else(|| ValidationError::UnknownStatus {
                value: estado.to_string(),
                options: state.status_options.names(),
            })?;
        let record = state
            .employees
            .iter_mut()
            .find(|e| e.id.same_object(employee))
            .ok_or_else(|| AppError::not_found("Empleado", employee))?;
        record.status = option;
        Ok(record.clone())
    }

    async fn work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
        let state = self.state.read();
        let mut orders: Vec<WorkOrder> = state
            .work_orders
            .iter()
            .filter(|w| filter.matches(w))
            .map(|w| state.with_hours(w))
            .collect();
        orders.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(orders)
    }

    async fn hours_entries(&self, work_order: &RecordId) -> Result<Vec<HoursEntry>, AppError> {
        Ok(self
            .state
            .read()
            .entries_of(work_order)
            .cloned()
            .collect())
    }

    async fn work_order_detail(&self, work_order: &RecordId) -> Result<WorkOrderDetail, AppError> {
        let state = self.state.read();
        let index = state.work_order_index(work_order)?;
        let order = &state.work_orders[index];
        Ok(WorkOrderDetail {
            work_order: order.summary(),
            entries: state.entries_of(&order.id).cloned().collect(),
        })
    }

    async fn work_order_status(&self, work_order: &RecordId) -> Result<WorkOrderStatus, AppError> {
        let state = self.state.read();
        let index = state.work_order_index(work_order)?;
        Ok(state.work_orders[index].status_snapshot())
    }

    async fn create_work_order(&self, command: NewWorkOrder) -> Result<WorkOrderMutation, AppError> {
        let mut state = self.state.write();
        state.require_site(&command.site_id)?;
        state.require_supervisor(&command.supervisor_id)?;

        let id = RecordId::new_v4();
        let order = WorkOrder {
            name: work_order_name(&command.site_name, &command.date),
            date: command.date.clone(),
            last_edited: Some(now_timestamp()),
            status: DRAFT_STATE.to_string(),
            site_id: Some(command.site_id.clone()),
            supervisor_id: Some(command.supervisor_id.clone()),
            total_hours: 0.0,
            first_class_hours: 0.0,
            second_class_hours: 0.0,
            chargehand_hours: 0.0,
            foreman_hours: 0.0,
            total_amount: 0.0,
            pdf_url: String::new(),
            sent_to_client: false,
            notes: command.notes.clone(),
            signing_url: signing_url(self.signing_base.as_ref(), id.as_str(), &command.site_name),
            site_name: command.site_name.clone(),
            id: id.clone(),
        };
        state.work_orders.insert(0, order);

        let (created, errors) = state.add_entries(&id, &command.date, &command.assignments);
        let order = state.with_hours(&state.work_orders[0]);
        log::info!("Created mock parte {} ({})", order.id, order.name);

        Ok(WorkOrderMutation::created(
            order,
            command.assignments.len(),
            created,
            errors,
        ))
    }

    async fn update_work_order(
        &self,
        work_order: &RecordId,
        changes: WorkOrderChanges,
    ) -> Result<WorkOrderMutation, AppError> {
        let mut state = self.state.write();
        let index = state.work_order_index(work_order)?;

        let current = &state.work_orders[index];
        if !current.state().is_editable() {
            return Err(AppError::NotEditable {
                estado: current.status.clone(),
            });
        }

        let site = match &changes.site_id {
            Some(id) => Some(state.require_site(id)?.clone()),
            None => None,
        };
        if let Some(id) = &changes.supervisor_id {
            state.require_supervisor(id)?;
        }

        let order_id = state.work_orders[index].id.clone();
        {
            let order = &mut state.work_orders[index];
            if let Some(date) = &changes.date {
                order.date = date.clone();
            }
            if let Some(site) = site {
                order.site_name = site.name;
                order.site_id = Some(site.id);
            }
            if let Some(supervisor) = &changes.supervisor_id {
                order.supervisor_id = Some(supervisor.clone());
            }
            order.notes = changes.notes.clone();
            order.last_edited = Some(now_timestamp());
            if self.signing_base.is_some() {
                order.signing_url =
                    signing_url(self.signing_base.as_ref(), order.id.as_str(), &order.site_name);
            }
        }

        state.entries.retain(|(parte, _)| !parte.same_object(&order_id));
        let date = state.work_orders[index].date.clone();
        let (created, errors) = state.add_entries(&order_id, &date, &changes.assignments);
        let order = state.with_hours(&state.work_orders[index]);
        log::info!("Updated mock parte {}", order_id);

        Ok(WorkOrderMutation::updated(
            order,
            changes.assignments.len(),
            created,
            errors,
        ))
    }

    async fn send_work_order_data(
        &self,
        work_order: &RecordId,
    ) -> Result<SendDataOutcome, AppError> {
        let mut state = self.state.write();
        let index = state.work_order_index(work_order)?;

        let current = state.with_hours(&state.work_orders[index]);
        if !current.state().can_send_data() {
            return Err(AppError::InvalidState {
                estado: current.status,
            });
        }

        let payload = SendDataPayload::new(
            current,
            Some(MOCK_SEND_DATA_PROPERTY_ID.to_string()),
            BackendMode::Mock,
        );

        let order = &mut state.work_orders[index];
        order.status = DATA_SENT_STATE.to_string();
        order.last_edited = Some(now_timestamp());
        let order = state.with_hours(&state.work_orders[index]);
        log::info!("Mock parte {} marked as {}", order.id, DATA_SENT_STATE);

        Ok(SendDataOutcome {
            work_order: order,
            payload,
        })
    }
}
