//! Plain records served by the REST API.
//!
//! Field names are English in Rust; the serialized keys are the Spanish
//! camelCase keys the web client consumes.

use crate::types::RecordId;
use serde::{Deserialize, Serialize};

/// A construction site (obra).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: RecordId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "provincia", default)]
    pub province: String,
    #[serde(rename = "estado", default)]
    pub status: String,
    #[serde(rename = "precioEncargado", default)]
    pub foreman_rate: f64,
    #[serde(rename = "precioCapataz", default)]
    pub chargehand_rate: f64,
    #[serde(rename = "precioOficial1", default)]
    pub first_class_rate: f64,
    #[serde(rename = "precioOficial2", default)]
    pub second_class_rate: f64,
}

/// The person authorized to approve partes on a site (jefe de obra).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supervisor {
    pub id: RecordId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: RecordId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "categoria", default)]
    pub category: String,
    #[serde(rename = "provincia", default)]
    pub province: String,
    #[serde(rename = "localidad", default)]
    pub town: String,
    #[serde(rename = "telefono", default)]
    pub phone: String,
    #[serde(default)]
    pub dni: String,
    #[serde(rename = "estado", default)]
    pub status: String,
    #[serde(rename = "delegado", default)]
    pub delegate: String,
    #[serde(rename = "obraId", default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<RecordId>,
}

/// A work order (parte de trabajo) as listed by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: RecordId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "ultimaEdicion", default)]
    pub last_edited: Option<String>,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "obra", default)]
    pub site_name: String,
    #[serde(rename = "obraId", default)]
    pub site_id: Option<RecordId>,
    #[serde(rename = "personaAutorizadaId", default)]
    pub supervisor_id: Option<RecordId>,
    #[serde(rename = "rpHorasTotales", default)]
    pub total_hours: f64,
    #[serde(rename = "horasOficial1", default)]
    pub first_class_hours: f64,
    #[serde(rename = "horasOficial2", default)]
    pub second_class_hours: f64,
    #[serde(rename = "horasCapataz", default)]
    pub chargehand_hours: f64,
    #[serde(rename = "horasEncargado", default)]
    pub foreman_hours: f64,
    #[serde(rename = "importeTotal", default)]
    pub total_amount: f64,
    #[serde(rename = "urlPDF", default)]
    pub pdf_url: String,
    #[serde(rename = "enviadoCliente", default)]
    pub sent_to_client: bool,
    #[serde(rename = "notas", default)]
    pub notes: String,
    #[serde(rename = "firmarUrl", default)]
    pub signing_url: Option<String>,
}

impl WorkOrder {
    /// The `YYYY-MM-DD` part of the parte's date.
    pub fn date_part(&self) -> &str {
        date_part(&self.date)
    }

    pub fn state(&self) -> super::WorkOrderState {
        super::WorkOrderState::parse(&self.status)
    }

    pub fn summary(&self) -> WorkOrderSummary {
        WorkOrderSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            date: self.date.clone(),
            site_name: self.site_name.clone(),
            site_id: self.site_id.clone(),
            status: self.status.clone(),
            last_edited: self.last_edited.clone(),
            notes: self.notes.clone(),
            supervisor_id: self.supervisor_id.clone(),
            signing_url: self.signing_url.clone(),
        }
    }

    pub fn status_snapshot(&self) -> WorkOrderStatus {
        WorkOrderStatus {
            status: self.status.clone(),
            last_edited: self.last_edited.clone(),
        }
    }

    /// Overwrites the hour totals with a freshly computed breakdown.
    pub fn apply_hours(&mut self, hours: &super::HoursBreakdown) {
        self.total_hours = hours.total;
        self.first_class_hours = hours.first_class;
        self.second_class_hours = hours.second_class;
        self.chargehand_hours = hours.chargehand;
        self.foreman_hours = hours.foreman;
    }
}

/// The `parte` half of a detail response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderSummary {
    pub id: RecordId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "obra")]
    pub site_name: String,
    #[serde(rename = "obraId")]
    pub site_id: Option<RecordId>,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "ultimaEdicion")]
    pub last_edited: Option<String>,
    #[serde(rename = "notas")]
    pub notes: String,
    #[serde(rename = "personaAutorizada")]
    pub supervisor_id: Option<RecordId>,
    #[serde(rename = "firmarUrl")]
    pub signing_url: Option<String>,
}

/// Hours one employee worked on one parte (detalle de horas).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoursEntry {
    pub id: RecordId,
    #[serde(rename = "empleadoId")]
    pub employee_id: Option<RecordId>,
    #[serde(rename = "empleadoNombre", default)]
    pub employee_name: String,
    #[serde(rename = "categoria", default)]
    pub category: String,
    #[serde(rename = "horas")]
    pub hours: f64,
    #[serde(rename = "fecha", default)]
    pub date: String,
    #[serde(rename = "detalle", default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderDetail {
    #[serde(rename = "parte")]
    pub work_order: WorkOrderSummary,
    #[serde(rename = "empleados")]
    pub entries: Vec<HoursEntry>,
}

/// The two fields the sync layer watches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderStatus {
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "ultimaEdicion")]
    pub last_edited: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOption {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// The allowed values of the employee estado property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOptions {
    #[serde(rename = "type")]
    pub kind: String,
    pub options: Vec<StatusOption>,
}

impl StatusOptions {
    /// Returns the canonical spelling of `value` if it is one of the options.
    pub fn find(&self, value: &str) -> Option<&StatusOption> {
        let wanted = value.trim();
        self.options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(wanted))
    }

    pub fn names(&self) -> Vec<String> {
        self.options.iter().map(|o| o.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    Notion,
    Mock,
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendMode::Notion => write!(f, "notion"),
            BackendMode::Mock => write!(f, "mock"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    #[serde(rename = "notionToken")]
    pub notion_token: String,
    pub mode: BackendMode,
}

/// Everything the web client loads on startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteData {
    #[serde(rename = "obras")]
    pub sites: Vec<Site>,
    #[serde(rename = "jefesObra")]
    pub supervisors: Vec<Supervisor>,
    #[serde(rename = "empleados")]
    pub employees: Vec<Employee>,
    #[serde(rename = "partesTrabajo")]
    pub work_orders: Vec<WorkOrder>,
}

/// Result of creating or updating a parte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderMutation {
    #[serde(flatten)]
    pub work_order: WorkOrder,
    #[serde(rename = "empleadosAsignados")]
    pub employees_assigned: usize,
    #[serde(rename = "detallesCreados")]
    pub entries_created: usize,
    #[serde(rename = "erroresDetalles")]
    pub entry_errors: usize,
    #[serde(rename = "mensaje")]
    pub message: String,
}

impl WorkOrderMutation {
    pub fn created(work_order: WorkOrder, assigned: usize, created: usize, errors: usize) -> Self {
        Self {
            work_order,
            employees_assigned: assigned,
            entries_created: created,
            entry_errors: errors,
            message: format!("Parte creado exitosamente. {} empleados asignados.", created),
        }
    }

    pub fn updated(work_order: WorkOrder, assigned: usize, created: usize, errors: usize) -> Self {
        Self {
            message: format!("Parte actualizado exitosamente. {} empleados asignados.", created),
            ..Self::created(work_order, assigned, created, errors)
        }
    }
}

/// Who asked for the data to be sent, attached to the send-data payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
    #[serde(rename = "triggeredAt")]
    pub triggered_at: String,
    pub mode: BackendMode,
}

/// The body handed to the signing flow when a parte's data is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendDataPayload {
    #[serde(rename = "parteId")]
    pub work_order_id: RecordId,
    #[serde(rename = "notionPageId")]
    pub notion_page_id: String,
    pub page_id: String,
    pub property_id: Option<String>,
    pub property_name: String,
    pub source: PayloadSource,
    pub data: WorkOrder,
}

impl SendDataPayload {
    /// Payload for `work_order` as it was before the transition.
    pub fn new(work_order: WorkOrder, property_id: Option<String>, mode: BackendMode) -> Self {
        Self {
            work_order_id: work_order.id.clone(),
            notion_page_id: work_order.id.to_string(),
            page_id: work_order.id.to_string(),
            property_id,
            property_name: crate::constants::SEND_DATA_PROPERTY.to_string(),
            source: PayloadSource {
                kind: "obra-partes".to_string(),
                action: "enviar-datos".to_string(),
                triggered_at: now_timestamp(),
                mode,
            },
            data: work_order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendDataOutcome {
    #[serde(rename = "parte")]
    pub work_order: WorkOrder,
    pub payload: SendDataPayload,
}

/// The `YYYY-MM-DD` prefix of an ISO date or timestamp.
pub fn date_part(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed.find('T') {
        Some(pos) => &trimmed[..pos],
        None => trimmed,
    }
}

/// Current UTC time as Notion formats timestamps.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
