//! Request bodies as received, and the validated commands built from them.

use crate::constants::{MAX_EMPLOYEES_PER_PARTE, MAX_NAME_LENGTH, MAX_NOTES_LENGTH};
use crate::error::AppError;
use crate::sanitize::{bounded_text, clean_optional, clean_text, hours_value, normalize_date};
use crate::types::{RecordId, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Fields a create request must carry.
pub const REQUIRED_CREATE_FIELDS: [&str; 4] = ["obra", "obraId", "fecha", "jefeObraId"];

/// `POST /api/partes-trabajo` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateWorkOrderRequest {
    #[serde(rename = "obra", default)]
    pub site_name: Option<String>,
    #[serde(rename = "obraId", default)]
    pub site_id: Option<String>,
    #[serde(rename = "fecha", default)]
    pub date: Option<String>,
    #[serde(rename = "jefeObraId", default)]
    pub supervisor_id: Option<String>,
    #[serde(rename = "notas", default)]
    pub notes: Option<String>,
    #[serde(rename = "empleados", default)]
    pub employees: Vec<String>,
    #[serde(rename = "empleadosHoras", default)]
    pub employee_hours: HashMap<String, Value>,
}

/// `PUT /api/partes-trabajo/:id` body. Absent references keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateWorkOrderRequest {
    #[serde(rename = "obraId", default)]
    pub site_id: Option<String>,
    #[serde(rename = "fecha", default)]
    pub date: Option<String>,
    #[serde(rename = "personaAutorizadaId", default)]
    pub supervisor_id: Option<String>,
    #[serde(rename = "notas", default)]
    pub notes: Option<String>,
    #[serde(rename = "empleados", default)]
    pub employees: Vec<String>,
    #[serde(rename = "empleadosHoras", default)]
    pub employee_hours: HashMap<String, Value>,
}

/// `PATCH /api/empleados/:id/estado` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEmployeeStatusRequest {
    #[serde(default)]
    pub estado: Option<String>,
}

/// One employee's hours on a parte.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub employee_id: RecordId,
    pub hours: f64,
}

/// A validated create command.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkOrder {
    pub site_name: String,
    pub site_id: RecordId,
    pub date: String,
    pub supervisor_id: RecordId,
    pub notes: String,
    pub assignments: Vec<Assignment>,
}

/// A validated update command.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOrderChanges {
    pub site_id: Option<RecordId>,
    pub date: Option<String>,
    pub supervisor_id: Option<RecordId>,
    pub notes: String,
    pub assignments: Vec<Assignment>,
}

impl CreateWorkOrderRequest {
    pub fn validate(self) -> Result<NewWorkOrder, AppError> {
        let site_name = clean_optional(self.site_name.as_deref(), MAX_NAME_LENGTH);
        let site_id = clean_optional(self.site_id.as_deref(), MAX_NAME_LENGTH);
        let date = clean_optional(self.date.as_deref(), MAX_NAME_LENGTH);
        let supervisor_id = clean_optional(self.supervisor_id.as_deref(), MAX_NAME_LENGTH);

        let (Some(site_name), Some(site_id), Some(date), Some(supervisor_id)) =
            (site_name, site_id, date, supervisor_id)
        else {
            return Err(AppError::MissingFields {
                required: REQUIRED_CREATE_FIELDS.to_vec(),
            });
        };

        Ok(NewWorkOrder {
            site_name,
            site_id: RecordId::parse(&site_id)?,
            date: normalize_date(&date)?,
            supervisor_id: RecordId::parse(&supervisor_id)?,
            notes: bounded_text("notas", self.notes.as_deref().unwrap_or(""), MAX_NOTES_LENGTH)?,
            assignments: parse_assignments(&self.employees, &self.employee_hours)?,
        })
    }
}

impl UpdateWorkOrderRequest {
    pub fn validate(self) -> Result<WorkOrderChanges, AppError> {
        let site_id = clean_optional(self.site_id.as_deref(), MAX_NAME_LENGTH)
            .map(|id| RecordId::parse(&id))
            .transpose()?;
        let supervisor_id = clean_optional(self.supervisor_id.as_deref(), MAX_NAME_LENGTH)
            .map(|id| RecordId::parse(&id))
            .transpose()?;
        let date = clean_optional(self.date.as_deref(), MAX_NAME_LENGTH)
            .map(|d| normalize_date(&d))
            .transpose()?;

        Ok(WorkOrderChanges {
            site_id,
            date,
            supervisor_id,
            notes: bounded_text("notas", self.notes.as_deref().unwrap_or(""), MAX_NOTES_LENGTH)?,
            assignments: parse_assignments(&self.employees, &self.employee_hours)?,
        })
    }
}

impl UpdateEmployeeStatusRequest {
    /// The requested estado, cleaned. Matching against the allowed options
    /// happens in the store, which knows them.
    pub fn validate(self) -> Result<String, AppError> {
        clean_optional(self.estado.as_deref(), MAX_NAME_LENGTH)
            .ok_or_else(|| ValidationError::EmptyField("estado").into())
    }
}

/// Pairs each listed employee with its hours, in request order.
///
/// Duplicate IDs are collapsed; hours default to a full day.
fn parse_assignments(
    employees: &[String],
    hours: &HashMap<String, Value>,
) -> Result<Vec<Assignment>, ValidationError> {
    if employees.len() > MAX_EMPLOYEES_PER_PARTE {
        return Err(ValidationError::TooManyEmployees {
            actual: employees.len(),
            max: MAX_EMPLOYEES_PER_PARTE,
        });
    }

    let mut seen = HashSet::new();
    let mut assignments = Vec::with_capacity(employees.len());
    for raw in employees {
        let raw = clean_text(raw, MAX_NAME_LENGTH);
        let employee_id = RecordId::parse(&raw)?;
        if !seen.insert(employee_id.clone()) {
            continue;
        }
        let value = hours.get(raw.as_str()).unwrap_or(&Value::Null);
        assignments.push(Assignment {
            hours: hours_value(employee_id.as_str(), value)?,
            employee_id,
        });
    }
    Ok(assignments)
}
