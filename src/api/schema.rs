// src/api/schema.rs
//! Where the records live in Notion: database IDs and column names, plus
//! the mapping from database rows to API records.

use super::properties::OptionKind;
use super::responses::NotionPage;
use crate::error::AppError;
use crate::model::{Employee, HoursEntry, Site, Supervisor, WorkOrder};
use crate::types::{RecordId, ValidatedUrl};

/// IDs of the five databases behind the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseIds {
    pub sites: String,
    pub supervisors: String,
    pub employees: String,
    pub work_orders: String,
    pub hours: String,
}

impl Default for DatabaseIds {
    fn default() -> Self {
        Self {
            sites: "20882593a257810083d6dc8ec0a99d58".to_string(),
            supervisors: "20882593a25781b4a3b9e0ff5589ea4e".to_string(),
            employees: "20882593a257814db882c4b70cb0cbab".to_string(),
            work_orders: "20882593a25781258595e15abb37e87a".to_string(),
            hours: "20882593a25781838da1fe6741abcfd9".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteColumns {
    pub name: &'static str,
    pub province: &'static str,
    pub status: &'static str,
    pub foreman_rate: &'static str,
    pub chargehand_rate: &'static str,
    pub first_class_rate: &'static str,
    pub second_class_rate: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorColumns {
    pub name: &'static str,
    pub email: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeColumns {
    pub name: &'static str,
    pub category: &'static str,
    pub province: &'static str,
    pub town: &'static str,
    pub phone: &'static str,
    pub dni: &'static str,
    pub status: &'static str,
    pub delegate: &'static str,
    pub sites: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkOrderColumns {
    pub name: &'static str,
    pub date: &'static str,
    pub status: &'static str,
    pub site_name: &'static str,
    pub site: &'static str,
    pub supervisor: &'static str,
    pub total_hours: &'static str,
    pub first_class_hours: &'static str,
    pub second_class_hours: &'static str,
    pub chargehand_hours: &'static str,
    pub foreman_hours: &'static str,
    pub total_amount: &'static str,
    pub pdf_url: &'static str,
    pub sent_to_client: &'static str,
    pub notes: &'static str,
    pub signing: &'static str,
    pub send_data: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoursColumns {
    pub description: &'static str,
    pub work_order: &'static str,
    pub employee: &'static str,
    pub hours: &'static str,
    pub date: &'static str,
    pub category: &'static str,
}

/// Database IDs and column names, with the production workspace's
/// column names as defaults. Several of them carry stray spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionSchema {
    pub databases: DatabaseIds,
    pub sites: SiteColumns,
    pub supervisors: SupervisorColumns,
    pub employees: EmployeeColumns,
    pub work_orders: WorkOrderColumns,
    pub hours: HoursColumns,
    /// Property type of the parte estado column.
    pub work_order_status_kind: OptionKind,
}

impl Default for NotionSchema {
    fn default() -> Self {
        Self::with_databases(DatabaseIds::default())
    }
}

impl NotionSchema {
    pub fn with_databases(databases: DatabaseIds) -> Self {
        Self {
            databases,
            sites: SiteColumns {
                name: "Obra",
                province: "Provincia",
                status: "Estado",
                foreman_rate: "Precio Encargado",
                chargehand_rate: "Precio Capataz",
                first_class_rate: "Precio Oficial 1ª",
                second_class_rate: "Precio Oficial 2ª",
            },
            supervisors: SupervisorColumns {
                name: "Persona Autorizada",
                email: " Email",
            },
            employees: EmployeeColumns {
                name: "Nombre Completo",
                category: "Categoría",
                province: "Provincia",
                town: "Localidad",
                phone: "Teléfono",
                dni: "DNI",
                status: "Estado",
                delegate: "Delegado",
                sites: "Obras",
            },
            work_orders: WorkOrderColumns {
                name: "Nombre",
                date: "Fecha",
                status: "Estado",
                site_name: "AUX Obra",
                site: "Obras",
                supervisor: "Persona Autorizada",
                total_hours: "RP Horas Totales",
                first_class_hours: "Horas Oficial 1ª",
                second_class_hours: "Horas Oficial 2ª ",
                chargehand_hours: "Horas Capataz",
                foreman_hours: "Horas Encargado ",
                total_amount: "Importe total",
                pdf_url: "URL PDF",
                sent_to_client: "Enviado a cliente",
                notes: "Notas",
                signing: "Firmar",
                send_data: crate::constants::SEND_DATA_PROPERTY,
            },
            hours: HoursColumns {
                description: "Detalle",
                work_order: "Parte de trabajo",
                employee: "Empleados",
                hours: "Horas",
                date: "Fecha",
                category: "Categoría",
            },
            work_order_status_kind: OptionKind::Status,
        }
    }

    pub fn site(&self, page: &NotionPage) -> Result<Site, AppError> {
        let p = page.reader();
        let c = &self.sites;
        Ok(Site {
            id: page_id(page)?,
            name: p.text(c.name),
            province: p.text(c.province),
            status: p.text(c.status),
            foreman_rate: p.number(c.foreman_rate),
            chargehand_rate: p.number(c.chargehand_rate),
            first_class_rate: p.number(c.first_class_rate),
            second_class_rate: p.number(c.second_class_rate),
        })
    }

    pub fn supervisor(&self, page: &NotionPage) -> Result<Supervisor, AppError> {
        let p = page.reader();
        Ok(Supervisor {
            id: page_id(page)?,
            name: p.text(self.supervisors.name),
            email: p.text(self.supervisors.email),
        })
    }

    pub fn employee(&self, page: &NotionPage) -> Result<Employee, AppError> {
        let p = page.reader();
        let c = &self.employees;
        Ok(Employee {
            id: page_id(page)?,
            name: p.text(c.name),
            category: p.text(c.category),
            province: p.text(c.province),
            town: p.text(c.town),
            phone: p.text(c.phone),
            dni: p.text(c.dni),
            status: p.text(c.status),
            delegate: p.text(c.delegate),
            site_id: relation_id(p.first_relation(c.sites)),
        })
    }

    /// Flattens a parte row. Without a signing link stored in Notion, one
    /// is built from `signing_base`.
    pub fn work_order(
        &self,
        page: &NotionPage,
        signing_base: Option<&ValidatedUrl>,
    ) -> Result<WorkOrder, AppError> {
        let p = page.reader();
        let c = &self.work_orders;
        let id = page_id(page)?;
        let site_name = p.text(c.site_name);

        let stored_link = p.text(c.signing);
        let signing_url = if stored_link.starts_with("http") {
            Some(stored_link)
        } else {
            crate::model::signing_url(signing_base, id.as_str(), &site_name)
        };

        Ok(WorkOrder {
            name: p.text(c.name),
            date: p.text(c.date),
            last_edited: page.last_edited_time.clone(),
            status: p.text(c.status),
            site_id: relation_id(p.first_relation(c.site)),
            supervisor_id: relation_id(p.first_relation(c.supervisor)),
            total_hours: p.number(c.total_hours),
            first_class_hours: p.number(c.first_class_hours),
            second_class_hours: p.number(c.second_class_hours),
            chargehand_hours: p.number(c.chargehand_hours),
            foreman_hours: p.number(c.foreman_hours),
            total_amount: p.number(c.total_amount),
            pdf_url: p.text(c.pdf_url),
            sent_to_client: p.bool(c.sent_to_client),
            notes: p.text(c.notes),
            signing_url,
            site_name,
            id,
        })
    }

    /// Flattens an hours row. Name and category come from the employee
    /// when the row itself lacks them.
    pub fn hours_entry(
        &self,
        page: &NotionPage,
        employees: &[Employee],
    ) -> Result<HoursEntry, AppError> {
        let p = page.reader();
        let c = &self.hours;
        let employee_id = relation_id(p.first_relation(c.employee));
        let employee = employee_id
            .as_ref()
            .and_then(|id| employees.iter().find(|e| e.id.same_object(id)));

        let mut category = p.text(c.category);
        if category.is_empty() {
            category = employee.map(|e| e.category.clone()).unwrap_or_default();
        }

        Ok(HoursEntry {
            id: page_id(page)?,
            employee_name: employee.map(|e| e.name.clone()).unwrap_or_default(),
            employee_id,
            category,
            hours: p.number(c.hours),
            date: p.text(c.date),
            description: p.text(c.description),
        })
    }
}

fn page_id(page: &NotionPage) -> Result<RecordId, AppError> {
    RecordId::parse(&page.id)
        .map_err(|_| AppError::MalformedResponse(format!("Invalid page id: {}", page.id)))
}

fn relation_id(id: Option<String>) -> Option<RecordId> {
    id.and_then(|id| RecordId::parse(&id).ok())
}
