//! Sample records served in mock mode.

use crate::model::{Employee, HoursEntry, Site, StatusOption, StatusOptions, Supervisor, WorkOrder};
use crate::types::RecordId;

fn id(raw: &str) -> RecordId {
    // Fixture IDs are literals matching the record ID pattern.
    RecordId::parse(raw).unwrap_or_else(|_| RecordId::new_v4())
}

pub fn status_options() -> StatusOptions {
    let option = |name: &str, color: &str| StatusOption {
        name: name.to_string(),
        color: color.to_string(),
    };
    StatusOptions {
        kind: "status".to_string(),
        options: vec![
            option("Activo", "green"),
            option("En pausa", "yellow"),
            option("Baja", "red"),
            option("Finalizado", "blue"),
        ],
    }
}

pub fn sites() -> Vec<Site> {
    let site = |raw: &str, name: &str, province: &str, status: &str| Site {
        id: id(raw),
        name: name.to_string(),
        province: province.to_string(),
        status: status.to_string(),
        foreman_rate: 0.0,
        chargehand_rate: 0.0,
        first_class_rate: 0.0,
        second_class_rate: 0.0,
    };
    vec![
        site("obra-1", "Reforma Sede Central", "Madrid", "En curso"),
        site("obra-2", "Ampliación Planta Norte", "Barcelona", "Planificada"),
        site("obra-3", "Mantenimiento Sur", "Sevilla", "Finalizada"),
    ]
}

pub fn supervisors() -> Vec<Supervisor> {
    let supervisor = |raw: &str, name: &str, email: &str| Supervisor {
        id: id(raw),
        name: name.to_string(),
        email: email.to_string(),
    };
    vec![
        supervisor("jefe-1", "Luis Pérez", "luis.perez@example.com"),
        supervisor("jefe-2", "Marta Ruiz", "marta.ruiz@example.com"),
        supervisor("jefe-3", "Daniel Gómez", "daniel.gomez@example.com"),
    ]
}

struct EmployeeRow<'a> {
    id: &'a str,
    site: &'a str,
    name: &'a str,
    category: &'a str,
    province: &'a str,
    town: &'a str,
    phone: &'a str,
    dni: &'a str,
    status: &'a str,
    delegate: &'a str,
}

impl EmployeeRow<'_> {
    fn build(&self) -> Employee {
        Employee {
            id: id(self.id),
            name: self.name.to_string(),
            category: self.category.to_string(),
            province: self.province.to_string(),
            town: self.town.to_string(),
            phone: self.phone.to_string(),
            dni: self.dni.to_string(),
            status: self.status.to_string(),
            delegate: self.delegate.to_string(),
            site_id: Some(id(self.site)),
        }
    }
}

pub fn employees() -> Vec<Employee> {
    [
        EmployeeRow {
            id: "empleado-1",
            site: "obra-1",
            name: "Ana Gómez",
            category: "Oficial 1ª",
            province: "Madrid",
            town: "Madrid",
            phone: "600000001",
            dni: "12345678A",
            status: "Activo",
            delegate: "Delegado Centro",
        },
        EmployeeRow {
            id: "empleado-2",
            site: "obra-1",
            name: "Carlos Martín",
            category: "Peón especialista",
            province: "Madrid",
            town: "Getafe",
            phone: "600000002",
            dni: "23456789B",
            status: "Activo",
            delegate: "Delegado Centro",
        },
        EmployeeRow {
            id: "empleado-3",
            site: "obra-2",
            name: "Eva López",
            category: "Oficial 2ª",
            province: "Barcelona",
            town: "Sabadell",
            phone: "600000003",
            dni: "34567890C",
            status: "En pausa",
            delegate: "Delegado Cataluña",
        },
        EmployeeRow {
            id: "empleado-4",
            site: "obra-2",
            name: "Javier Sánchez",
            category: "Encargado",
            province: "Barcelona",
            town: "Terrassa",
            phone: "600000004",
            dni: "45678901D",
            status: "Activo",
            delegate: "Delegado Cataluña",
        },
        EmployeeRow {
            id: "empleado-5",
            site: "obra-3",
            name: "Lucía Fernández",
            category: "Capataz",
            province: "Sevilla",
            town: "Dos Hermanas",
            phone: "600000005",
            dni: "56789012E",
            status: "Baja",
            delegate: "Delegado Andalucía",
        },
    ]
    .iter()
    .map(EmployeeRow::build)
    .collect()
}

pub fn work_orders() -> Vec<WorkOrder> {
    vec![
        WorkOrder {
            id: id("parte-1"),
            name: "Parte Reforma Sede Central 10/03".to_string(),
            date: "2024-03-10T08:00:00.000Z".to_string(),
            last_edited: Some("2024-03-10T18:45:00.000Z".to_string()),
            status: "Borrador".to_string(),
            site_name: "Reforma Sede Central".to_string(),
            site_id: Some(id("obra-1")),
            supervisor_id: Some(id("jefe-1")),
            total_hours: 0.0,
            first_class_hours: 0.0,
            second_class_hours: 0.0,
            chargehand_hours: 0.0,
            foreman_hours: 0.0,
            total_amount: 0.0,
            pdf_url: String::new(),
            sent_to_client: false,
            notes: "Cableado planta 1".to_string(),
            signing_url: Some("https://mock.notion.local/firma/parte-1".to_string()),
        },
        WorkOrder {
            id: id("parte-2"),
            name: "Revisión maquinaria Planta Norte".to_string(),
            date: "2024-03-12T07:45:00.000Z".to_string(),
            last_edited: Some("2024-03-12T15:30:00.000Z".to_string()),
            status: "Firmado".to_string(),
            site_name: "Ampliación Planta Norte".to_string(),
            site_id: Some(id("obra-2")),
            supervisor_id: Some(id("jefe-2")),
            total_hours: 0.0,
            first_class_hours: 0.0,
            second_class_hours: 0.0,
            chargehand_hours: 0.0,
            foreman_hours: 0.0,
            total_amount: 0.0,
            pdf_url: String::new(),
            sent_to_client: true,
            notes: "Revisión preventiva completada".to_string(),
            signing_url: Some("https://mock.notion.local/firma/parte-2".to_string()),
        },
    ]
}

/// Hours rows paired with the parte they belong to.
pub fn hours_entries() -> Vec<(RecordId, HoursEntry)> {
    let entry = |raw: &str,
                 parte: &str,
                 employee: &str,
                 name: &str,
                 category: &str,
                 hours: f64,
                 date: &str,
                 description: &str| {
        (
            id(parte),
            HoursEntry {
                id: id(raw),
                employee_id: Some(id(employee)),
                employee_name: name.to_string(),
                category: category.to_string(),
                hours,
                date: date.to_string(),
                description: description.to_string(),
            },
        )
    };
    vec![
        entry(
            "detalle-1",
            "parte-1",
            "empleado-1",
            "Ana Gómez",
            "Oficial 1ª",
            8.0,
            "2024-03-10",
            "Cableado eléctrico planta 1",
        ),
        entry(
            "detalle-2",
            "parte-1",
            "empleado-2",
            "Carlos Martín",
            "Peón especialista",
            8.0,
            "2024-03-10",
            "Apoyo instalación bandejas",
        ),
        entry(
            "detalle-3",
            "parte-2",
            "empleado-3",
            "Eva López",
            "Oficial 2ª",
            6.0,
            "2024-03-12",
            "Verificación maquinaria",
        ),
        entry(
            "detalle-4",
            "parte-2",
            "empleado-4",
            "Javier Sánchez",
            "Encargado",
            6.0,
            "2024-03-12",
            "Coordinación de equipo",
        ),
    ]
}
