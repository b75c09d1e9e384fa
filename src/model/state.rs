//! Work-order lifecycle and hour bookkeeping rules.

use crate::types::ValidatedUrl;
use chrono::{NaiveDate, Utc};
use std::fmt;

/// Lifecycle position of a parte, derived from its free-text estado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkOrderState {
    Draft,
    Signed,
    DataSent,
    Sent,
    Other(String),
}

impl WorkOrderState {
    /// Case-insensitive classification of an estado value.
    pub fn parse(estado: &str) -> Self {
        let trimmed = estado.trim();
        match trimmed.to_lowercase().as_str() {
            "borrador" => Self::Draft,
            "firmado" => Self::Signed,
            "datos enviados" => Self::DataSent,
            "enviado" => Self::Sent,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Signed or submitted partes are frozen.
    pub fn is_editable(&self) -> bool {
        !matches!(self, Self::Signed | Self::DataSent | Self::Sent)
    }

    pub fn can_send_data(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl fmt::Display for WorkOrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "Borrador"),
            Self::Signed => write!(f, "Firmado"),
            Self::DataSent => write!(f, "Datos Enviados"),
            Self::Sent => write!(f, "Enviado"),
            Self::Other(value) => write!(f, "{}", value),
        }
    }
}

/// The hour columns a parte keeps per employee category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourCategory {
    FirstClass,
    SecondClass,
    Chargehand,
    Foreman,
    Other,
}

impl HourCategory {
    /// Maps an employee category ("Oficial 1ª", "Capataz", ...) to its column.
    pub fn classify(category: &str) -> Self {
        let lower = category.trim().to_lowercase();
        if lower.contains("encargado") {
            Self::Foreman
        } else if lower.contains("capataz") {
            Self::Chargehand
        } else if lower.contains("oficial") && lower.contains('1') {
            Self::FirstClass
        } else if lower.contains("oficial") && lower.contains('2') {
            Self::SecondClass
        } else {
            Self::Other
        }
    }
}

/// Total hours on a parte, split by category column.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HoursBreakdown {
    pub total: f64,
    pub first_class: f64,
    pub second_class: f64,
    pub chargehand: f64,
    pub foreman: f64,
}

impl HoursBreakdown {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        entries
            .into_iter()
            .fold(Self::default(), |mut acc, (category, hours)| {
                let hours = if hours.is_finite() { hours } else { 0.0 };
                acc.total += hours;
                match HourCategory::classify(category) {
                    HourCategory::FirstClass => acc.first_class += hours,
                    HourCategory::SecondClass => acc.second_class += hours,
                    HourCategory::Chargehand => acc.chargehand += hours,
                    HourCategory::Foreman => acc.foreman += hours,
                    HourCategory::Other => {}
                }
                acc
            })
    }
}

/// Parses the date part of a parte's fecha.
pub fn parse_work_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(super::date_part(value), "%Y-%m-%d").ok()
}

/// Title of a new parte: `Parte {obra} - dd/mm/yyyy`.
///
/// Falls back to today's date when `fecha` cannot be read.
pub fn work_order_name(site_name: &str, fecha: &str) -> String {
    let date = parse_work_date(fecha).unwrap_or_else(|| Utc::now().date_naive());
    format!("Parte {} - {}", site_name, date.format("%d/%m/%Y"))
}

/// Builds the signing link for a parte, if a signing service is configured.
pub fn signing_url(base: Option<&ValidatedUrl>, work_order_id: &str, site_name: &str) -> Option<String> {
    let base = base?;
    let mut url = base.as_url().clone();
    url.query_pairs_mut()
        .append_pair("parteId", work_order_id)
        .append_pair("obra", site_name);
    Some(url.to_string())
}

/// Filters applied to the parte listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WorkOrderFilter {
    /// Site name or site ID.
    pub site: Option<String>,
    pub date: Option<NaiveDate>,
}

impl WorkOrderFilter {
    pub fn is_empty(&self) -> bool {
        self.site.is_none() && self.date.is_none()
    }

    pub fn matches(&self, work_order: &super::WorkOrder) -> bool {
        let site_ok = match &self.site {
            None => true,
            Some(site) => {
                work_order.site_name == *site
                    || work_order
                        .site_id
                        .as_ref()
                        .is_some_and(|id| id.as_str() == site)
            }
        };
        let date_ok = match self.date {
            None => true,
            Some(date) => parse_work_date(&work_order.date) == Some(date),
        };
        site_ok && date_ok
    }

    /// Stable text form used in cache keys.
    pub fn cache_key(&self) -> String {
        format!(
            "site={}&date={}",
            self.site.as_deref().unwrap_or(""),
            self.date.map(|d| d.to_string()).unwrap_or_default()
        )
    }
}
