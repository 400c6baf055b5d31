//! Dashboard totals and monthly trends.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::month_of;
use crate::models::{Appointment, Invoice, Patient};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Activity within one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
    /// Short month name ("Jan")
    pub label: String,
    pub new_patients: usize,
    pub appointments: usize,
    /// Paid invoice totals
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: usize,
    pub new_patients_this_month: usize,
    pub total_appointments: usize,
    pub appointments_this_month: usize,
    pub total_revenue: i64,
    pub revenue_this_month: i64,
    /// Oldest first, ending with the current month
    pub months: Vec<MonthBucket>,
}

/// The `(year, month)` that lies `back` months before the given one.
fn months_before(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Compute the dashboard as of `today`, with `months` trend buckets.
///
/// Patients are bucketed by `created_at`, appointments by visit date and
/// revenue by the invoice date of paid invoices.
pub fn dashboard(
    patients: &[Patient],
    appointments: &[Appointment],
    invoices: &[Invoice],
    today: NaiveDate,
    months: u32,
) -> DashboardStats {
    let patient_months: Vec<Option<(i32, u32)>> =
        patients.iter().map(|p| month_of(&p.created_at)).collect();
    let appointment_months: Vec<Option<(i32, u32)>> =
        appointments.iter().map(|a| month_of(&a.date)).collect();
    let paid: Vec<(Option<(i32, u32)>, i64)> = invoices
        .iter()
        .filter(|inv| inv.is_paid())
        .map(|inv| (month_of(&inv.date), inv.total_amount))
        .collect();

    let bucket = |key: (i32, u32)| MonthBucket {
        year: key.0,
        month: key.1,
        label: MONTH_LABELS[(key.1 - 1) as usize].to_string(),
        new_patients: patient_months.iter().filter(|m| **m == Some(key)).count(),
        appointments: appointment_months.iter().filter(|m| **m == Some(key)).count(),
        revenue: paid
            .iter()
            .filter(|(m, _)| *m == Some(key))
            .map(|(_, amount)| amount)
            .sum(),
    };

    let current = (today.year(), today.month());
    let this_month = bucket(current);
    let trend = (0..months)
        .rev()
        .map(|back| bucket(months_before(current.0, current.1, back)))
        .collect();

    DashboardStats {
        total_patients: patients.len(),
        new_patients_this_month: this_month.new_patients,
        total_appointments: appointments.len(),
        appointments_this_month: this_month.appointments,
        total_revenue: paid.iter().map(|(_, amount)| amount).sum(),
        revenue_this_month: this_month.revenue,
        months: trend,
    }
}
