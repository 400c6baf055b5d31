//! Operator performance report.

use std::collections::HashMap;

use serde::Serialize;

use super::month_of;
use crate::models::dates::epoch_millis;
use crate::models::{Appointment, Invoice, Operator};

/// Period and operators covered by a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFilter {
    pub year: i32,
    /// 1-12; `None` covers the whole year
    pub month: Option<u32>,
    /// Empty means every operator
    pub operator_ids: Vec<i64>,
}

impl ReportFilter {
    pub fn year(year: i32) -> Self {
        Self {
            year,
            month: None,
            operator_ids: Vec::new(),
        }
    }

    pub fn month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn operators(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.operator_ids = ids.into_iter().collect();
        self
    }

    pub fn in_period(&self, date: &str) -> bool {
        match month_of(date) {
            Some((year, month)) => year == self.year && self.month.map_or(true, |m| m == month),
            None => false,
        }
    }

    pub fn includes_operator(&self, id: i64) -> bool {
        self.operator_ids.is_empty() || self.operator_ids.contains(&id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorReportRow {
    pub operator_id: i64,
    pub operator_name: String,
    pub appointment_count: usize,
    /// Paid invoice totals
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorReport {
    /// Highest revenue first
    pub rows: Vec<OperatorReportRow>,
    pub total_appointments: usize,
    pub total_revenue: i64,
}

/// Accumulates rows keyed by operator, in first-seen order.
struct Rows {
    rows: Vec<OperatorReportRow>,
    index: HashMap<i64, usize>,
}

impl Rows {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn entry(&mut self, operator_id: i64, name: &str) -> &mut OperatorReportRow {
        let next = self.rows.len();
        let slot = *self.index.entry(operator_id).or_insert(next);
        if slot == next {
            self.rows.push(OperatorReportRow {
                operator_id,
                operator_name: name.to_string(),
                appointment_count: 0,
                revenue: 0,
            });
        }
        &mut self.rows[slot]
    }
}

/// Appointment counts and paid revenue per operator for a period.
///
/// Every selected operator gets a row even with no activity. Appointments
/// and invoices of operators no longer in the roster still get a row, under
/// the name recorded on them.
pub fn operator_performance(
    appointments: &[Appointment],
    invoices: &[Invoice],
    operators: &[Operator],
    filter: &ReportFilter,
) -> OperatorReport {
    let mut rows = Rows::new();
    for operator in operators.iter().filter(|op| filter.includes_operator(op.id)) {
        rows.entry(operator.id, &operator.name);
    }

    for appointment in appointments
        .iter()
        .filter(|a| filter.includes_operator(a.operator_id) && filter.in_period(&a.date))
    {
        rows.entry(appointment.operator_id, &appointment.operator_name)
            .appointment_count += 1;
    }

    for invoice in invoices.iter().filter(|inv| {
        inv.is_paid() && filter.includes_operator(inv.operator_id) && filter.in_period(&inv.date)
    }) {
        rows.entry(invoice.operator_id, &invoice.operator_name).revenue += invoice.total_amount;
    }

    let mut rows = rows.rows;
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));

    OperatorReport {
        total_appointments: rows.iter().map(|r| r.appointment_count).sum(),
        total_revenue: rows.iter().map(|r| r.revenue).sum(),
        rows,
    }
}

/// One operator's invoices in the period, every status, newest first.
pub fn operator_invoices<'a>(
    invoices: &'a [Invoice],
    operator_id: i64,
    filter: &ReportFilter,
) -> Vec<&'a Invoice> {
    let mut matched: Vec<&Invoice> = invoices
        .iter()
        .filter(|inv| inv.operator_id == operator_id && filter.in_period(&inv.date))
        .collect();
    matched.sort_by_key(|inv| std::cmp::Reverse(epoch_millis(&inv.date)));
    matched
}
