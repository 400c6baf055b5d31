//! List query engine shared by the patient, appointment and invoice lists.
//!
//! One pure pass per call: filter by search term and date range, stable sort
//! on a single field, then cut out the requested page. There is no index;
//! the whole collection is re-filtered every time.

mod lists;

pub use lists::*;

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::dates::{epoch_millis, parse_timestamp};

/// Comparable value of a record field.
///
/// A given field always yields the same variant, so comparing across
/// variants never happens in practice.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Text(String),
    Number(i64),
    /// Epoch milliseconds; unparseable dates are 0
    Date(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// A record type the list engine can filter and sort.
pub trait Queryable {
    /// Sortable fields of the record.
    type Field: Copy;

    /// Text matched by the search term.
    fn search_fields(&self) -> Vec<&str>;

    /// Date checked against the date range.
    fn range_date(&self) -> &str;

    fn sort_key(&self, field: Self::Field) -> SortKey;
}

/// Inclusive calendar-day range. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    fn start_instant(&self) -> Option<DateTime<Utc>> {
        self.start
            .and_then(|d| d.and_hms_milli_opt(0, 0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    fn end_instant(&self) -> Option<DateTime<Utc>> {
        self.end
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
            .map(|dt| dt.and_utc())
    }

    /// Whether a stored date falls in the range. Unparseable dates are
    /// outside any range that has a bound.
    pub fn contains(&self, value: &str) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(at) = parse_timestamp(value) else {
            return false;
        };
        if let Some(start) = self.start_instant() {
            if at < start {
                return false;
            }
        }
        if let Some(end) = self.end_instant() {
            if at > end {
                return false;
            }
        }
        true
    }
}

/// Parameters of one list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<F> {
    pub search_term: String,
    pub date_range: DateRange,
    pub sort: Option<(F, SortDirection)>,
    /// 1-based; 0 reads as 1
    pub page: usize,
    pub page_size: usize,
}

impl<F> ListQuery<F> {
    /// First page, no filter, insertion order.
    pub fn new(page_size: usize) -> Self {
        Self {
            search_term: String::new(),
            date_range: DateRange::default(),
            sort: None,
            page: 1,
            page_size,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    pub fn sort_by(mut self, field: F, direction: SortDirection) -> Self {
        self.sort = Some((field, direction));
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matches before pagination
    pub total_items: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Run a list query.
pub fn query<T>(records: &[T], params: &ListQuery<T::Field>) -> Page<T>
where
    T: Queryable + Clone,
{
    let mut matched = filter(records, &params.search_term, &params.date_range);

    if let Some((field, direction)) = params.sort {
        sort_stable(&mut matched, field, direction);
    }

    let page = params.page.max(1);
    let page_size = params.page_size;
    let total_items = matched.len();
    let total_pages = if page_size == 0 {
        0
    } else {
        total_items.div_ceil(page_size)
    };

    let start = (page - 1).saturating_mul(page_size);
    let items = matched
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    Page {
        items,
        total_items,
        total_pages,
        page,
        page_size,
    }
}

/// Records matching the search term and date range, in input order.
pub fn filter<'a, T: Queryable>(records: &'a [T], term: &str, range: &DateRange) -> Vec<&'a T> {
    let needle = term.trim().to_lowercase();
    records
        .iter()
        .filter(|r| matches_term(*r, &needle))
        .filter(|r| range.contains(r.range_date()))
        .collect()
}

fn matches_term<T: Queryable>(record: &T, needle: &str) -> bool {
    needle.is_empty()
        || record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

fn sort_stable<T: Queryable>(records: &mut Vec<&T>, field: T::Field, direction: SortDirection) {
    let mut keyed: Vec<(SortKey, &T)> = records.drain(..).map(|r| (r.sort_key(field), r)).collect();
    // slice::sort_by is stable, so equal keys keep their input order.
    keyed.sort_by(|(a, _), (b, _)| {
        let ord = a.cmp(b);
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    records.extend(keyed.into_iter().map(|(_, r)| r));
}

/// Compare two stored dates by epoch milliseconds.
pub fn compare_dates(a: &str, b: &str) -> Ordering {
    epoch_millis(a).cmp(&epoch_millis(b))
}
