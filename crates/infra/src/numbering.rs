//! Human-readable document numbers.
//!
//! Orders and invoices count per branch per day (`ORD-20261018-0001`); customer
//! codes count per branch for its lifetime (`CUST-00001`).

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};

use tracker_core::BranchId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum Series {
    Order,
    Invoice,
}

impl Series {
    fn prefix(self) -> &'static str {
        match self {
            Series::Order => "ORD",
            Series::Invoice => "INV",
        }
    }
}

#[derive(Debug, Default)]
pub struct DocumentNumbers {
    daily: Mutex<HashMap<(BranchId, Series, NaiveDate), u32>>,
    customers: Mutex<HashMap<BranchId, u32>>,
}

impl DocumentNumbers {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_daily(&self, branch_id: BranchId, series: Series, now: DateTime<Utc>) -> String {
        let day = now.date_naive();
        let mut daily = self.daily.lock().unwrap_or_else(PoisonError::into_inner);
        let n = daily.entry((branch_id, series, day)).or_insert(0);
        *n += 1;
        format!("{}-{}-{:04}", series.prefix(), day.format("%Y%m%d"), n)
    }

    pub fn next_order_number(&self, branch_id: BranchId, now: DateTime<Utc>) -> String {
        self.next_daily(branch_id, Series::Order, now)
    }

    pub fn next_invoice_number(&self, branch_id: BranchId, now: DateTime<Utc>) -> String {
        self.next_daily(branch_id, Series::Invoice, now)
    }

    pub fn next_customer_code(&self, branch_id: BranchId) -> String {
        let mut customers = self.customers.lock().unwrap_or_else(PoisonError::into_inner);
        let n = customers.entry(branch_id).or_insert(0);
        *n += 1;
        format!("CUST-{:05}", n)
    }
}
