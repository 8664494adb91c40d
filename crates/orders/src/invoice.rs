use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tracker_core::{BranchId, DomainError, DomainResult, Entity};
use tracker_customers::{CustomerId, VehicleId};

use crate::model::OrderId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(Uuid);

impl InvoiceId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for InvoiceId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: u32,
    /// Cents.
    pub unit_price: i64,
}

/// Invoice captured from an uploaded document. Amounts in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub branch_id: BranchId,
    pub invoice_number: String,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub vehicle_id: Option<VehicleId>,
    pub invoice_date: NaiveDate,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub lines: Vec<InvoiceLine>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// A zero `total` means "not on the document" and is derived from subtotal + tax.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        branch_id: BranchId,
        invoice_number: String,
        order_id: OrderId,
        customer_id: CustomerId,
        vehicle_id: Option<VehicleId>,
        amounts: (i64, i64, i64),
        created_by: String,
        now: DateTime<Utc>,
    ) -> Self {
        let (subtotal, tax_amount, total) = amounts;
        Self {
            id: InvoiceId::new(),
            branch_id,
            invoice_number,
            order_id,
            customer_id,
            vehicle_id,
            invoice_date: now.date_naive(),
            subtotal,
            tax_amount,
            total_amount: if total == 0 { subtotal + tax_amount } else { total },
            lines: Vec::new(),
            created_by,
            created_at: now,
        }
    }

    /// One zero-priced line per non-blank description line.
    pub fn with_description_lines(mut self, description: &str) -> Self {
        self.lines = crate::description::content_lines(description)
            .into_iter()
            .map(|description| InvoiceLine {
                description,
                quantity: 1,
                unit_price: 0,
            })
            .collect();
        self
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Parses a document amount such as `"1,234.50"` into cents.
///
/// Thousands separators are ignored; at most two decimals; blank means zero.
pub fn parse_amount(raw: &str) -> DomainResult<i64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(0);
    }

    let invalid = || DomainError::validation(format!("invalid amount '{}'", raw.trim()));

    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if frac.len() > 2
        || (whole.is_empty() && frac.is_empty())
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };
    let value = whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(invalid)?;

    Ok(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document_amounts() {
        assert_eq!(parse_amount("1,234.50").unwrap(), 123_450);
        assert_eq!(parse_amount("18").unwrap(), 1_800);
        assert_eq!(parse_amount("0.5").unwrap(), 50);
        assert_eq!(parse_amount(".75").unwrap(), 75);
        assert_eq!(parse_amount("  ").unwrap(), 0);
        assert_eq!(parse_amount("-3.10").unwrap(), -310);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_amount("12.345").is_err());
        assert!(parse_amount("1O0").is_err());
        assert!(parse_amount(".").is_err());
    }

    #[test]
    fn total_defaults_to_subtotal_plus_tax() {
        let now = Utc::now();
        let inv = Invoice::new(
            BranchId::new(),
            "INV-20261018-0001".into(),
            OrderId::new(),
            CustomerId::new(),
            None,
            (100_00, 18_00, 0),
            "clerk".into(),
            now,
        )
        .with_description_lines("Brake pads\n\n  Labour  ");

        assert_eq!(inv.total_amount, 118_00);
        assert_eq!(inv.lines.len(), 2);
        assert_eq!(inv.lines[1].description, "Labour");
    }
}
