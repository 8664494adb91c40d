use tracker_core::BranchId;
use tracker_orders::{Invoice, InvoiceId, OrderId};

use crate::read_model::{BranchStore, InMemoryBranchStore};

/// Invoices captured alongside uploaded orders.
#[derive(Debug, Default)]
pub struct InvoiceRegistry {
    invoices: InMemoryBranchStore<InvoiceId, Invoice>,
}

impl InvoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, invoice: Invoice) -> Invoice {
        self.invoices.upsert(invoice.branch_id, invoice.id, invoice.clone());
        invoice
    }

    pub fn get(&self, branch_id: BranchId, id: &InvoiceId) -> Option<Invoice> {
        self.invoices.get(branch_id, id)
    }

    /// Oldest first.
    pub fn for_order(&self, branch_id: BranchId, order_id: &OrderId) -> Vec<Invoice> {
        let mut out: Vec<Invoice> = self
            .invoices
            .list(branch_id)
            .into_iter()
            .filter(|i| i.order_id == *order_id)
            .collect();
        out.sort_by_key(|i| i.created_at);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tracker_customers::CustomerId;

    #[test]
    fn invoices_are_listed_per_order_and_branch() {
        let registry = InvoiceRegistry::new();
        let b = BranchId::new();
        let order_id = OrderId::new();
        let inv = registry.record(Invoice::new(
            b,
            "INV-20261018-0001".into(),
            order_id,
            CustomerId::new(),
            None,
            (50_00, 9_00, 0),
            "clerk".into(),
            Utc::now(),
        ));

        assert_eq!(registry.for_order(b, &order_id), vec![inv.clone()]);
        assert!(registry.for_order(BranchId::new(), &order_id).is_empty());
        assert_eq!(registry.get(b, &inv.id).map(|i| i.total_amount), Some(59_00));
    }
}
