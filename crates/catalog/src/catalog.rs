use std::collections::BTreeMap;

use tracker_core::{DomainError, DomainResult};

use crate::model::{
    Brand, CatalogId, DelayReason, DelayReasonCategory, InventoryItem, LabourCategory, LabourCode,
    ServiceAddon, ServiceType,
};

const UNBRANDED: &str = "Unbranded";

/// In-memory reference data.
///
/// Lookups by name are case-insensitive and only ever return active records,
/// except [`Catalog::inventory_item`] which the detail form resolves by id
/// regardless of the active flag.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    service_types: Vec<ServiceType>,
    addons: Vec<ServiceAddon>,
    brands: Vec<Brand>,
    items: Vec<InventoryItem>,
    labour_codes: Vec<LabourCode>,
    delay_categories: Vec<DelayReasonCategory>,
    delay_reasons: Vec<DelayReason>,
}

fn next_id(len: usize) -> CatalogId {
    CatalogId(len as u64 + 1)
}

fn eq_ci(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    // ── registration ─────────────────────────────────────────────────────────

    pub fn add_service_type(&mut self, name: impl Into<String>, estimated_minutes: u32) -> CatalogId {
        let id = next_id(self.service_types.len());
        self.service_types.push(ServiceType {
            id,
            name: name.into(),
            estimated_minutes,
            is_active: true,
        });
        id
    }

    pub fn add_addon(&mut self, name: impl Into<String>, estimated_minutes: u32) -> CatalogId {
        let id = next_id(self.addons.len());
        self.addons.push(ServiceAddon {
            id,
            name: name.into(),
            estimated_minutes,
            is_active: true,
        });
        id
    }

    pub fn add_brand(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
        website: Option<String>,
    ) -> CatalogId {
        let id = next_id(self.brands.len());
        self.brands.push(Brand {
            id,
            name: name.into(),
            description,
            website,
            is_active: true,
        });
        id
    }

    /// Stores `item` under a freshly allocated id (the incoming id is ignored).
    pub fn add_inventory_item(&mut self, mut item: InventoryItem) -> CatalogId {
        item.id = next_id(self.items.len());
        let id = item.id;
        self.items.push(item);
        id
    }

    pub fn add_labour_code(&mut self, mut code: LabourCode) -> CatalogId {
        code.id = next_id(self.labour_codes.len());
        let id = code.id;
        self.labour_codes.push(code);
        id
    }

    pub fn add_delay_category(&mut self, category: impl Into<String>) -> CatalogId {
        let id = next_id(self.delay_categories.len());
        self.delay_categories.push(DelayReasonCategory {
            id,
            category: category.into(),
            is_active: true,
        });
        id
    }

    pub fn add_delay_reason(&mut self, category_id: CatalogId, reason_text: impl Into<String>) -> CatalogId {
        let id = next_id(self.delay_reasons.len());
        self.delay_reasons.push(DelayReason {
            id,
            category_id,
            reason_text: reason_text.into(),
            is_active: true,
        });
        id
    }

    pub fn set_service_type_active(&mut self, id: CatalogId, active: bool) -> DomainResult<()> {
        let svc = self
            .service_types
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| DomainError::not_found("service type"))?;
        svc.is_active = active;
        Ok(())
    }

    pub fn set_labour_code_active(&mut self, id: CatalogId, active: bool) -> DomainResult<()> {
        let lc = self
            .labour_codes
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| DomainError::not_found("labour code"))?;
        lc.is_active = active;
        Ok(())
    }

    // ── name lookups used by the seeder ──────────────────────────────────────

    pub fn service_type_named(&self, name: &str) -> Option<&ServiceType> {
        self.service_types.iter().find(|s| eq_ci(&s.name, name))
    }

    pub fn addon_named(&self, name: &str) -> Option<&ServiceAddon> {
        self.addons.iter().find(|a| eq_ci(&a.name, name))
    }

    pub fn brand_named(&self, name: &str) -> Option<&Brand> {
        self.brands.iter().find(|b| eq_ci(&b.name, name))
    }

    pub fn item_named(&self, name: &str, brand_id: Option<CatalogId>) -> Option<&InventoryItem> {
        self.items
            .iter()
            .find(|i| eq_ci(&i.name, name) && i.brand_id == brand_id)
    }

    pub fn delay_category_named(&self, category: &str) -> Option<&DelayReasonCategory> {
        self.delay_categories.iter().find(|c| eq_ci(&c.category, category))
    }

    // ── listings ─────────────────────────────────────────────────────────────

    pub fn active_service_types(&self) -> Vec<&ServiceType> {
        let mut out: Vec<_> = self.service_types.iter().filter(|s| s.is_active).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    pub fn active_addons(&self) -> Vec<&ServiceAddon> {
        let mut out: Vec<_> = self.addons.iter().filter(|a| a.is_active).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Active items ordered by (brand name, item name); brandless items sort as `Unbranded`.
    pub fn active_inventory(&self) -> Vec<&InventoryItem> {
        let mut out: Vec<_> = self.items.iter().filter(|i| i.is_active).collect();
        out.sort_by(|a, b| {
            self.brand_name(a)
                .cmp(self.brand_name(b))
                .then_with(|| a.name.cmp(&b.name))
        });
        out
    }

    pub fn active_labour_codes(&self) -> Vec<&LabourCode> {
        let mut out: Vec<_> = self.labour_codes.iter().filter(|l| l.is_active).collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        out
    }

    // ── durations ────────────────────────────────────────────────────────────

    /// Sum of the estimated minutes of active service types whose name is in `names`.
    pub fn service_minutes<S: AsRef<str>>(&self, names: &[S]) -> u32 {
        self.service_types
            .iter()
            .filter(|s| s.is_active && names.iter().any(|n| n.as_ref() == s.name))
            .map(|s| s.estimated_minutes)
            .sum()
    }

    pub fn addon_minutes<S: AsRef<str>>(&self, names: &[S]) -> u32 {
        self.addons
            .iter()
            .filter(|a| a.is_active && names.iter().any(|n| n.as_ref() == a.name))
            .map(|a| a.estimated_minutes)
            .sum()
    }

    /// A start-order selection may mix service types and add-ons.
    pub fn selection_minutes<S: AsRef<str>>(&self, names: &[S]) -> u32 {
        self.service_minutes(names) + self.addon_minutes(names)
    }

    // ── labour codes ─────────────────────────────────────────────────────────

    pub fn labour_code(&self, id: CatalogId) -> Option<&LabourCode> {
        self.labour_codes.iter().find(|l| l.id == id && l.is_active)
    }

    pub fn lookup_by_code(&self, code: &str) -> Option<&LabourCode> {
        self.labour_codes
            .iter()
            .find(|l| l.is_active && eq_ci(&l.code, code))
    }

    pub fn lookup_by_name(&self, item_name: &str, category: Option<LabourCategory>) -> Option<&LabourCode> {
        self.labour_codes.iter().find(|l| {
            l.is_active
                && l.item_name.as_deref().is_some_and(|n| eq_ci(n, item_name))
                && category.is_none_or(|c| l.category == c)
        })
    }

    /// Case-insensitive substring match over description and item name, ordered by code.
    pub fn search_by_description(
        &self,
        text: &str,
        category: Option<LabourCategory>,
        limit: usize,
    ) -> Vec<&LabourCode> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.active_labour_codes()
            .into_iter()
            .filter(|l| category.is_none_or(|c| l.category == c))
            .filter(|l| {
                l.description.to_lowercase().contains(&needle)
                    || l
                        .item_name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .take(limit)
            .collect()
    }

    // ── inventory ────────────────────────────────────────────────────────────

    pub fn inventory_item(&self, id: CatalogId) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn brand_name(&self, item: &InventoryItem) -> &str {
        item.brand_id
            .and_then(|id| self.brands.iter().find(|b| b.id == id))
            .map(|b| b.name.as_str())
            .unwrap_or(UNBRANDED)
    }

    /// Moves stock of the active item matching `(item_name, brand_name)` by `delta`
    /// and returns the remaining quantity.
    pub fn adjust_inventory(&mut self, item_name: &str, brand_name: &str, delta: i64) -> DomainResult<i64> {
        let brand_id = self.brand_named(brand_name).map(|b| b.id);
        let item = self
            .items
            .iter_mut()
            .find(|i| {
                i.is_active
                    && eq_ci(&i.name, item_name)
                    && match brand_id {
                        Some(id) => i.brand_id == Some(id),
                        None => i.brand_id.is_none() && eq_ci(brand_name, UNBRANDED),
                    }
            })
            .ok_or_else(|| DomainError::not_found(format!("inventory item '{item_name}' ({brand_name})")))?;

        let remaining = item.quantity + delta;
        if remaining < 0 {
            return Err(DomainError::validation(format!(
                "insufficient stock for '{}': {} available, {} requested",
                item.name,
                item.quantity,
                -delta
            )));
        }
        item.quantity = remaining;
        Ok(remaining)
    }

    // ── delay reasons ────────────────────────────────────────────────────────

    /// Active reasons grouped under their (active) category name.
    pub fn delay_reasons_by_category(&self) -> BTreeMap<String, Vec<&DelayReason>> {
        let mut out = BTreeMap::new();
        for cat in self.delay_categories.iter().filter(|c| c.is_active) {
            let reasons: Vec<_> = self
                .delay_reasons
                .iter()
                .filter(|r| r.is_active && r.category_id == cat.id)
                .collect();
            out.insert(cat.category.clone(), reasons);
        }
        out
    }

    pub fn delay_reason(&self, id: CatalogId) -> Option<&DelayReason> {
        self.delay_reasons.iter().find(|r| r.id == id)
    }

    pub fn counts(&self) -> CatalogCounts {
        CatalogCounts {
            service_types: self.service_types.len(),
            addons: self.addons.len(),
            brands: self.brands.len(),
            inventory_items: self.items.len(),
            labour_codes: self.labour_codes.len(),
            delay_reasons: self.delay_reasons.len(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct CatalogCounts {
    pub service_types: usize,
    pub addons: usize,
    pub brands: usize,
    pub inventory_items: usize,
    pub labour_codes: usize,
    pub delay_reasons: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, brand_id: Option<CatalogId>, quantity: i64) -> InventoryItem {
        InventoryItem {
            id: CatalogId(0),
            name: name.to_string(),
            brand_id,
            description: None,
            quantity,
            price: 10_00,
            cost_price: 5_00,
            sku: None,
            barcode: None,
            reorder_level: 5,
            location: None,
            is_active: true,
        }
    }

    fn code(code: &str, description: &str, item_name: Option<&str>, category: LabourCategory) -> LabourCode {
        LabourCode {
            id: CatalogId(0),
            code: code.to_string(),
            description: description.to_string(),
            item_name: item_name.map(str::to_string),
            brand: None,
            quantity: None,
            tire_type: None,
            category,
            is_active: true,
        }
    }

    #[test]
    fn selection_minutes_sums_services_and_addons_but_skips_inactive() {
        let mut c = Catalog::new();
        c.add_service_type("Oil Change", 30);
        let brakes = c.add_service_type("Brake Service", 45);
        c.add_addon("Wheel Balancing", 20);
        c.set_service_type_active(brakes, false).unwrap();

        let picked = ["Oil Change", "Brake Service", "Wheel Balancing", "Nope"];
        assert_eq!(c.service_minutes(&picked), 30);
        assert_eq!(c.addon_minutes(&picked), 20);
        assert_eq!(c.selection_minutes(&picked), 50);
    }

    #[test]
    fn inventory_listing_orders_by_brand_then_name() {
        let mut c = Catalog::new();
        let zeta = c.add_brand("Zeta", None, None);
        let acme = c.add_brand("Acme", None, None);
        c.add_inventory_item(item("Wiper", Some(zeta), 1));
        c.add_inventory_item(item("Filter", Some(acme), 1));
        c.add_inventory_item(item("Bolt", None, 1));

        let names: Vec<_> = c.active_inventory().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Filter", "Bolt", "Wiper"]);
    }

    #[test]
    fn adjust_inventory_rejects_negative_stock() {
        let mut c = Catalog::new();
        let b = c.add_brand("Michelin", None, None);
        c.add_inventory_item(item("Primacy 4", Some(b), 3));

        assert_eq!(c.adjust_inventory("primacy 4", "MICHELIN", -2).unwrap(), 1);
        let err = c.adjust_inventory("Primacy 4", "Michelin", -2).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(c.adjust_inventory("Primacy 4", "Pirelli", -1).is_err());
    }

    #[test]
    fn unbranded_items_adjust_by_the_unbranded_label() {
        let mut c = Catalog::new();
        c.add_inventory_item(item("Valve", None, 4));
        assert_eq!(c.adjust_inventory("Valve", "Unbranded", -4).unwrap(), 0);
    }

    #[test]
    fn labour_code_lookups() {
        let mut c = Catalog::new();
        let id = c.add_labour_code(code("LAB-01", "Wheel alignment", None, LabourCategory::Labour));
        c.add_labour_code(code("TYR-01", "Fit new tyre", Some("Tyre 205/55R16"), LabourCategory::TyreService));
        let retired = c.add_labour_code(code("TYR-02", "Fit tyre (old)", Some("Old Tyre"), LabourCategory::TyreService));
        c.set_labour_code_active(retired, false).unwrap();

        assert_eq!(c.labour_code(id).unwrap().code, "LAB-01");
        assert!(c.labour_code(retired).is_none());
        assert_eq!(c.lookup_by_code("lab-01").unwrap().id, id);
        assert!(c.lookup_by_name("tyre 205/55r16", Some(LabourCategory::TyreService)).is_some());
        assert!(c.lookup_by_name("tyre 205/55r16", Some(LabourCategory::Sales)).is_none());

        let hits = c.search_by_description("TYRE", None, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "TYR-01");
        assert!(c.search_by_description("  ", None, 10).is_empty());
    }

    #[test]
    fn delay_reasons_grouped_by_active_category() {
        let mut c = Catalog::new();
        let parts = c.add_delay_category("Parts");
        let r = c.add_delay_reason(parts, "Waiting for parts");
        c.add_delay_category("Empty");

        let grouped = c.delay_reasons_by_category();
        assert_eq!(grouped["Parts"].len(), 1);
        assert!(grouped["Empty"].is_empty());
        assert_eq!(c.delay_reason(r).unwrap().reason_text, "Waiting for parts");
    }
}
