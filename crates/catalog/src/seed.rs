//! Default reference data for a fresh installation.
//!
//! Every record is get-or-create by name, so seeding an already seeded catalog
//! only reports existing rows.

use crate::Catalog;
use crate::model::{CatalogId, InventoryItem, LabourCategory, LabourCode};

const SERVICE_TYPES: &[(&str, u32)] = &[
    ("Oil Change", 30),
    ("Brake Service", 45),
    ("Tire Rotation", 30),
    ("Engine Tune-up", 60),
    ("Transmission Service", 90),
    ("Battery Replacement", 20),
    ("Air Filter Change", 15),
    ("Wheel Alignment", 45),
    ("Suspension Repair", 75),
    ("Exhaust System Repair", 60),
    ("Radiator Flush", 45),
    ("AC Service", 60),
    ("Spark Plug Replacement", 30),
    ("Brake Pad Replacement", 25),
    ("Coolant Replacement", 30),
    ("Power Steering Fluid", 20),
    ("General Maintenance", 50),
];

const ADDONS: &[(&str, u32)] = &[
    ("Wheel Balancing", 20),
    ("Tire Installation", 30),
    ("Wheel Mounting", 25),
    ("Tire Repair", 15),
    ("Alignment Check", 20),
    ("Suspension Inspection", 30),
    ("Brake Fluid Replacement", 20),
    ("Engine Cleaning", 45),
    ("Cabin Air Filter", 15),
    ("Battery Testing", 10),
    ("Headlight Restoration", 20),
    ("Undercarriage Wash", 30),
    ("Transmission Fluid Flush", 45),
    ("Differential Service", 40),
    ("Engine Oil Top-up", 5),
    ("Windshield Treatment", 15),
];

const BRANDS: &[(&str, &str, &str)] = &[
    ("Michelin", "Premium tires for all vehicles", "https://www.michelin.com"),
    ("Bridgestone", "High-performance tires", "https://www.bridgestone.com"),
    ("Goodyear", "Quality tires for all seasons", "https://www.goodyear.com"),
    ("Pirelli", "Luxury and performance tires", "https://www.pirelli.com"),
    ("Dunlop", "Reliable tires for everyday use", "https://www.dunlop.com"),
    ("Continental", "German engineering tires", "https://www.continental.com"),
    ("Hankook", "Affordable quality tires", "https://www.hankook.com"),
    ("Yokohama", "Japanese precision tires", "https://www.yokohama.com"),
];

/// (name, brand, price cents, cost cents, quantity)
const STANDARD_ITEMS: &[(&str, &str, i64, i64, i64)] = &[
    ("Engine Air Filter", "Michelin", 45_00, 25_00, 20),
    ("Cabin Air Filter", "Bridgestone", 35_00, 18_00, 25),
    ("Brake Pad Set", "Continental", 85_00, 50_00, 15),
    ("Brake Fluid (1L)", "Goodyear", 28_00, 15_00, 30),
    ("Engine Oil (5L)", "Pirelli", 65_00, 38_00, 20),
    ("Transmission Fluid (1L)", "Dunlop", 52_00, 28_00, 15),
    ("Coolant (1L)", "Hankook", 32_00, 18_00, 25),
    ("Car Battery 12V", "Yokohama", 150_00, 85_00, 8),
    ("Spark Plug Set (4)", "Michelin", 48_00, 26_00, 12),
];

const TYRE_BRANDS: &[&str] = &["Michelin", "Bridgestone", "Goodyear", "Continental"];
const TYRE_TYPES: &[&str] = &["All Season", "Summer", "Winter", "Performance"];
const TYRE_SIZES: &[&str] = &[
    "185/65R15", "195/65R15", "205/55R16", "215/55R16", "225/45R17", "235/45R17", "245/40R18",
    "255/40R19", "265/70R16", "275/65R17",
];

const DELAY_REASONS: &[(&str, &[&str])] = &[
    ("Parts", &["Waiting for parts delivery", "Wrong part supplied"]),
    ("Customer", &["Awaiting customer approval", "Customer requested additional work"]),
    ("Technical", &["Additional damage found during inspection", "Diagnosis took longer than expected"]),
    ("Staffing", &["Technician unavailable"]),
    ("Equipment", &["Equipment breakdown"]),
];

/// (code, description, item, brand, quantity, tyre type, category)
type LabourSeed = (
    &'static str,
    &'static str,
    Option<&'static str>,
    Option<&'static str>,
    Option<u32>,
    Option<&'static str>,
    LabourCategory,
);

const LABOUR_CODES: &[LabourSeed] = &[
    ("LAB-ALN", "Four wheel alignment", None, None, None, None, LabourCategory::Labour),
    ("LAB-BRK", "Brake inspection and adjustment", None, None, None, None, LabourCategory::Labour),
    ("LAB-DIAG", "Computer diagnostics", None, None, None, None, LabourCategory::Labour),
    ("SVC-OIL", "Engine oil and filter change", Some("Engine Oil (5L)"), Some("Pirelli"), Some(1), None, LabourCategory::Service),
    ("SVC-BAT", "Battery replacement", Some("Car Battery 12V"), Some("Yokohama"), Some(1), None, LabourCategory::Service),
    ("TYR-FIT", "Tyre fitting and balancing", None, None, None, None, LabourCategory::TyreService),
    ("TYR-PUN", "Puncture repair", None, None, None, None, LabourCategory::TyreService),
    ("SAL-TYR", "Tyre sale", Some("Michelin All Season 185/65R15"), Some("Michelin"), Some(4), Some("New"), LabourCategory::Sales),
];

/// Created-vs-existing tallies for one seeding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub service_types_created: usize,
    pub addons_created: usize,
    pub brands_created: usize,
    pub standard_items_created: usize,
    pub tyres_created: usize,
    pub delay_reasons_created: usize,
    pub labour_codes_created: usize,
    pub existing: usize,
}

impl SeedReport {
    pub fn total_created(&self) -> usize {
        self.service_types_created
            + self.addons_created
            + self.brands_created
            + self.standard_items_created
            + self.tyres_created
            + self.delay_reasons_created
            + self.labour_codes_created
    }
}

pub fn seed(catalog: &mut Catalog) -> SeedReport {
    let mut report = SeedReport::default();

    for (name, minutes) in SERVICE_TYPES {
        if catalog.service_type_named(name).is_some() {
            report.existing += 1;
        } else {
            catalog.add_service_type(*name, *minutes);
            report.service_types_created += 1;
        }
    }

    for (name, minutes) in ADDONS {
        if catalog.addon_named(name).is_some() {
            report.existing += 1;
        } else {
            catalog.add_addon(*name, *minutes);
            report.addons_created += 1;
        }
    }

    for (name, description, website) in BRANDS {
        if catalog.brand_named(name).is_some() {
            report.existing += 1;
        } else {
            catalog.add_brand(*name, Some(description.to_string()), Some(website.to_string()));
            report.brands_created += 1;
        }
    }

    for (i, (name, brand, price, cost, quantity)) in STANDARD_ITEMS.iter().enumerate() {
        let brand_id = catalog.brand_named(brand).map(|b| b.id);
        if catalog.item_named(name, brand_id).is_some() {
            report.existing += 1;
            continue;
        }
        let prefix: String = name.chars().take(3).collect::<String>().to_uppercase();
        catalog.add_inventory_item(InventoryItem {
            id: CatalogId(0),
            name: name.to_string(),
            brand_id,
            description: Some(format!("{name} for automotive service")),
            quantity: *quantity,
            price: *price,
            cost_price: *cost,
            sku: Some(format!("SKU-{prefix}-{}", 1000 + i)),
            barcode: None,
            reorder_level: 5,
            location: Some(format!("Aisle {}, Shelf {}", i % 5 + 1, shelf(i))),
            is_active: true,
        });
        report.standard_items_created += 1;
    }

    for (b, brand) in TYRE_BRANDS.iter().enumerate() {
        let brand_id = catalog.brand_named(brand).map(|x| x.id);
        for (t, tyre_type) in TYRE_TYPES.iter().enumerate() {
            let n = b * TYRE_TYPES.len() + t;
            let size = TYRE_SIZES[(n * 3) % TYRE_SIZES.len()];
            let name = format!("{brand} {tyre_type} {size}");
            if catalog.item_named(&name, brand_id).is_some() {
                report.existing += 1;
                continue;
            }
            let price = 80_00 + ((n as i64 * 9_37) % 170_00);
            let prefix: String = brand.chars().take(3).collect::<String>().to_uppercase();
            catalog.add_inventory_item(InventoryItem {
                id: CatalogId(0),
                name,
                brand_id,
                description: Some(format!("{tyre_type} tire size {size} from {brand}")),
                quantity: 10 + (n as i64 * 7) % 41,
                price,
                cost_price: price * 60 / 100,
                sku: Some(format!("TIRE-{prefix}-{}", 10_000 + n)),
                barcode: Some(format!("{:013}", 4_006_000_000_000u64 + n as u64)),
                reorder_level: 5,
                location: Some(format!("Tire Rack {}, Section {}", n % 3 + 1, shelf(n % 3))),
                is_active: true,
            });
            report.tyres_created += 1;
        }
    }

    for (category, reasons) in DELAY_REASONS {
        let category_id = match catalog.delay_category_named(category) {
            Some(c) => c.id,
            None => catalog.add_delay_category(*category),
        };
        for reason in reasons.iter() {
            let exists = catalog
                .delay_reasons_by_category()
                .get(*category)
                .is_some_and(|rs| rs.iter().any(|r| r.reason_text == *reason));
            if exists {
                report.existing += 1;
            } else {
                catalog.add_delay_reason(category_id, *reason);
                report.delay_reasons_created += 1;
            }
        }
    }

    for (code, description, item, brand, quantity, tire_type, category) in LABOUR_CODES {
        if catalog.lookup_by_code(code).is_some() {
            report.existing += 1;
            continue;
        }
        catalog.add_labour_code(LabourCode {
            id: CatalogId(0),
            code: code.to_string(),
            description: description.to_string(),
            item_name: item.map(str::to_string),
            brand: brand.map(str::to_string),
            quantity: *quantity,
            tire_type: tire_type.map(str::to_string),
            category: *category,
            is_active: true,
        });
        report.labour_codes_created += 1;
    }

    report
}

fn shelf(i: usize) -> char {
    (b'A' + (i % 5) as u8) as char
}
