//! Line conventions for free-text order descriptions.
//!
//! Descriptions are `\n`-separated. Some lines are tagged with a prefix
//! (`Services:`, `Labour Codes:`...) and get replaced rather than duplicated
//! when the order is edited. Any rewrite drops blank lines.

use crate::model::{InquiryDetails, OrderType, SalesItem};

pub const LABOUR_CODE_PREFIXES: &[&str] = &["labour codes:"];
pub const SERVICE_PREFIXES: &[&str] = &["services:", "add-ons:", "tire services:"];

fn is_tagged(line: &str, prefixes: &[&str]) -> bool {
    let lowered = line.trim().to_lowercase();
    prefixes.iter().any(|p| lowered.starts_with(p))
}

/// Removes every line tagged with one of `prefixes`, appends `line`, and drops blanks.
pub fn replace_tagged_line(description: &str, prefixes: &[&str], line: &str) -> String {
    description
        .split('\n')
        .filter(|l| !is_tagged(l, prefixes))
        .chain(std::iter::once(line))
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Appends `line` on its own line (no separator when `description` is empty).
pub fn append_line(description: &str, line: &str) -> String {
    if description.is_empty() {
        line.to_string()
    } else {
        format!("{description}\n{line}")
    }
}

/// `labels` are already `CODE - description`.
pub fn labour_codes_line<S: AsRef<str>>(labels: &[S]) -> String {
    let joined: Vec<&str> = labels.iter().map(AsRef::as_ref).collect();
    format!("Labour Codes: {}", joined.join("; "))
}

/// Sales orders list fitting work as tire services.
pub fn services_line<S: AsRef<str>>(order_type: OrderType, services: &[S]) -> String {
    let joined: Vec<&str> = services.iter().map(AsRef::as_ref).collect();
    let label = if order_type == OrderType::Sales {
        "Tire Services"
    } else {
        "Services"
    };
    format!("{label}: {}", joined.join(", "))
}

/// `Item: NAME (BRAND) - Qty: N - Type: T`; tyre type `New` is implied and omitted.
pub fn sales_item_line(item: &SalesItem) -> String {
    let mut line = format!("Item: {}", item.item_name);
    if let Some(brand) = item.brand.as_deref().filter(|b| !b.is_empty()) {
        line.push_str(&format!(" ({brand})"));
    }
    if let Some(qty) = item.quantity {
        line.push_str(&format!(" - Qty: {qty}"));
    }
    if let Some(tt) = item.tire_type.as_deref().filter(|t| !t.is_empty() && *t != "New") {
        line.push_str(&format!(" - Type: {tt}"));
    }
    line
}

/// Summary used for orders opened from the start screen.
pub fn start_description<S: AsRef<str>>(plate: Option<&str>, services: &[S]) -> String {
    let mut desc = String::from("Order started");
    if let Some(plate) = plate.filter(|p| !p.is_empty()) {
        desc.push_str(&format!(" for {plate}"));
    }
    if !services.is_empty() {
        let joined: Vec<&str> = services.iter().map(AsRef::as_ref).collect();
        desc.push_str(&format!(": {}", joined.join(", ")));
    }
    desc
}

/// Block appended when a sales component is attached to a running order.
pub fn added_item_block(
    item_name: &str,
    brand: Option<&str>,
    quantity: Option<&str>,
    tire_type: Option<&str>,
) -> String {
    let mut block = format!("\n\nAdded Item (Sales):\n- Item: {item_name}");
    for (label, value) in [("Brand", brand), ("Qty", quantity), ("Type", tire_type)] {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            block.push_str(&format!("\n- {label}: {v}"));
        }
    }
    block
}

pub fn inquiry_block(inquiry: &InquiryDetails) -> String {
    let mut block = match inquiry.inquiry_type.as_deref().filter(|t| !t.is_empty()) {
        Some(t) => format!("Inquiry Type: {t}"),
        None => "Customer Inquiry".to_string(),
    };
    if let Some(q) = inquiry.questions.as_deref().filter(|q| !q.is_empty()) {
        block.push_str(&format!("\nQuestions: {q}"));
    }
    if let Some(c) = inquiry.contact_preference.as_deref().filter(|c| !c.is_empty()) {
        block.push_str(&format!("\nContact Preference: {c}"));
    }
    block
}

/// Non-blank lines, trimmed; used for invoice line items.
pub fn content_lines(description: &str) -> Vec<String> {
    description
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn services_replace_previous_service_and_addon_lines() {
        let desc = "Order started for T1\nServices: Oil Change\n\nAdd-ons: Wash\nNote";
        let out = replace_tagged_line(desc, SERVICE_PREFIXES, &services_line(OrderType::Service, &["Brake Service"]));
        assert_eq!(out, "Order started for T1\nNote\nServices: Brake Service");
    }

    #[test]
    fn sales_orders_get_tire_services() {
        let out = replace_tagged_line(
            "Tire services: Old",
            SERVICE_PREFIXES,
            &services_line(OrderType::Sales, &["Wheel Balancing", "Tire Installation"]),
        );
        assert_eq!(out, "Tire Services: Wheel Balancing, Tire Installation");
    }

    #[test]
    fn labour_codes_line_format() {
        let line = labour_codes_line(&["LAB-ALN - Four wheel alignment", "TYR-PUN - Puncture repair"]);
        assert_eq!(line, "Labour Codes: LAB-ALN - Four wheel alignment; TYR-PUN - Puncture repair");
        let out = replace_tagged_line("  labour codes: stale\nKeep", LABOUR_CODE_PREFIXES, &line);
        assert_eq!(out, format!("Keep\n{line}"));
    }

    #[test]
    fn sales_item_line_omits_missing_parts_and_new_type() {
        let mut item = SalesItem {
            item_name: "Primacy 4".into(),
            brand: Some("Michelin".into()),
            quantity: Some(4),
            tire_type: Some("New".into()),
        };
        assert_eq!(sales_item_line(&item), "Item: Primacy 4 (Michelin) - Qty: 4");
        item.tire_type = Some("Used".into());
        item.brand = None;
        assert_eq!(sales_item_line(&item), "Item: Primacy 4 - Qty: 4 - Type: Used");
    }

    #[test]
    fn start_description_variants() {
        let none: [&str; 0] = [];
        assert_eq!(start_description(None, &none), "Order started");
        assert_eq!(start_description(Some("T1"), &none), "Order started for T1");
        assert_eq!(
            start_description(Some("T1"), &["Oil Change", "AC Service"]),
            "Order started for T1: Oil Change, AC Service"
        );
    }

    #[test]
    fn added_item_block_lists_present_fields() {
        let block = added_item_block("Valve", None, Some("2"), Some(""));
        assert_eq!(block, "\n\nAdded Item (Sales):\n- Item: Valve\n- Qty: 2");
    }

    #[test]
    fn inquiry_block_defaults_title() {
        let inq = InquiryDetails {
            questions: Some("Price for 4 tyres?".into()),
            ..InquiryDetails::default()
        };
        assert_eq!(inquiry_block(&inq), "Customer Inquiry\nQuestions: Price for 4 tyres?");
    }

    proptest! {
        #[test]
        fn replaced_description_has_single_tag_and_no_blank_lines(
            lines in proptest::collection::vec("[ a-zA-Z:]{0,12}", 0..8),
            services in proptest::collection::vec("[a-zA-Z]{1,8}", 1..4),
        ) {
            let desc = lines.join("\n");
            let line = services_line(OrderType::Service, &services);
            let out = replace_tagged_line(&desc, SERVICE_PREFIXES, &line);

            let out_lines: Vec<&str> = out.split('\n').collect();
            prop_assert!(out_lines.iter().all(|l| !l.trim().is_empty()));
            prop_assert_eq!(out_lines.iter().filter(|l| is_tagged(l, SERVICE_PREFIXES)).count(), 1);
            prop_assert_eq!(*out_lines.last().unwrap(), line.as_str());

            let kept: Vec<&str> = lines
                .iter()
                .map(String::as_str)
                .filter(|l| !l.trim().is_empty() && !is_tagged(l, SERVICE_PREFIXES))
                .collect();
            prop_assert_eq!(&out_lines[..out_lines.len() - 1], kept.as_slice());
        }

        #[test]
        fn rewriting_twice_is_stable(
            lines in proptest::collection::vec("[ a-zA-Z:]{0,12}", 0..8),
        ) {
            let desc = lines.join("\n");
            let once = replace_tagged_line(&desc, LABOUR_CODE_PREFIXES, "Labour Codes: X - y");
            let twice = replace_tagged_line(&once, LABOUR_CODE_PREFIXES, "Labour Codes: X - y");
            prop_assert_eq!(once, twice);
        }
    }
}
