//! Pipeline tests: Command → EventStore → EventBus → OrderBoard.
//!
//! Verifies:
//! - a bus-fed board converges to the engine's synchronous board
//! - branch isolation holds end to end
//! - the workshop flow (start, edit details, complete with delay reason) persists

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{Duration as ChronoDuration, Utc};

    use tracker_catalog::{CatalogId, LabourCategory};
    use tracker_core::BranchId;
    use tracker_customers::walk_in_profile;
    use tracker_orders::{
        CompleteOrder, DetailChanges, DetailForm, LabourItem, OrderCommand, OrderId, OrderState, OrderStatus,
        OrderType, Priority, Progress, StartOrder, UpdateDetails, plan_detail_update,
    };

    use crate::catalog_store::CatalogStore;
    use crate::command_dispatcher::DispatchError;
    use crate::directory::CustomerDirectory;
    use crate::engine::InMemoryOrderEngine;
    use crate::numbering::DocumentNumbers;
    use crate::projections::OrderBoardProjection;
    use crate::read_model::InMemoryBranchStore;

    struct Workshop {
        engine: InMemoryOrderEngine,
        directory: CustomerDirectory,
        numbers: Arc<DocumentNumbers>,
        catalog: CatalogStore,
    }

    fn workshop() -> Workshop {
        let numbers = Arc::new(DocumentNumbers::new());
        Workshop {
            engine: InMemoryOrderEngine::in_memory(),
            directory: CustomerDirectory::new(numbers.clone()),
            numbers,
            catalog: CatalogStore::seeded(),
        }
    }

    fn start_walk_in(w: &Workshop, branch_id: BranchId, plate: &str, started_minutes_ago: i64) -> OrderState {
        let now = Utc::now();
        let (customer, _) = w
            .directory
            .create_or_get_customer(branch_id, &walk_in_profile(plate), now)
            .unwrap();
        let (vehicle, _) = w
            .directory
            .create_or_get_vehicle(branch_id, customer.id, plate, None, None)
            .unwrap();
        let minutes = w.catalog.read(|c| c.selection_minutes(&["Oil Change"]));

        w.engine
            .execute(OrderCommand::StartOrder(StartOrder {
                branch_id,
                order_id: OrderId::new(),
                order_number: w.numbers.next_order_number(branch_id, now),
                order_type: OrderType::Service,
                customer_id: customer.id,
                vehicle_id: Some(vehicle.id),
                description: format!("Order started for {plate}: Oil Change"),
                priority: Priority::Medium,
                estimated_duration: (minutes > 0).then_some(minutes),
                item: None,
                inquiry: None,
                occurred_at: now - ChronoDuration::minutes(started_minutes_ago),
            }))
            .unwrap()
    }

    #[test]
    fn bus_fed_board_converges_with_engine() {
        let w = workshop();
        let replica = Arc::new(OrderBoardProjection::new(Arc::new(InMemoryBranchStore::new())));
        let feeder = {
            let replica = replica.clone();
            let sub = w.engine.subscribe();
            std::thread::spawn(move || {
                while let Ok(env) = sub.recv_timeout(Duration::from_secs(2)) {
                    let _ = replica.apply_envelope(&env);
                }
            })
        };

        let b = BranchId::new();
        let order = start_walk_in(&w, b, "T100AAA", 0);

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while replica.get(b, &order.id).is_none() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(replica.get(b, &order.id), w.engine.get(b, &order.id));
        drop(w);
        let _ = feeder.join();
    }

    #[test]
    fn orders_do_not_leak_across_branches() {
        let w = workshop();
        let (b1, b2) = (BranchId::new(), BranchId::new());
        let order = start_walk_in(&w, b1, "T200BBB", 0);

        assert!(w.engine.get(b2, &order.id).is_none());
        assert!(w.engine.list(b2).is_empty());

        let cross = w.engine.execute(OrderCommand::UpdateDetails(UpdateDetails {
            branch_id: b2,
            order_id: order.id,
            changes: DetailChanges {
                estimated_duration: Some(5),
                ..Default::default()
            },
            occurred_at: Utc::now(),
        }));
        assert!(matches!(cross, Err(DispatchError::NotFound(_))));
        assert!(w.directory.find_vehicle_by_plate(b2, "T200BBB").is_none());
    }

    #[test]
    fn detail_edit_then_late_completion() {
        let w = workshop();
        let b = BranchId::new();
        let order = start_walk_in(&w, b, "T300CCC", 600);
        assert_eq!(order.estimated_duration, Some(30));

        let form = w.catalog.read(|c| {
            let oil = c
                .lookup_by_name("Engine Oil (5L)", Some(LabourCategory::Service))
                .cloned();
            DetailForm {
                order_type: Some(OrderType::Service),
                labour_code: oil.as_ref().map(|lc| LabourItem {
                    code: lc.code.clone(),
                    item_name: lc.item_name.clone(),
                    brand: lc.brand.clone(),
                    quantity: lc.quantity,
                    tire_type: lc.tire_type.clone(),
                }),
                labour_code_labels: oil.iter().map(|lc| lc.label()).collect(),
                services: vec!["Oil Change".into(), "Wheel Balancing".into()],
                estimated_duration: Some("75".into()),
                ..DetailForm::default()
            }
        });
        let changes = plan_detail_update(&order, &form);
        let edited = w
            .engine
            .execute(OrderCommand::UpdateDetails(UpdateDetails {
                branch_id: b,
                order_id: order.id,
                changes,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        assert_eq!(edited.estimated_duration, Some(75));
        assert_eq!(edited.item.as_ref().map(|i| i.item_name.as_str()), Some("Engine Oil (5L)"));
        assert!(edited.description.contains("Labour Codes: SVC-OIL"));

        w.engine
            .execute(OrderCommand::Progress(Progress {
                branch_id: b,
                order_id: order.id,
                occurred_at: order.started_at,
            }))
            .unwrap();

        let complete = |reason: Option<CatalogId>| {
            OrderCommand::CompleteOrder(CompleteOrder {
                branch_id: b,
                order_id: order.id,
                delay_reason: reason,
                comments: Some("Waited for parts".into()),
                completed_by: "amina".into(),
                enforce_delay_reason: true,
                overdue_after_minutes: 540,
                occurred_at: Utc::now(),
            })
        };

        let refused = w.engine.execute(complete(None));
        assert!(matches!(refused, Err(DispatchError::Validation(_))));

        let reason = w.catalog.read(|c| {
            c.delay_reasons_by_category()
                .values()
                .flatten()
                .map(|r| r.id)
                .next()
        });
        let done = w.engine.execute(complete(reason)).unwrap();
        assert_eq!(done.status, OrderStatus::Completed);
        assert!(done.exceeded_threshold);
        assert_eq!(done.overrun.map(|o| o.reason), Some("Waited for parts".to_string()));
        assert!(done.actual_duration.is_some_and(|d| d >= 600));
    }
}
