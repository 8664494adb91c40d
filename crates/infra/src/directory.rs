//! Branch-scoped customers and vehicles.
//!
//! Plain current-state records (no event streams). Get-or-create operations are
//! serialized so two counters typing the same walk-in cannot create duplicates.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::info;

use tracker_core::{BranchId, DomainError, DomainResult};
use tracker_customers::{Customer, CustomerId, CustomerProfile, Vehicle, VehicleId, normalize_plate};

use crate::numbering::DocumentNumbers;
use crate::read_model::{BranchStore, InMemoryBranchStore};

/// Fields of a vehicle edit; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleUpdate {
    pub make: Option<String>,
    pub model: Option<String>,
    pub vehicle_type: Option<String>,
}

#[derive(Debug)]
pub struct CustomerDirectory {
    customers: InMemoryBranchStore<CustomerId, Customer>,
    vehicles: InMemoryBranchStore<VehicleId, Vehicle>,
    numbers: Arc<DocumentNumbers>,
    write_lock: Mutex<()>,
}

fn filled(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CustomerDirectory {
    pub fn new(numbers: Arc<DocumentNumbers>) -> Self {
        Self {
            customers: InMemoryBranchStore::new(),
            vehicles: InMemoryBranchStore::new(),
            numbers,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the matching customer (case-insensitive name, same phone) or
    /// creates one. The flag is `true` when a customer was created.
    pub fn create_or_get_customer(
        &self,
        branch_id: BranchId,
        profile: &CustomerProfile,
        now: DateTime<Utc>,
    ) -> DomainResult<(Customer, bool)> {
        profile.validate()?;
        let _guard = self.lock();

        let existing = self
            .customers
            .list(branch_id)
            .into_iter()
            .filter(|c| c.matches(profile))
            .min_by_key(|c| c.created_at);
        if let Some(customer) = existing {
            return Ok((customer, false));
        }

        let code = self.numbers.next_customer_code(branch_id);
        let customer = Customer::from_profile(branch_id, code, profile.clone(), now);
        info!(%branch_id, customer_id = %customer.id, code = %customer.code, "customer created");
        self.customers.upsert(branch_id, customer.id, customer.clone());
        Ok((customer, true))
    }

    pub fn get_customer(&self, branch_id: BranchId, id: &CustomerId) -> Option<Customer> {
        self.customers.get(branch_id, id)
    }

    pub fn require_customer(&self, branch_id: BranchId, id: &CustomerId) -> DomainResult<Customer> {
        self.get_customer(branch_id, id)
            .ok_or_else(|| DomainError::not_found("customer"))
    }

    pub fn customers(&self, branch_id: BranchId) -> Vec<Customer> {
        self.customers.list(branch_id)
    }

    /// Contact details are replaced; type, subtype and organisation fields only
    /// when the profile carries them.
    pub fn update_customer(
        &self,
        branch_id: BranchId,
        id: &CustomerId,
        profile: &CustomerProfile,
    ) -> DomainResult<Customer> {
        if profile.full_name.trim().is_empty() || profile.phone.trim().is_empty() {
            return Err(DomainError::validation("Customer name and phone are required"));
        }
        let _guard = self.lock();
        let mut customer = self.require_customer(branch_id, id)?;

        customer.full_name = profile.full_name.trim().to_string();
        customer.phone = profile.phone.trim().to_string();
        customer.email = filled(profile.email.clone());
        customer.address = filled(profile.address.clone());
        if let Some(t) = profile.customer_type {
            customer.customer_type = t;
        }
        if let Some(s) = profile.personal_subtype {
            customer.personal_subtype = Some(s);
        }
        if let Some(org) = filled(profile.organization_name.clone()) {
            customer.organization_name = Some(org);
        }
        if let Some(tax) = filled(profile.tax_number.clone()) {
            customer.tax_number = Some(tax);
        }

        self.customers.upsert(branch_id, customer.id, customer.clone());
        Ok(customer)
    }

    pub fn record_visit(&self, branch_id: BranchId, id: &CustomerId, now: DateTime<Utc>) -> DomainResult<Customer> {
        let _guard = self.lock();
        let mut customer = self.require_customer(branch_id, id)?;
        customer.record_visit(now);
        self.customers.upsert(branch_id, customer.id, customer.clone());
        Ok(customer)
    }

    /// Returns the customer's vehicle with this plate, filling in a missing
    /// make or model, or registers a new one.
    pub fn create_or_get_vehicle(
        &self,
        branch_id: BranchId,
        customer_id: CustomerId,
        plate: &str,
        make: Option<String>,
        model: Option<String>,
    ) -> DomainResult<(Vehicle, bool)> {
        let plate = normalize_plate(plate);
        if plate.is_empty() {
            return Err(DomainError::validation("Vehicle plate number is required"));
        }
        let _guard = self.lock();
        self.require_customer(branch_id, &customer_id)?;

        let existing = self
            .vehicles
            .list(branch_id)
            .into_iter()
            .filter(|v| v.customer_id == customer_id && v.has_plate(&plate))
            .min_by_key(|v| v.id);

        if let Some(mut vehicle) = existing {
            let make = filled(make);
            let model = filled(model);
            if vehicle.make.is_none() && make.is_some() {
                vehicle.make = make;
            }
            if vehicle.model.is_none() && model.is_some() {
                vehicle.model = model;
            }
            self.vehicles.upsert(branch_id, vehicle.id, vehicle.clone());
            return Ok((vehicle, false));
        }

        let vehicle = Vehicle::new(customer_id, &plate, filled(make), filled(model));
        info!(%branch_id, vehicle_id = %vehicle.id, plate = %vehicle.plate_number, "vehicle registered");
        self.vehicles.upsert(branch_id, vehicle.id, vehicle.clone());
        Ok((vehicle, true))
    }

    /// Most recently registered vehicle with this plate in the branch.
    pub fn find_vehicle_by_plate(&self, branch_id: BranchId, plate: &str) -> Option<Vehicle> {
        let plate = normalize_plate(plate);
        if plate.is_empty() {
            return None;
        }
        self.vehicles
            .list(branch_id)
            .into_iter()
            .filter(|v| v.has_plate(&plate))
            .max_by_key(|v| v.id)
    }

    pub fn get_vehicle(&self, branch_id: BranchId, id: &VehicleId) -> Option<Vehicle> {
        self.vehicles.get(branch_id, id)
    }

    pub fn update_vehicle(
        &self,
        branch_id: BranchId,
        id: &VehicleId,
        update: VehicleUpdate,
    ) -> DomainResult<Vehicle> {
        let _guard = self.lock();
        let mut vehicle = self
            .vehicles
            .get(branch_id, id)
            .ok_or_else(|| DomainError::not_found("vehicle"))?;

        if let Some(make) = filled(update.make) {
            vehicle.make = Some(make);
        }
        if let Some(model) = filled(update.model) {
            vehicle.model = Some(model);
        }
        if let Some(vehicle_type) = filled(update.vehicle_type) {
            vehicle.vehicle_type = Some(vehicle_type);
        }

        self.vehicles.upsert(branch_id, vehicle.id, vehicle.clone());
        Ok(vehicle)
    }
}
