use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tracker_core::{BranchId, DomainError, DomainResult, Entity};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(Uuid);

impl CustomerId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for CustomerId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("CustomerId: {e}")))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    Personal,
    Company,
    Government,
    Ngo,
}

impl CustomerType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "personal" => Some(Self::Personal),
            "company" => Some(Self::Company),
            "government" => Some(Self::Government),
            "ngo" => Some(Self::Ngo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Company => "company",
            Self::Government => "government",
            Self::Ngo => "ngo",
        }
    }

    pub fn is_organization(&self) -> bool {
        !matches!(self, Self::Personal)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalSubtype {
    Owner,
    Driver,
}

impl PersonalSubtype {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "owner" => Some(Self::Owner),
            "driver" => Some(Self::Driver),
            _ => None,
        }
    }
}

/// Customer details as submitted by a form, before they are matched or stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub customer_type: Option<CustomerType>,
    pub personal_subtype: Option<PersonalSubtype>,
    pub organization_name: Option<String>,
    pub tax_number: Option<String>,
}

fn blank(v: &Option<String>) -> bool {
    v.as_deref().is_none_or(|s| s.trim().is_empty())
}

impl CustomerProfile {
    /// Type defaults to personal when absent.
    pub fn customer_type(&self) -> CustomerType {
        self.customer_type.unwrap_or(CustomerType::Personal)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.full_name.trim().is_empty() || self.phone.trim().is_empty() {
            return Err(DomainError::validation("Customer name and phone are required"));
        }
        match self.customer_type() {
            CustomerType::Personal if self.personal_subtype.is_none() => Err(DomainError::validation(
                "Personal subtype is required for personal customers",
            )),
            t if t.is_organization() && (blank(&self.organization_name) || blank(&self.tax_number)) => {
                Err(DomainError::validation("Organization name and tax number are required"))
            }
            _ => Ok(()),
        }
    }
}

/// Profile for a customer created from nothing but a plate at the counter.
pub fn walk_in_profile(plate: &str) -> CustomerProfile {
    CustomerProfile {
        full_name: format!("Plate {plate}"),
        phone: format!("PLATE_{plate}"),
        customer_type: Some(CustomerType::Personal),
        personal_subtype: Some(PersonalSubtype::Owner),
        ..CustomerProfile::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    /// `CUST-NNNNN`, unique within the branch.
    pub code: String,
    pub branch_id: BranchId,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub customer_type: CustomerType,
    pub personal_subtype: Option<PersonalSubtype>,
    pub organization_name: Option<String>,
    pub tax_number: Option<String>,
    pub total_visits: u32,
    pub last_visit: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn from_profile(
        branch_id: BranchId,
        code: String,
        profile: CustomerProfile,
        now: DateTime<Utc>,
    ) -> Self {
        let customer_type = profile.customer_type();
        Self {
            id: CustomerId::new(),
            code,
            branch_id,
            full_name: profile.full_name.trim().to_string(),
            phone: profile.phone.trim().to_string(),
            email: profile.email,
            address: profile.address,
            customer_type,
            personal_subtype: profile.personal_subtype,
            organization_name: profile.organization_name,
            tax_number: profile.tax_number,
            total_visits: 0,
            last_visit: None,
            created_at: now,
        }
    }

    /// Same person: case-insensitive name and exact (trimmed) phone.
    pub fn matches(&self, profile: &CustomerProfile) -> bool {
        self.full_name.eq_ignore_ascii_case(profile.full_name.trim()) && self.phone == profile.phone.trim()
    }

    /// Stored details as a profile, the base for partial edits.
    pub fn profile(&self) -> CustomerProfile {
        CustomerProfile {
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            customer_type: Some(self.customer_type),
            personal_subtype: self.personal_subtype,
            organization_name: self.organization_name.clone(),
            tax_number: self.tax_number.clone(),
        }
    }

    pub fn record_visit(&mut self, now: DateTime<Utc>) {
        self.total_visits += 1;
        self.last_visit = Some(now);
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(t: Option<CustomerType>) -> CustomerProfile {
        CustomerProfile {
            full_name: "Neema Juma".into(),
            phone: "+255700000001".into(),
            customer_type: t,
            ..CustomerProfile::default()
        }
    }

    #[test]
    fn name_and_phone_are_required() {
        let mut p = profile(Some(CustomerType::Personal));
        p.phone = "  ".into();
        assert_eq!(
            p.validate(),
            Err(DomainError::validation("Customer name and phone are required"))
        );
    }

    #[test]
    fn personal_needs_subtype_and_organisations_need_tax_details() {
        let p = profile(Some(CustomerType::Personal));
        assert_eq!(
            p.validate(),
            Err(DomainError::validation("Personal subtype is required for personal customers"))
        );

        let mut org = profile(Some(CustomerType::Ngo));
        org.organization_name = Some("Helping Hands".into());
        assert_eq!(
            org.validate(),
            Err(DomainError::validation("Organization name and tax number are required"))
        );
        org.tax_number = Some("TIN-1".into());
        assert!(org.validate().is_ok());
    }

    #[test]
    fn walk_in_profile_is_valid_personal_owner() {
        let p = walk_in_profile("T123ABC");
        assert_eq!(p.full_name, "Plate T123ABC");
        assert_eq!(p.phone, "PLATE_T123ABC");
        assert!(p.validate().is_ok());
    }

    #[test]
    fn visits_accumulate() {
        let now = Utc::now();
        let mut c = Customer::from_profile(BranchId::new(), "CUST-00001".into(), walk_in_profile("X1"), now);
        assert!(!c.matches(&walk_in_profile("x1")));
        assert!(c.matches(&CustomerProfile {
            full_name: "plate x1".into(),
            phone: "PLATE_X1".into(),
            ..CustomerProfile::default()
        }));
        c.record_visit(now);
        c.record_visit(now);
        assert_eq!(c.total_visits, 2);
        assert_eq!(c.last_visit, Some(now));
    }

    #[test]
    fn stored_profile_round_trips_through_validation() {
        let mut p = walk_in_profile("KAA1");
        p.email = Some("owner@example.com".into());
        let c = Customer::from_profile(BranchId::new(), "CUST-00002".into(), p.clone(), Utc::now());
        let back = c.profile();
        assert_eq!(back, p);
        assert!(back.validate().is_ok());
    }

    #[test]
    fn type_parsing() {
        assert_eq!(CustomerType::parse("ngo"), Some(CustomerType::Ngo));
        assert_eq!(CustomerType::parse("NGO"), None);
        assert_eq!(PersonalSubtype::parse("driver"), Some(PersonalSubtype::Driver));
    }
}
