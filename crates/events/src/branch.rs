use tracker_core::BranchId;

use crate::EventEnvelope;

/// Messages that belong to exactly one branch; consumers use this to filter
/// a shared subscription down to the caller's branch.
pub trait BranchScoped {
    fn branch_id(&self) -> BranchId;
}

impl<E> BranchScoped for EventEnvelope<E> {
    fn branch_id(&self) -> BranchId {
        EventEnvelope::branch_id(self)
    }
}
