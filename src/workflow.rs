//! The request/approval workflow engine.
//!
//! Every privileged-mutation endpoint is a specialization of the same
//! two-tier pattern: privileged roles (manager, admin) mutate the target
//! entity directly, while unprivileged roles create a pending request row
//! that a privileged role later approves or rejects. This module holds the
//! pieces shared by all of those specializations:
//!
//! - [`Resolution`]: the approve/reject record stamped onto a request row.
//!   Repositories consume it through a compare-and-swap on
//!   `status = pending`, so a request resolves exactly once even under
//!   concurrent approvals.
//! - [`ResourceChanges`]: the field mask captured when an update is
//!   requested. Only fields present in the mask are ever applied.
//! - [`AdjustableResource`]: the seam that lets one engine drive all three
//!   physical-resource kinds (the open/availability flag is `is_open` on
//!   libraries and `is_available` on labs and classrooms).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Classroom, Lab, Library, RequestStatus, ResourceKind, ResourceUpdateRequest,
};

/// Decision
///
/// The two terminal outcomes of a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

/// Resolution
///
/// The record of a decision on a pending request: who decided, when, and (for
/// rejections) why. Repository resolve operations take this and atomically
/// transition `pending -> approved|rejected`, reporting whether the claim
/// won. A lost claim means another resolver got there first.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub decision: Decision,
    pub resolved_by: Uuid,
    pub resolved_at: DateTime<Utc>,
    pub rejection_reason: Option<String>,
}

impl Resolution {
    pub fn approved(resolved_by: Uuid) -> Self {
        Self {
            decision: Decision::Approved,
            resolved_by,
            resolved_at: Utc::now(),
            rejection_reason: None,
        }
    }

    pub fn rejected(resolved_by: Uuid, reason: Option<String>) -> Self {
        Self {
            decision: Decision::Rejected,
            resolved_by,
            resolved_at: Utc::now(),
            rejection_reason: reason,
        }
    }

    /// The terminal status this resolution transitions a request into.
    pub fn terminal_status(&self) -> RequestStatus {
        match self.decision {
            Decision::Approved => RequestStatus::Approved,
            Decision::Rejected => RequestStatus::Rejected,
        }
    }
}

/// ResourceChanges
///
/// The field mask of an update: `None` means "not requested, keep the current
/// value". This is what unprivileged callers get captured into a pending
/// request, and what approval later replays onto the entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceChanges {
    pub current_occupancy: Option<i32>,
    /// The open/availability flag of the target kind.
    pub open: Option<bool>,
}

impl ResourceChanges {
    /// True when neither recognized field was requested; such an update has
    /// nothing to capture or apply.
    pub fn is_empty(&self) -> bool {
        self.current_occupancy.is_none() && self.open.is_none()
    }
}

impl From<&ResourceUpdateRequest> for ResourceChanges {
    fn from(request: &ResourceUpdateRequest) -> Self {
        Self {
            current_occupancy: request.requested_occupancy,
            open: request.requested_open,
        }
    }
}

/// AdjustableResource
///
/// The seam between the workflow engine and the three physical-resource
/// kinds. Implementors expose the two workflow-managed fields plus the
/// audit stamp.
pub trait AdjustableResource {
    const KIND: ResourceKind;

    fn set_occupancy(&mut self, value: i32);
    fn set_open(&mut self, value: bool);
    /// Records who performed the mutation and when.
    fn touch(&mut self, actor: Uuid, at: DateTime<Utc>);
}

impl AdjustableResource for Library {
    const KIND: ResourceKind = ResourceKind::Library;

    fn set_occupancy(&mut self, value: i32) {
        self.current_occupancy = value;
    }

    fn set_open(&mut self, value: bool) {
        self.is_open = value;
    }

    fn touch(&mut self, actor: Uuid, at: DateTime<Utc>) {
        self.updated_by = Some(actor);
        self.last_updated = at;
    }
}

impl AdjustableResource for Lab {
    const KIND: ResourceKind = ResourceKind::Lab;

    fn set_occupancy(&mut self, value: i32) {
        self.current_occupancy = value;
    }

    fn set_open(&mut self, value: bool) {
        self.is_available = value;
    }

    fn touch(&mut self, actor: Uuid, at: DateTime<Utc>) {
        self.updated_by = Some(actor);
        self.last_updated = at;
    }
}

impl AdjustableResource for Classroom {
    const KIND: ResourceKind = ResourceKind::Classroom;

    fn set_occupancy(&mut self, value: i32) {
        self.current_occupancy = value;
    }

    fn set_open(&mut self, value: bool) {
        self.is_available = value;
    }

    fn touch(&mut self, actor: Uuid, at: DateTime<Utc>) {
        self.updated_by = Some(actor);
        self.last_updated = at;
    }
}

/// apply_changes
///
/// Partial application: each field present in the mask is written to the
/// entity; absent fields keep their current value. The audit stamp is
/// recorded unconditionally, since reaching this point means a mutation was
/// authorized (direct edit or approved request).
pub fn apply_changes<R: AdjustableResource>(resource: &mut R, changes: &ResourceChanges, actor: Uuid) {
    if let Some(occupancy) = changes.current_occupancy {
        resource.set_occupancy(occupancy);
    }
    if let Some(open) = changes.open {
        resource.set_open(open);
    }
    resource.touch(actor, Utc::now());
}

/// pending_update_for
///
/// Builds the pending request row capturing exactly the requested field
/// changes against a resource. The caller persists it and returns the
/// *unmodified* current entity state to the requester.
pub fn pending_update_for<R: AdjustableResource>(
    resource_id: Uuid,
    requested_by: Uuid,
    changes: &ResourceChanges,
) -> ResourceUpdateRequest {
    ResourceUpdateRequest {
        id: Uuid::new_v4(),
        kind: R::KIND,
        resource_id,
        requested_by,
        requested_occupancy: changes.current_occupancy,
        requested_open: changes.open,
        status: RequestStatus::Pending,
        requested_at: Utc::now(),
        resolved_by: None,
        resolved_at: None,
        rejection_reason: None,
    }
}
