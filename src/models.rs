use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Closed Enumerations ---
//
// Every status/role/category field is a closed enum: unknown wire values are
// rejected at deserialization and can never be persisted.

/// Role
///
/// The RBAC field attached to every profile. `manager` and `admin` are the
/// privileged roles; `admin` is never assignable through self-service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    Student,
    Lecturer,
    Manager,
    Admin,
}

impl Role {
    /// True for the roles allowed to mutate resources directly and to resolve
    /// pending requests.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Lecturer => "lecturer",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "lecturer" => Ok(Role::Lecturer),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// RequestStatus
///
/// Lifecycle of every pending-change row (role requests, resource update
/// requests, room requests). `pending` is the only non-terminal state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[ts(export)]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// FaultStatus
///
/// `resolved`, `done`, and `closed` form the terminal set; the first
/// transition into it stamps `resolved_at` exactly once.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[ts(export)]
pub enum FaultStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Done,
    Closed,
}

impl FaultStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FaultStatus::Resolved | FaultStatus::Done | FaultStatus::Closed)
    }
}

/// Severity of a fault report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[ts(export)]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Category of a fault report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[ts(export)]
pub enum FaultCategory {
    Electrical,
    Plumbing,
    Hvac,
    Network,
    Equipment,
    #[default]
    Other,
}

/// Kind of location a fault was reported against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[ts(export)]
pub enum LocationType {
    Library,
    Lab,
    #[default]
    Classroom,
    Other,
}

/// RoomType
///
/// The two bookable room kinds for lecturer room requests.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[ts(export)]
pub enum RoomType {
    Classroom,
    Lab,
}

impl FromStr for RoomType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classroom" => Ok(RoomType::Classroom),
            "lab" => Ok(RoomType::Lab),
            _ => Err(()),
        }
    }
}

/// ResourceKind
///
/// Discriminant for the generalized resource-update workflow. All three
/// physical-resource kinds route through the same pending-request machinery.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[ts(export)]
pub enum ResourceKind {
    Library,
    Lab,
    Classroom,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Library => "library",
            ResourceKind::Lab => "lab",
            ResourceKind::Classroom => "classroom",
        }
    }
}

impl From<RoomType> for ResourceKind {
    fn from(rt: RoomType) -> Self {
        match rt {
            RoomType::Classroom => ResourceKind::Classroom,
            RoomType::Lab => ResourceKind::Lab,
        }
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical identity record. Internal only; the wire representation is
/// `UserAccount`. The password hash is an argon2 PHC string and never leaves
/// the repository layer.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    // The user's primary identifier, also the login name.
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Profile
///
/// One-to-one with User: role plus organizational metadata. Lazily created
/// with the default role on first access.
#[derive(Debug, Clone, Default, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub role: Role,
    pub department: Option<String>,
    // Meaningful only when role = manager.
    pub manager_type: Option<String>,
}

/// Library
///
/// A library resource row with occupancy/availability state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Library {
    pub id: Uuid,
    // Unique across libraries.
    pub name: String,
    pub current_occupancy: i32,
    pub max_capacity: i32,
    pub is_open: bool,
    #[ts(type = "string")]
    pub last_updated: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// Lab
///
/// A lab resource row. (building, room_number) is unique.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Lab {
    pub id: Uuid,
    pub name: String,
    pub building: String,
    pub room_number: String,
    pub current_occupancy: i32,
    pub max_capacity: i32,
    pub is_available: bool,
    pub equipment_status: String,
    #[ts(type = "string")]
    pub last_updated: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// Classroom
///
/// A classroom resource row. (building, room_number) is unique.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Classroom {
    pub id: Uuid,
    pub name: String,
    pub building: String,
    pub room_number: String,
    pub current_occupancy: i32,
    pub max_capacity: i32,
    pub is_available: bool,
    #[ts(type = "string")]
    pub last_updated: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// RoleRequest
///
/// A pending role-elevation row. Resolved exactly once: the repository's
/// resolve operation is a compare-and-swap on `status = pending`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct RoleRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requested_role: Role,
    pub manager_type: Option<String>,
    pub reason: Option<String>,
    pub status: RequestStatus,
    #[ts(type = "string")]
    pub requested_at: DateTime<Utc>,
    pub resolved_by: Option<Uuid>,
    #[ts(type = "string | null")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

/// ResourceUpdateRequest
///
/// A pending field-level change against a Library, Lab, or Classroom. Only
/// the fields captured at creation (`Some`) are applied on approval; `None`
/// fields keep the entity's current value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct ResourceUpdateRequest {
    pub id: Uuid,
    pub kind: ResourceKind,
    pub resource_id: Uuid,
    pub requested_by: Uuid,
    pub requested_occupancy: Option<i32>,
    // The open/availability flag: `is_open` for libraries, `is_available`
    // for labs and classrooms.
    pub requested_open: Option<bool>,
    pub status: RequestStatus,
    #[ts(type = "string")]
    pub requested_at: DateTime<Utc>,
    pub resolved_by: Option<Uuid>,
    #[ts(type = "string | null")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

/// FaultReport
///
/// A user-submitted fault against a campus location.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct FaultReport {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub title: String,
    pub description: String,
    pub location_type: LocationType,
    pub building: String,
    pub room_number: String,
    pub category: FaultCategory,
    pub severity: Severity,
    pub status: FaultStatus,
    // Free text; assignment is informational, not an account reference.
    pub assigned_to: Option<String>,
    pub resolution_notes: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// RoomRequest
///
/// A lecturer's booking request for a classroom or lab. On approval exactly
/// one concrete room is attached via `room_id` and marked unavailable.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct RoomRequest {
    pub id: Uuid,
    pub requested_by: Uuid,
    pub room_type: RoomType,
    pub purpose: String,
    pub expected_attendees: i32,
    #[ts(type = "string")]
    pub requested_date: NaiveDate,
    #[ts(type = "string")]
    pub start_time: NaiveTime,
    #[ts(type = "string")]
    pub end_time: NaiveTime,
    pub room_id: Option<Uuid>,
    pub status: RequestStatus,
    #[ts(type = "string")]
    pub requested_at: DateTime<Utc>,
    pub resolved_by: Option<Uuid>,
    #[ts(type = "string | null")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// Input payload for the public registration endpoint (POST /register).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Input payload for POST /login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RoleChangeRequest
///
/// Input payload for POST /role. The role arrives as a free string so the
/// handler can reject non-requestable values ("admin", typos) with a
/// domain-specific message instead of a deserializer error.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RoleChangeRequest {
    pub role: String,
    pub manager_type: Option<String>,
    pub reason: Option<String>,
}

fn default_library_capacity() -> i32 {
    100
}
fn default_lab_capacity() -> i32 {
    30
}
fn default_classroom_capacity() -> i32 {
    50
}
fn default_true() -> bool {
    true
}
fn default_attendees() -> i32 {
    1
}

/// Input payload for creating a library (manager/admin).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateLibraryRequest {
    pub name: String,
    #[serde(default = "default_library_capacity")]
    pub max_capacity: i32,
    #[serde(default)]
    pub current_occupancy: i32,
    #[serde(default = "default_true")]
    pub is_open: bool,
}

/// Input payload for creating a lab (manager/admin).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateLabRequest {
    // Defaults to "Lab {room_number}" when omitted.
    pub name: Option<String>,
    pub building: String,
    pub room_number: String,
    #[serde(default = "default_lab_capacity")]
    pub max_capacity: i32,
    #[serde(default)]
    pub current_occupancy: i32,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub equipment_status: String,
}

/// Input payload for creating a classroom (manager/admin).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateClassroomRequest {
    pub name: Option<String>,
    pub building: String,
    pub room_number: String,
    #[serde(default = "default_classroom_capacity")]
    pub max_capacity: i32,
    #[serde(default)]
    pub current_occupancy: i32,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

/// LibraryUpdatePayload
///
/// Partial update for a library. Occupancy and the open flag go through the
/// approval workflow for unprivileged callers; name and capacity changes are
/// honored only on the privileged direct path.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LibraryUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_occupancy: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<i32>,
}

/// Partial update for a lab or classroom.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RoomUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_occupancy: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

/// Input payload for POST /faults.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateFaultRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location_type: LocationType,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub category: FaultCategory,
    #[serde(default)]
    pub severity: Severity,
}

/// Partial update for a fault report (manager/admin).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FaultUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FaultStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
}

/// CreateRoomRequestPayload
///
/// Input payload for POST /room-requests. Date and times arrive as strings
/// (`%Y-%m-%d`, `%H:%M`) and are parsed by the handler so malformed input
/// yields a message with the parse detail.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateRoomRequestPayload {
    #[serde(default)]
    pub room_type: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default = "default_attendees")]
    pub expected_attendees: i32,
    pub requested_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    // Optional preferred room; attached best-effort at creation time.
    pub room_id: Option<Uuid>,
}

/// Input payload for approving a room request: the concrete room to assign.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ApproveRoomRequestPayload {
    pub room_id: Option<Uuid>,
}

/// Input payload for any reject endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RejectPayload {
    pub rejection_reason: Option<String>,
}

// --- Output Schemas ---

/// UserAccount
///
/// The wire representation of a user plus profile, returned by /register,
/// /login, /me, role endpoints, and the admin user listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub department: Option<String>,
    pub manager_type: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn from_parts(user: &User, profile: &Profile) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: profile.role,
            department: profile.department.clone(),
            manager_type: profile.manager_type.clone(),
            created_at: user.created_at,
        }
    }
}

/// Envelope for endpoints returning a single account (GET /me, role
/// request approval).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserEnvelope {
    pub user: UserAccount,
}

/// Output of /register and /login: the bearer token plus the account.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserAccount,
}

/// Output of POST /role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoleChangeResponse {
    pub user: UserAccount,
    pub pending_request: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn occupancy_percentage(current: i32, max: i32) -> f64 {
    if max > 0 {
        ((current as f64 / max as f64) * 1000.0).round() / 10.0
    } else {
        0.0
    }
}

/// LibraryView
///
/// A library entry as listed/returned to clients, with the derived
/// occupancy percentage (one decimal).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LibraryView {
    pub id: Uuid,
    pub name: String,
    pub current_occupancy: i32,
    pub max_capacity: i32,
    pub is_open: bool,
    pub occupancy_percentage: f64,
    #[ts(type = "string")]
    pub last_updated: DateTime<Utc>,
}

impl From<&Library> for LibraryView {
    fn from(lib: &Library) -> Self {
        Self {
            id: lib.id,
            name: lib.name.clone(),
            current_occupancy: lib.current_occupancy,
            max_capacity: lib.max_capacity,
            is_open: lib.is_open,
            occupancy_percentage: occupancy_percentage(lib.current_occupancy, lib.max_capacity),
            last_updated: lib.last_updated,
        }
    }
}

/// A lab entry as listed/returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LabView {
    pub id: Uuid,
    pub name: String,
    pub building: String,
    pub room_number: String,
    pub current_occupancy: i32,
    pub max_capacity: i32,
    pub is_available: bool,
    pub equipment_status: String,
    pub occupancy_percentage: f64,
    #[ts(type = "string")]
    pub last_updated: DateTime<Utc>,
}

impl From<&Lab> for LabView {
    fn from(lab: &Lab) -> Self {
        Self {
            id: lab.id,
            name: lab.name.clone(),
            building: lab.building.clone(),
            room_number: lab.room_number.clone(),
            current_occupancy: lab.current_occupancy,
            max_capacity: lab.max_capacity,
            is_available: lab.is_available,
            equipment_status: lab.equipment_status.clone(),
            occupancy_percentage: occupancy_percentage(lab.current_occupancy, lab.max_capacity),
            last_updated: lab.last_updated,
        }
    }
}

/// A classroom entry as listed/returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ClassroomView {
    pub id: Uuid,
    pub name: String,
    pub building: String,
    pub room_number: String,
    pub current_occupancy: i32,
    pub max_capacity: i32,
    pub is_available: bool,
    pub occupancy_percentage: f64,
    #[ts(type = "string")]
    pub last_updated: DateTime<Utc>,
}

impl From<&Classroom> for ClassroomView {
    fn from(room: &Classroom) -> Self {
        Self {
            id: room.id,
            name: room.name.clone(),
            building: room.building.clone(),
            room_number: room.room_number.clone(),
            current_occupancy: room.current_occupancy,
            max_capacity: room.max_capacity,
            is_available: room.is_available,
            occupancy_percentage: occupancy_percentage(room.current_occupancy, room.max_capacity),
            last_updated: room.last_updated,
        }
    }
}

/// List wrapper for GET /libraries.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LibraryList {
    pub libraries: Vec<LibraryView>,
}

/// List wrapper for GET /labs.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LabList {
    pub labs: Vec<LabView>,
}

/// List wrapper for GET /classrooms.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ClassroomList {
    pub classrooms: Vec<ClassroomView>,
}

/// UpdateStatus
///
/// Disposition of an update attempt: `applied` on the privileged direct
/// path, `pending` when a request row was created instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum UpdateStatus {
    Applied,
    Pending,
}

/// Outcome of POST /libraries/{id}/update. On the pending path the embedded
/// view carries the *current* entity state, not the requested values.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LibraryUpdateOutcome {
    pub status: UpdateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    pub library: LibraryView,
}

/// Outcome of POST /labs/{id}/update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LabUpdateOutcome {
    pub status: UpdateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    pub lab: LabView,
}

/// Outcome of POST /classrooms/{id}/update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ClassroomUpdateOutcome {
    pub status: UpdateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    pub classroom: ClassroomView,
}

/// UpdateRequestView
///
/// A pending resource-update request enriched with the target's identity and
/// current values, for the manager review queue.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateRequestView {
    pub id: Uuid,
    pub kind: ResourceKind,
    pub resource_id: Uuid,
    pub resource_name: String,
    pub building: Option<String>,
    pub room_number: Option<String>,
    pub current_occupancy: i32,
    pub current_open: bool,
    pub requested_occupancy: Option<i32>,
    pub requested_open: Option<bool>,
    pub requested_by: String,
    #[ts(type = "string")]
    pub requested_at: DateTime<Utc>,
}

/// Output of GET /updates/pending: the full review queue, grouped by kind.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PendingUpdatesResponse {
    pub library_requests: Vec<UpdateRequestView>,
    pub lab_requests: Vec<UpdateRequestView>,
    pub classroom_requests: Vec<UpdateRequestView>,
    pub total_pending: usize,
}

/// A fault report enriched with the reporter's email.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FaultView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location_type: LocationType,
    pub building: String,
    pub room_number: String,
    pub category: FaultCategory,
    pub severity: Severity,
    pub status: FaultStatus,
    pub assigned_to: Option<String>,
    pub resolution_notes: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub reporter_email: String,
}

impl FaultView {
    pub fn from_report(report: &FaultReport, reporter_email: String) -> Self {
        Self {
            id: report.id,
            title: report.title.clone(),
            description: report.description.clone(),
            location_type: report.location_type,
            building: report.building.clone(),
            room_number: report.room_number.clone(),
            category: report.category,
            severity: report.severity,
            status: report.status,
            assigned_to: report.assigned_to.clone(),
            resolution_notes: report.resolution_notes.clone(),
            created_at: report.created_at,
            updated_at: report.updated_at,
            resolved_at: report.resolved_at,
            reporter_email,
        }
    }
}

/// List wrapper for GET /faults.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FaultList {
    pub faults: Vec<FaultView>,
}

/// A role request enriched with user/approver emails for the admin queue.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoleRequestView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub requested_role: Role,
    pub manager_type: Option<String>,
    pub reason: Option<String>,
    pub status: RequestStatus,
    #[ts(type = "string")]
    pub requested_at: DateTime<Utc>,
    pub resolved_by: Option<String>,
    #[ts(type = "string | null")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

/// List wrapper for GET /admin/role-requests.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RoleRequestList {
    pub requests: Vec<RoleRequestView>,
}

/// List wrapper for GET /admin/users.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserList {
    pub users: Vec<UserAccount>,
}

/// The concrete room attached to an approved room request.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AssignedRoom {
    pub id: Uuid,
    pub name: String,
    pub building: String,
    pub room_number: String,
    pub kind: ResourceKind,
}

/// A room request enriched with requester identity and assigned-room info.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoomRequestView {
    pub id: Uuid,
    pub room_type: RoomType,
    pub purpose: String,
    pub expected_attendees: i32,
    #[ts(type = "string")]
    pub requested_date: NaiveDate,
    #[ts(type = "string")]
    pub start_time: NaiveTime,
    #[ts(type = "string")]
    pub end_time: NaiveTime,
    pub status: RequestStatus,
    pub requested_by: String,
    #[ts(type = "string")]
    pub requested_at: DateTime<Utc>,
    pub assigned_room: Option<AssignedRoom>,
    pub resolved_by: Option<String>,
    #[ts(type = "string | null")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

/// List wrapper for GET /room-requests.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RoomRequestList {
    pub requests: Vec<RoomRequestView>,
}

// --- Dashboard Schemas (Output) ---

/// Per-role account counts for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserRoleCounts {
    pub total: i64,
    pub students: i64,
    pub lecturers: i64,
    pub managers: i64,
    pub admins: i64,
}

/// Fault totals for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FaultCounts {
    pub total: i64,
    pub open: i64,
}

/// Output schema for the administrative statistics dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub users: UserRoleCounts,
    pub pending_role_requests: i64,
    pub faults: FaultCounts,
}
