use crate::models::{
    AdminDashboardStats, Classroom, FaultCounts, FaultReport, FaultStatus, Lab, Library, Profile,
    RequestStatus, ResourceUpdateRequest, Role, RoleRequest, RoomRequest, User, UserAccount,
    UserRoleCounts,
};
use crate::workflow::Resolution;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// handlers to interact with the data layer without knowing the specific
/// implementation (Postgres, in-memory).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task
/// boundaries.
///
/// Resolution contract: every `resolve_*` method is a compare-and-swap on
/// `status = pending`. It returns true only when this call performed the
/// `pending -> terminal` transition; false means the request was already
/// resolved (or concurrently claimed) and nothing was changed.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users & Profiles ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn find_user_by_email(&self, email: &str) -> Option<User>;
    async fn create_user(&self, user: User) -> User;
    // Admin listing: every account joined with its profile, newest first.
    async fn list_accounts(&self) -> Vec<UserAccount>;
    // Lazily creates the profile with the default role on first access.
    async fn get_or_create_profile(&self, user_id: Uuid) -> Profile;
    async fn save_profile(&self, profile: Profile) -> Profile;

    // --- Role Requests ---
    async fn find_pending_role_request(&self, user_id: Uuid, role: Role) -> Option<RoleRequest>;
    async fn create_role_request(&self, request: RoleRequest) -> RoleRequest;
    async fn get_role_request(&self, id: Uuid) -> Option<RoleRequest>;
    async fn list_role_requests(&self) -> Vec<RoleRequest>;
    async fn resolve_role_request(&self, id: Uuid, resolution: &Resolution) -> bool;

    // --- Libraries ---
    async fn list_libraries(&self) -> Vec<Library>;
    async fn get_library(&self, id: Uuid) -> Option<Library>;
    async fn find_library_by_name(&self, name: &str) -> Option<Library>;
    async fn create_library(&self, library: Library) -> Library;
    async fn save_library(&self, library: Library) -> Library;

    // --- Labs ---
    async fn list_labs(&self) -> Vec<Lab>;
    async fn get_lab(&self, id: Uuid) -> Option<Lab>;
    async fn find_lab_by_room(&self, building: &str, room_number: &str) -> Option<Lab>;
    async fn create_lab(&self, lab: Lab) -> Lab;
    async fn save_lab(&self, lab: Lab) -> Lab;

    // --- Classrooms ---
    async fn list_classrooms(&self) -> Vec<Classroom>;
    async fn get_classroom(&self, id: Uuid) -> Option<Classroom>;
    async fn find_classroom_by_room(&self, building: &str, room_number: &str)
    -> Option<Classroom>;
    async fn create_classroom(&self, room: Classroom) -> Classroom;
    async fn save_classroom(&self, room: Classroom) -> Classroom;

    // --- Resource Update Requests ---
    async fn create_update_request(&self, request: ResourceUpdateRequest)
    -> ResourceUpdateRequest;
    async fn get_update_request(&self, id: Uuid) -> Option<ResourceUpdateRequest>;
    async fn list_pending_update_requests(&self) -> Vec<ResourceUpdateRequest>;
    async fn resolve_update_request(&self, id: Uuid, resolution: &Resolution) -> bool;

    // --- Fault Reports ---
    async fn create_fault(&self, report: FaultReport) -> FaultReport;
    async fn get_fault(&self, id: Uuid) -> Option<FaultReport>;
    async fn list_faults(&self) -> Vec<FaultReport>;
    async fn list_faults_by_reporter(&self, reporter_id: Uuid) -> Vec<FaultReport>;
    async fn save_fault(&self, report: FaultReport) -> FaultReport;

    // --- Room Requests ---
    async fn create_room_request(&self, request: RoomRequest) -> RoomRequest;
    async fn get_room_request(&self, id: Uuid) -> Option<RoomRequest>;
    async fn list_room_requests(&self) -> Vec<RoomRequest>;
    async fn list_room_requests_by_requester(&self, user_id: Uuid) -> Vec<RoomRequest>;
    // CAS resolve; on approval `assign_room` is stamped together with the
    // status transition so an approved request always carries its room.
    async fn resolve_room_request(
        &self,
        id: Uuid,
        resolution: &Resolution,
        assign_room: Option<Uuid>,
    ) -> bool;

    // --- Dashboard ---
    async fn get_stats(&self) -> AdminDashboardStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- Postgres Implementation ---

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database. Uses the runtime query API with explicit binds
/// throughout. Read failures are logged and degrade to empty results; the
/// CAS resolves report a lost claim on any failure.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user error: {:?}", e);
            None
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_user_by_email error: {:?}", e);
            None
        })
    }

    async fn create_user(&self, user: User) -> User {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, password_hash, created_at",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create user")
    }

    /// Joins every user with its profile; accounts without a profile row get
    /// the defaults, mirroring lazy profile creation.
    async fn list_accounts(&self) -> Vec<UserAccount> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_accounts error: {:?}", e);
            vec![]
        });

        let mut accounts = Vec::with_capacity(users.len());
        for user in &users {
            let profile = self.get_or_create_profile(user.id).await;
            accounts.push(UserAccount::from_parts(user, &profile));
        }
        accounts
    }

    async fn get_or_create_profile(&self, user_id: Uuid) -> Profile {
        if let Ok(Some(profile)) = sqlx::query_as::<_, Profile>(
            "SELECT user_id, role, department, manager_type FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        {
            return profile;
        }

        // Absent (or read failed): insert the default row. ON CONFLICT keeps
        // concurrent first-access calls convergent.
        let _ = sqlx::query(
            "INSERT INTO profiles (user_id, role, department, manager_type) \
             VALUES ($1, $2, NULL, NULL) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(Role::default())
        .execute(&self.pool)
        .await;

        sqlx::query_as::<_, Profile>(
            "SELECT user_id, role, department, manager_type FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .unwrap_or(Profile {
            user_id,
            ..Profile::default()
        })
    }

    async fn save_profile(&self, profile: Profile) -> Profile {
        sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (user_id, role, department, manager_type) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE SET role = $2, department = $3, manager_type = $4 \
             RETURNING user_id, role, department, manager_type",
        )
        .bind(profile.user_id)
        .bind(profile.role)
        .bind(&profile.department)
        .bind(&profile.manager_type)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to save profile")
    }

    async fn find_pending_role_request(&self, user_id: Uuid, role: Role) -> Option<RoleRequest> {
        sqlx::query_as::<_, RoleRequest>(
            "SELECT * FROM role_requests \
             WHERE user_id = $1 AND requested_role = $2 AND status = $3",
        )
        .bind(user_id)
        .bind(role)
        .bind(RequestStatus::Pending)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_pending_role_request error: {:?}", e);
            None
        })
    }

    async fn create_role_request(&self, request: RoleRequest) -> RoleRequest {
        sqlx::query_as::<_, RoleRequest>(
            "INSERT INTO role_requests \
             (id, user_id, requested_role, manager_type, reason, status, requested_at, \
              resolved_by, resolved_at, rejection_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(request.id)
        .bind(request.user_id)
        .bind(request.requested_role)
        .bind(&request.manager_type)
        .bind(&request.reason)
        .bind(request.status)
        .bind(request.requested_at)
        .bind(request.resolved_by)
        .bind(request.resolved_at)
        .bind(&request.rejection_reason)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create role request")
    }

    async fn get_role_request(&self, id: Uuid) -> Option<RoleRequest> {
        sqlx::query_as::<_, RoleRequest>("SELECT * FROM role_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_role_request error: {:?}", e);
                None
            })
    }

    async fn list_role_requests(&self) -> Vec<RoleRequest> {
        sqlx::query_as::<_, RoleRequest>(
            "SELECT * FROM role_requests ORDER BY requested_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_role_requests error: {:?}", e);
            vec![]
        })
    }

    /// Conditional UPDATE: the `status = pending` predicate is the
    /// compare-and-swap that closes the double-approval race.
    async fn resolve_role_request(&self, id: Uuid, resolution: &Resolution) -> bool {
        match sqlx::query(
            "UPDATE role_requests \
             SET status = $2, resolved_by = $3, resolved_at = $4, rejection_reason = $5 \
             WHERE id = $1 AND status = $6",
        )
        .bind(id)
        .bind(resolution.terminal_status())
        .bind(resolution.resolved_by)
        .bind(resolution.resolved_at)
        .bind(&resolution.rejection_reason)
        .bind(RequestStatus::Pending)
        .execute(&self.pool)
        .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("resolve_role_request error: {:?}", e);
                false
            }
        }
    }

    async fn list_libraries(&self) -> Vec<Library> {
        sqlx::query_as::<_, Library>("SELECT * FROM libraries ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_libraries error: {:?}", e);
                vec![]
            })
    }

    async fn get_library(&self, id: Uuid) -> Option<Library> {
        sqlx::query_as::<_, Library>("SELECT * FROM libraries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_library error: {:?}", e);
                None
            })
    }

    async fn find_library_by_name(&self, name: &str) -> Option<Library> {
        sqlx::query_as::<_, Library>("SELECT * FROM libraries WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("find_library_by_name error: {:?}", e);
                None
            })
    }

    async fn create_library(&self, library: Library) -> Library {
        sqlx::query_as::<_, Library>(
            "INSERT INTO libraries \
             (id, name, current_occupancy, max_capacity, is_open, last_updated, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(library.id)
        .bind(&library.name)
        .bind(library.current_occupancy)
        .bind(library.max_capacity)
        .bind(library.is_open)
        .bind(library.last_updated)
        .bind(library.updated_by)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create library")
    }

    async fn save_library(&self, library: Library) -> Library {
        sqlx::query_as::<_, Library>(
            "UPDATE libraries SET name = $2, current_occupancy = $3, max_capacity = $4, \
             is_open = $5, last_updated = $6, updated_by = $7 WHERE id = $1 RETURNING *",
        )
        .bind(library.id)
        .bind(&library.name)
        .bind(library.current_occupancy)
        .bind(library.max_capacity)
        .bind(library.is_open)
        .bind(library.last_updated)
        .bind(library.updated_by)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to save library")
    }

    async fn list_labs(&self) -> Vec<Lab> {
        sqlx::query_as::<_, Lab>("SELECT * FROM labs ORDER BY building ASC, room_number ASC")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_labs error: {:?}", e);
                vec![]
            })
    }

    async fn get_lab(&self, id: Uuid) -> Option<Lab> {
        sqlx::query_as::<_, Lab>("SELECT * FROM labs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_lab error: {:?}", e);
                None
            })
    }

    async fn find_lab_by_room(&self, building: &str, room_number: &str) -> Option<Lab> {
        sqlx::query_as::<_, Lab>("SELECT * FROM labs WHERE building = $1 AND room_number = $2")
            .bind(building)
            .bind(room_number)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("find_lab_by_room error: {:?}", e);
                None
            })
    }

    async fn create_lab(&self, lab: Lab) -> Lab {
        sqlx::query_as::<_, Lab>(
            "INSERT INTO labs \
             (id, name, building, room_number, current_occupancy, max_capacity, is_available, \
              equipment_status, last_updated, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(lab.id)
        .bind(&lab.name)
        .bind(&lab.building)
        .bind(&lab.room_number)
        .bind(lab.current_occupancy)
        .bind(lab.max_capacity)
        .bind(lab.is_available)
        .bind(&lab.equipment_status)
        .bind(lab.last_updated)
        .bind(lab.updated_by)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create lab")
    }

    async fn save_lab(&self, lab: Lab) -> Lab {
        sqlx::query_as::<_, Lab>(
            "UPDATE labs SET name = $2, building = $3, room_number = $4, current_occupancy = $5, \
             max_capacity = $6, is_available = $7, equipment_status = $8, last_updated = $9, \
             updated_by = $10 WHERE id = $1 RETURNING *",
        )
        .bind(lab.id)
        .bind(&lab.name)
        .bind(&lab.building)
        .bind(&lab.room_number)
        .bind(lab.current_occupancy)
        .bind(lab.max_capacity)
        .bind(lab.is_available)
        .bind(&lab.equipment_status)
        .bind(lab.last_updated)
        .bind(lab.updated_by)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to save lab")
    }

    async fn list_classrooms(&self) -> Vec<Classroom> {
        sqlx::query_as::<_, Classroom>(
            "SELECT * FROM classrooms ORDER BY building ASC, room_number ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_classrooms error: {:?}", e);
            vec![]
        })
    }

    async fn get_classroom(&self, id: Uuid) -> Option<Classroom> {
        sqlx::query_as::<_, Classroom>("SELECT * FROM classrooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_classroom error: {:?}", e);
                None
            })
    }

    async fn find_classroom_by_room(
        &self,
        building: &str,
        room_number: &str,
    ) -> Option<Classroom> {
        sqlx::query_as::<_, Classroom>(
            "SELECT * FROM classrooms WHERE building = $1 AND room_number = $2",
        )
        .bind(building)
        .bind(room_number)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_classroom_by_room error: {:?}", e);
            None
        })
    }

    async fn create_classroom(&self, room: Classroom) -> Classroom {
        sqlx::query_as::<_, Classroom>(
            "INSERT INTO classrooms \
             (id, name, building, room_number, current_occupancy, max_capacity, is_available, \
              last_updated, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(room.id)
        .bind(&room.name)
        .bind(&room.building)
        .bind(&room.room_number)
        .bind(room.current_occupancy)
        .bind(room.max_capacity)
        .bind(room.is_available)
        .bind(room.last_updated)
        .bind(room.updated_by)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create classroom")
    }

    async fn save_classroom(&self, room: Classroom) -> Classroom {
        sqlx::query_as::<_, Classroom>(
            "UPDATE classrooms SET name = $2, building = $3, room_number = $4, \
             current_occupancy = $5, max_capacity = $6, is_available = $7, last_updated = $8, \
             updated_by = $9 WHERE id = $1 RETURNING *",
        )
        .bind(room.id)
        .bind(&room.name)
        .bind(&room.building)
        .bind(&room.room_number)
        .bind(room.current_occupancy)
        .bind(room.max_capacity)
        .bind(room.is_available)
        .bind(room.last_updated)
        .bind(room.updated_by)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to save classroom")
    }

    async fn create_update_request(
        &self,
        request: ResourceUpdateRequest,
    ) -> ResourceUpdateRequest {
        sqlx::query_as::<_, ResourceUpdateRequest>(
            "INSERT INTO resource_update_requests \
             (id, kind, resource_id, requested_by, requested_occupancy, requested_open, status, \
              requested_at, resolved_by, resolved_at, rejection_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(request.id)
        .bind(request.kind)
        .bind(request.resource_id)
        .bind(request.requested_by)
        .bind(request.requested_occupancy)
        .bind(request.requested_open)
        .bind(request.status)
        .bind(request.requested_at)
        .bind(request.resolved_by)
        .bind(request.resolved_at)
        .bind(&request.rejection_reason)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create update request")
    }

    async fn get_update_request(&self, id: Uuid) -> Option<ResourceUpdateRequest> {
        sqlx::query_as::<_, ResourceUpdateRequest>(
            "SELECT * FROM resource_update_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_update_request error: {:?}", e);
            None
        })
    }

    async fn list_pending_update_requests(&self) -> Vec<ResourceUpdateRequest> {
        sqlx::query_as::<_, ResourceUpdateRequest>(
            "SELECT * FROM resource_update_requests WHERE status = $1 \
             ORDER BY requested_at DESC",
        )
        .bind(RequestStatus::Pending)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_pending_update_requests error: {:?}", e);
            vec![]
        })
    }

    async fn resolve_update_request(&self, id: Uuid, resolution: &Resolution) -> bool {
        match sqlx::query(
            "UPDATE resource_update_requests \
             SET status = $2, resolved_by = $3, resolved_at = $4, rejection_reason = $5 \
             WHERE id = $1 AND status = $6",
        )
        .bind(id)
        .bind(resolution.terminal_status())
        .bind(resolution.resolved_by)
        .bind(resolution.resolved_at)
        .bind(&resolution.rejection_reason)
        .bind(RequestStatus::Pending)
        .execute(&self.pool)
        .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("resolve_update_request error: {:?}", e);
                false
            }
        }
    }

    async fn create_fault(&self, report: FaultReport) -> FaultReport {
        sqlx::query_as::<_, FaultReport>(
            "INSERT INTO fault_reports \
             (id, reporter_id, title, description, location_type, building, room_number, \
              category, severity, status, assigned_to, resolution_notes, created_at, updated_at, \
              resolved_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING *",
        )
        .bind(report.id)
        .bind(report.reporter_id)
        .bind(&report.title)
        .bind(&report.description)
        .bind(report.location_type)
        .bind(&report.building)
        .bind(&report.room_number)
        .bind(report.category)
        .bind(report.severity)
        .bind(report.status)
        .bind(&report.assigned_to)
        .bind(&report.resolution_notes)
        .bind(report.created_at)
        .bind(report.updated_at)
        .bind(report.resolved_at)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create fault report")
    }

    async fn get_fault(&self, id: Uuid) -> Option<FaultReport> {
        sqlx::query_as::<_, FaultReport>("SELECT * FROM fault_reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_fault error: {:?}", e);
                None
            })
    }

    async fn list_faults(&self) -> Vec<FaultReport> {
        sqlx::query_as::<_, FaultReport>(
            "SELECT * FROM fault_reports ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_faults error: {:?}", e);
            vec![]
        })
    }

    async fn list_faults_by_reporter(&self, reporter_id: Uuid) -> Vec<FaultReport> {
        sqlx::query_as::<_, FaultReport>(
            "SELECT * FROM fault_reports WHERE reporter_id = $1 ORDER BY created_at DESC",
        )
        .bind(reporter_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_faults_by_reporter error: {:?}", e);
            vec![]
        })
    }

    async fn save_fault(&self, report: FaultReport) -> FaultReport {
        sqlx::query_as::<_, FaultReport>(
            "UPDATE fault_reports SET status = $2, assigned_to = $3, resolution_notes = $4, \
             updated_at = $5, resolved_at = $6 WHERE id = $1 RETURNING *",
        )
        .bind(report.id)
        .bind(report.status)
        .bind(&report.assigned_to)
        .bind(&report.resolution_notes)
        .bind(report.updated_at)
        .bind(report.resolved_at)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to save fault report")
    }

    async fn create_room_request(&self, request: RoomRequest) -> RoomRequest {
        sqlx::query_as::<_, RoomRequest>(
            "INSERT INTO room_requests \
             (id, requested_by, room_type, purpose, expected_attendees, requested_date, \
              start_time, end_time, room_id, status, requested_at, resolved_by, resolved_at, \
              rejection_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING *",
        )
        .bind(request.id)
        .bind(request.requested_by)
        .bind(request.room_type)
        .bind(&request.purpose)
        .bind(request.expected_attendees)
        .bind(request.requested_date)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.room_id)
        .bind(request.status)
        .bind(request.requested_at)
        .bind(request.resolved_by)
        .bind(request.resolved_at)
        .bind(&request.rejection_reason)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create room request")
    }

    async fn get_room_request(&self, id: Uuid) -> Option<RoomRequest> {
        sqlx::query_as::<_, RoomRequest>("SELECT * FROM room_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_room_request error: {:?}", e);
                None
            })
    }

    async fn list_room_requests(&self) -> Vec<RoomRequest> {
        sqlx::query_as::<_, RoomRequest>(
            "SELECT * FROM room_requests ORDER BY requested_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_room_requests error: {:?}", e);
            vec![]
        })
    }

    async fn list_room_requests_by_requester(&self, user_id: Uuid) -> Vec<RoomRequest> {
        sqlx::query_as::<_, RoomRequest>(
            "SELECT * FROM room_requests WHERE requested_by = $1 ORDER BY requested_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_room_requests_by_requester error: {:?}", e);
            vec![]
        })
    }

    async fn resolve_room_request(
        &self,
        id: Uuid,
        resolution: &Resolution,
        assign_room: Option<Uuid>,
    ) -> bool {
        match sqlx::query(
            "UPDATE room_requests \
             SET status = $2, resolved_by = $3, resolved_at = $4, rejection_reason = $5, \
                 room_id = COALESCE($6, room_id) \
             WHERE id = $1 AND status = $7",
        )
        .bind(id)
        .bind(resolution.terminal_status())
        .bind(resolution.resolved_by)
        .bind(resolution.resolved_at)
        .bind(&resolution.rejection_reason)
        .bind(assign_room)
        .bind(RequestStatus::Pending)
        .execute(&self.pool)
        .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("resolve_room_request error: {:?}", e);
                false
            }
        }
    }

    /// Compiles all counters for the administrative dashboard.
    async fn get_stats(&self) -> AdminDashboardStats {
        async fn count(pool: &PgPool, sql: &str) -> i64 {
            sqlx::query_scalar::<_, i64>(sql)
                .fetch_one(pool)
                .await
                .unwrap_or(0)
        }

        async fn count_role(pool: &PgPool, role: Role) -> i64 {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles WHERE role = $1")
                .bind(role)
                .fetch_one(pool)
                .await
                .unwrap_or(0)
        }

        AdminDashboardStats {
            users: UserRoleCounts {
                total: count(&self.pool, "SELECT COUNT(*) FROM users").await,
                students: count_role(&self.pool, Role::Student).await,
                lecturers: count_role(&self.pool, Role::Lecturer).await,
                managers: count_role(&self.pool, Role::Manager).await,
                admins: count_role(&self.pool, Role::Admin).await,
            },
            pending_role_requests: count(
                &self.pool,
                "SELECT COUNT(*) FROM role_requests WHERE status = 'pending'",
            )
            .await,
            faults: FaultCounts {
                total: count(&self.pool, "SELECT COUNT(*) FROM fault_reports").await,
                open: count(
                    &self.pool,
                    "SELECT COUNT(*) FROM fault_reports WHERE status IN ('open', 'in_progress')",
                )
                .await,
            },
        }
    }
}

// --- In-Memory Implementation ---

/// MemoryRepository
///
/// A fully functional in-memory implementation of `Repository`, used by the
/// integration tests and local experimentation. All state lives behind a
/// single mutex, which also makes every resolve a natural compare-and-swap:
/// the status check and the write happen under one lock acquisition.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, Profile>,
    role_requests: HashMap<Uuid, RoleRequest>,
    libraries: HashMap<Uuid, Library>,
    labs: HashMap<Uuid, Lab>,
    classrooms: HashMap<Uuid, Classroom>,
    update_requests: HashMap<Uuid, ResourceUpdateRequest>,
    faults: HashMap<Uuid, FaultReport>,
    room_requests: HashMap<Uuid, RoomRequest>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock means a panic mid-mutation in another test thread;
        // the data is still usable for assertions.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.lock().users.get(&id).cloned()
    }

    async fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.lock().users.values().find(|u| u.email == email).cloned()
    }

    async fn create_user(&self, user: User) -> User {
        self.lock().users.insert(user.id, user.clone());
        user
    }

    async fn list_accounts(&self) -> Vec<UserAccount> {
        let state = self.lock();
        let mut users: Vec<&User> = state.users.values().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        users
            .into_iter()
            .map(|user| {
                let profile = state.profiles.get(&user.id).cloned().unwrap_or(Profile {
                    user_id: user.id,
                    ..Profile::default()
                });
                UserAccount::from_parts(user, &profile)
            })
            .collect()
    }

    async fn get_or_create_profile(&self, user_id: Uuid) -> Profile {
        self.lock()
            .profiles
            .entry(user_id)
            .or_insert_with(|| Profile {
                user_id,
                ..Profile::default()
            })
            .clone()
    }

    async fn save_profile(&self, profile: Profile) -> Profile {
        self.lock().profiles.insert(profile.user_id, profile.clone());
        profile
    }

    async fn find_pending_role_request(&self, user_id: Uuid, role: Role) -> Option<RoleRequest> {
        self.lock()
            .role_requests
            .values()
            .find(|r| {
                r.user_id == user_id
                    && r.requested_role == role
                    && r.status == RequestStatus::Pending
            })
            .cloned()
    }

    async fn create_role_request(&self, request: RoleRequest) -> RoleRequest {
        self.lock().role_requests.insert(request.id, request.clone());
        request
    }

    async fn get_role_request(&self, id: Uuid) -> Option<RoleRequest> {
        self.lock().role_requests.get(&id).cloned()
    }

    async fn list_role_requests(&self) -> Vec<RoleRequest> {
        let mut requests: Vec<RoleRequest> =
            self.lock().role_requests.values().cloned().collect();
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        requests
    }

    async fn resolve_role_request(&self, id: Uuid, resolution: &Resolution) -> bool {
        let mut state = self.lock();
        match state.role_requests.get_mut(&id) {
            Some(request) if request.status == RequestStatus::Pending => {
                request.status = resolution.terminal_status();
                request.resolved_by = Some(resolution.resolved_by);
                request.resolved_at = Some(resolution.resolved_at);
                request.rejection_reason = resolution.rejection_reason.clone();
                true
            }
            _ => false,
        }
    }

    async fn list_libraries(&self) -> Vec<Library> {
        let mut libraries: Vec<Library> = self.lock().libraries.values().cloned().collect();
        libraries.sort_by(|a, b| a.name.cmp(&b.name));
        libraries
    }

    async fn get_library(&self, id: Uuid) -> Option<Library> {
        self.lock().libraries.get(&id).cloned()
    }

    async fn find_library_by_name(&self, name: &str) -> Option<Library> {
        self.lock().libraries.values().find(|l| l.name == name).cloned()
    }

    async fn create_library(&self, library: Library) -> Library {
        self.lock().libraries.insert(library.id, library.clone());
        library
    }

    async fn save_library(&self, library: Library) -> Library {
        self.lock().libraries.insert(library.id, library.clone());
        library
    }

    async fn list_labs(&self) -> Vec<Lab> {
        let mut labs: Vec<Lab> = self.lock().labs.values().cloned().collect();
        labs.sort_by(|a, b| {
            (a.building.as_str(), a.room_number.as_str())
                .cmp(&(b.building.as_str(), b.room_number.as_str()))
        });
        labs
    }

    async fn get_lab(&self, id: Uuid) -> Option<Lab> {
        self.lock().labs.get(&id).cloned()
    }

    async fn find_lab_by_room(&self, building: &str, room_number: &str) -> Option<Lab> {
        self.lock()
            .labs
            .values()
            .find(|l| l.building == building && l.room_number == room_number)
            .cloned()
    }

    async fn create_lab(&self, lab: Lab) -> Lab {
        self.lock().labs.insert(lab.id, lab.clone());
        lab
    }

    async fn save_lab(&self, lab: Lab) -> Lab {
        self.lock().labs.insert(lab.id, lab.clone());
        lab
    }

    async fn list_classrooms(&self) -> Vec<Classroom> {
        let mut rooms: Vec<Classroom> = self.lock().classrooms.values().cloned().collect();
        rooms.sort_by(|a, b| {
            (a.building.as_str(), a.room_number.as_str())
                .cmp(&(b.building.as_str(), b.room_number.as_str()))
        });
        rooms
    }

    async fn get_classroom(&self, id: Uuid) -> Option<Classroom> {
        self.lock().classrooms.get(&id).cloned()
    }

    async fn find_classroom_by_room(
        &self,
        building: &str,
        room_number: &str,
    ) -> Option<Classroom> {
        self.lock()
            .classrooms
            .values()
            .find(|c| c.building == building && c.room_number == room_number)
            .cloned()
    }

    async fn create_classroom(&self, room: Classroom) -> Classroom {
        self.lock().classrooms.insert(room.id, room.clone());
        room
    }

    async fn save_classroom(&self, room: Classroom) -> Classroom {
        self.lock().classrooms.insert(room.id, room.clone());
        room
    }

    async fn create_update_request(
        &self,
        request: ResourceUpdateRequest,
    ) -> ResourceUpdateRequest {
        self.lock().update_requests.insert(request.id, request.clone());
        request
    }

    async fn get_update_request(&self, id: Uuid) -> Option<ResourceUpdateRequest> {
        self.lock().update_requests.get(&id).cloned()
    }

    async fn list_pending_update_requests(&self) -> Vec<ResourceUpdateRequest> {
        let mut requests: Vec<ResourceUpdateRequest> = self
            .lock()
            .update_requests
            .values()
            .filter(|r| r.status == RequestStatus::Pending)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        requests
    }

    async fn resolve_update_request(&self, id: Uuid, resolution: &Resolution) -> bool {
        let mut state = self.lock();
        match state.update_requests.get_mut(&id) {
            Some(request) if request.status == RequestStatus::Pending => {
                request.status = resolution.terminal_status();
                request.resolved_by = Some(resolution.resolved_by);
                request.resolved_at = Some(resolution.resolved_at);
                request.rejection_reason = resolution.rejection_reason.clone();
                true
            }
            _ => false,
        }
    }

    async fn create_fault(&self, report: FaultReport) -> FaultReport {
        self.lock().faults.insert(report.id, report.clone());
        report
    }

    async fn get_fault(&self, id: Uuid) -> Option<FaultReport> {
        self.lock().faults.get(&id).cloned()
    }

    async fn list_faults(&self) -> Vec<FaultReport> {
        let mut faults: Vec<FaultReport> = self.lock().faults.values().cloned().collect();
        faults.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        faults
    }

    async fn list_faults_by_reporter(&self, reporter_id: Uuid) -> Vec<FaultReport> {
        let mut faults: Vec<FaultReport> = self
            .lock()
            .faults
            .values()
            .filter(|f| f.reporter_id == reporter_id)
            .cloned()
            .collect();
        faults.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        faults
    }

    async fn save_fault(&self, report: FaultReport) -> FaultReport {
        self.lock().faults.insert(report.id, report.clone());
        report
    }

    async fn create_room_request(&self, request: RoomRequest) -> RoomRequest {
        self.lock().room_requests.insert(request.id, request.clone());
        request
    }

    async fn get_room_request(&self, id: Uuid) -> Option<RoomRequest> {
        self.lock().room_requests.get(&id).cloned()
    }

    async fn list_room_requests(&self) -> Vec<RoomRequest> {
        let mut requests: Vec<RoomRequest> =
            self.lock().room_requests.values().cloned().collect();
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        requests
    }

    async fn list_room_requests_by_requester(&self, user_id: Uuid) -> Vec<RoomRequest> {
        let mut requests: Vec<RoomRequest> = self
            .lock()
            .room_requests
            .values()
            .filter(|r| r.requested_by == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        requests
    }

    async fn resolve_room_request(
        &self,
        id: Uuid,
        resolution: &Resolution,
        assign_room: Option<Uuid>,
    ) -> bool {
        let mut state = self.lock();
        match state.room_requests.get_mut(&id) {
            Some(request) if request.status == RequestStatus::Pending => {
                request.status = resolution.terminal_status();
                request.resolved_by = Some(resolution.resolved_by);
                request.resolved_at = Some(resolution.resolved_at);
                request.rejection_reason = resolution.rejection_reason.clone();
                if assign_room.is_some() {
                    request.room_id = assign_room;
                }
                true
            }
            _ => false,
        }
    }

    async fn get_stats(&self) -> AdminDashboardStats {
        let state = self.lock();

        let count_role = |role: Role| -> i64 {
            state.profiles.values().filter(|p| p.role == role).count() as i64
        };

        AdminDashboardStats {
            users: UserRoleCounts {
                total: state.users.len() as i64,
                students: count_role(Role::Student),
                lecturers: count_role(Role::Lecturer),
                managers: count_role(Role::Manager),
                admins: count_role(Role::Admin),
            },
            pending_role_requests: state
                .role_requests
                .values()
                .filter(|r| r.status == RequestStatus::Pending)
                .count() as i64,
            faults: FaultCounts {
                total: state.faults.len() as i64,
                open: state
                    .faults
                    .values()
                    .filter(|f| {
                        matches!(f.status, FaultStatus::Open | FaultStatus::InProgress)
                    })
                    .count() as i64,
            },
        }
    }
}
