use crate::{
    AppState,
    auth::{AuthUser, hash_password, issue_token, verify_password},
    error::{ApiError, ApiResult},
    models::{
        self, AdminDashboardStats, ApproveRoomRequestPayload, AssignedRoom, Classroom,
        ClassroomList, ClassroomUpdateOutcome, ClassroomView, CreateClassroomRequest,
        CreateFaultRequest, CreateLabRequest, CreateLibraryRequest, CreateRoomRequestPayload,
        FaultList, FaultReport, FaultStatus, FaultUpdatePayload, FaultView, Lab, LabList,
        LabUpdateOutcome, LabView, Library, LibraryList, LibraryUpdateOutcome,
        LibraryUpdatePayload, LibraryView, PendingUpdatesResponse, RegisterRequest,
        RejectPayload, RequestStatus, ResourceKind, ResourceUpdateRequest, Role,
        RoleChangeRequest, RoleChangeResponse, RoleRequest, RoleRequestList, RoleRequestView,
        RoomRequest, RoomRequestList, RoomRequestView, RoomType, RoomUpdatePayload, UpdateStatus,
        UserAccount, UserEnvelope, UserList,
    },
    repository::RepositoryState,
    workflow::{self, ResourceChanges, Resolution, apply_changes},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use std::str::FromStr;
use uuid::Uuid;

/// Roles permitted to administer resources and resolve pending requests.
const PRIVILEGED: &[Role] = &[Role::Manager, Role::Admin];

// --- View Assembly Helpers ---

/// Loads a user's full account (identity + profile) for response payloads.
async fn account_for(repo: &RepositoryState, user_id: Uuid) -> Option<UserAccount> {
    let user = repo.get_user(user_id).await?;
    let profile = repo.get_or_create_profile(user_id).await;
    Some(UserAccount::from_parts(&user, &profile))
}

/// Resolves a user reference to an email for enriched views; absent users
/// (deleted accounts) degrade to None rather than failing the listing.
async fn email_of(repo: &RepositoryState, user_id: Option<Uuid>) -> Option<String> {
    let id = user_id?;
    repo.get_user(id).await.map(|u| u.email)
}

async fn fault_view(repo: &RepositoryState, report: &FaultReport) -> FaultView {
    let reporter_email = email_of(repo, Some(report.reporter_id)).await.unwrap_or_default();
    FaultView::from_report(report, reporter_email)
}

async fn role_request_view(repo: &RepositoryState, request: &RoleRequest) -> RoleRequestView {
    RoleRequestView {
        id: request.id,
        user_id: request.user_id,
        user_email: email_of(repo, Some(request.user_id)).await.unwrap_or_default(),
        requested_role: request.requested_role,
        manager_type: request.manager_type.clone(),
        reason: request.reason.clone(),
        status: request.status,
        requested_at: request.requested_at,
        resolved_by: email_of(repo, request.resolved_by).await,
        resolved_at: request.resolved_at,
        rejection_reason: request.rejection_reason.clone(),
    }
}

/// Fetches the concrete room attached to a room request, if any.
async fn assigned_room_for(repo: &RepositoryState, request: &RoomRequest) -> Option<AssignedRoom> {
    let room_id = request.room_id?;
    match request.room_type {
        RoomType::Classroom => repo.get_classroom(room_id).await.map(|c| AssignedRoom {
            id: c.id,
            name: c.name,
            building: c.building,
            room_number: c.room_number,
            kind: ResourceKind::Classroom,
        }),
        RoomType::Lab => repo.get_lab(room_id).await.map(|l| AssignedRoom {
            id: l.id,
            name: l.name,
            building: l.building,
            room_number: l.room_number,
            kind: ResourceKind::Lab,
        }),
    }
}

async fn room_request_view(repo: &RepositoryState, request: &RoomRequest) -> RoomRequestView {
    RoomRequestView {
        id: request.id,
        room_type: request.room_type,
        purpose: request.purpose.clone(),
        expected_attendees: request.expected_attendees,
        requested_date: request.requested_date,
        start_time: request.start_time,
        end_time: request.end_time,
        status: request.status,
        requested_by: email_of(repo, Some(request.requested_by)).await.unwrap_or_default(),
        requested_at: request.requested_at,
        assigned_room: assigned_room_for(repo, request).await,
        resolved_by: email_of(repo, request.resolved_by).await,
        resolved_at: request.resolved_at,
        rejection_reason: request.rejection_reason.clone(),
    }
}

// --- Account Handlers ---

/// register_user
///
/// [Public Route] Creates a new account from email + password, hashes the
/// password, provisions the default profile, and returns a fresh bearer token
/// alongside the account.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = models::AuthResponse),
        (status = 400, description = "Missing email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<models::AuthResponse>)> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    }

    if state.repo.find_user_by_email(&email).await.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let user = state
        .repo
        .create_user(models::User {
            id: Uuid::new_v4(),
            email,
            password_hash: hash_password(&payload.password)?,
            created_at: Utc::now(),
        })
        .await;
    let profile = state.repo.get_or_create_profile(user.id).await;

    let token = issue_token(user.id, &state.config)?;
    Ok((
        StatusCode::CREATED,
        Json(models::AuthResponse {
            token,
            user: UserAccount::from_parts(&user, &profile),
        }),
    ))
}

/// login_user
///
/// [Public Route] Verifies email + password and returns a fresh bearer token.
/// Unknown email and wrong password are indistinguishable to the client.
#[utoipa::path(
    post,
    path = "/login",
    request_body = models::LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = models::AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<models::LoginRequest>,
) -> ApiResult<Json<models::AuthResponse>> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    }

    let user = state
        .repo
        .find_user_by_email(&email)
        .await
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let profile = state.repo.get_or_create_profile(user.id).await;
    let token = issue_token(user.id, &state.config)?;
    Ok(Json(models::AuthResponse {
        token,
        user: UserAccount::from_parts(&user, &profile),
    }))
}

/// get_me
///
/// [Authenticated Route] Returns the caller's account and profile fields.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserEnvelope))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<UserEnvelope>> {
    let user = account_for(&state.repo, id).await.ok_or(ApiError::Unauthorized)?;
    Ok(Json(UserEnvelope { user }))
}

/// set_role
///
/// [Authenticated Route] Role self-service. `student` applies immediately;
/// `lecturer`/`manager` create (or return the existing) pending role request
/// and keep the caller's effective role at student until an admin decides.
/// An admin's role is immutable here: the call is a no-op returning the
/// current state.
#[utoipa::path(
    post,
    path = "/role",
    request_body = RoleChangeRequest,
    responses(
        (status = 200, description = "Role applied or request recorded", body = RoleChangeResponse),
        (status = 400, description = "Invalid role")
    )
)]
pub async fn set_role(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<RoleChangeRequest>,
) -> ApiResult<Json<RoleChangeResponse>> {
    let requested = payload.role.trim().to_lowercase();
    let role = Role::from_str(&requested)
        .ok()
        // Admin is never requestable through self-service.
        .filter(|r| *r != Role::Admin)
        .ok_or_else(|| ApiError::InvalidInput("Invalid role".to_string()))?;

    let mut profile = state.repo.get_or_create_profile(id).await;

    if profile.role == Role::Admin {
        let user = account_for(&state.repo, id).await.ok_or(ApiError::Unauthorized)?;
        return Ok(Json(RoleChangeResponse {
            user,
            pending_request: false,
            request_id: None,
            message: Some("Admin role cannot be changed".to_string()),
        }));
    }

    if role == Role::Student {
        profile.role = Role::Student;
        state.repo.save_profile(profile).await;
        let user = account_for(&state.repo, id).await.ok_or(ApiError::Unauthorized)?;
        return Ok(Json(RoleChangeResponse {
            user,
            pending_request: false,
            request_id: None,
            message: None,
        }));
    }

    // One pending request per (user, role): an identical re-request returns
    // the existing row instead of duplicating it.
    if let Some(existing) = state.repo.find_pending_role_request(id, role).await {
        let user = account_for(&state.repo, id).await.ok_or(ApiError::Unauthorized)?;
        return Ok(Json(RoleChangeResponse {
            user,
            pending_request: true,
            request_id: Some(existing.id),
            message: Some("You already have a pending request for this role".to_string()),
        }));
    }

    let manager_type = if role == Role::Manager {
        payload
            .manager_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    } else {
        None
    };

    let request = state
        .repo
        .create_role_request(RoleRequest {
            id: Uuid::new_v4(),
            user_id: id,
            requested_role: role,
            manager_type,
            reason: payload
                .reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
            resolved_by: None,
            resolved_at: None,
            rejection_reason: None,
        })
        .await;

    // The caller keeps working as a student until the request is decided.
    profile.role = Role::Student;
    state.repo.save_profile(profile).await;

    let user = account_for(&state.repo, id).await.ok_or(ApiError::Unauthorized)?;
    Ok(Json(RoleChangeResponse {
        user,
        pending_request: true,
        request_id: Some(request.id),
        message: Some(format!(
            "Your request to become a {role} is pending admin approval. \
             You can use the system as a student for now."
        )),
    }))
}

// --- Library Handlers ---

/// list_libraries
///
/// [Public Route] Lists all libraries ordered by name.
#[utoipa::path(
    get,
    path = "/libraries",
    responses((status = 200, description = "Libraries", body = LibraryList))
)]
pub async fn list_libraries(State(state): State<AppState>) -> Json<LibraryList> {
    let libraries = state
        .repo
        .list_libraries()
        .await
        .iter()
        .map(LibraryView::from)
        .collect();
    Json(LibraryList { libraries })
}

/// create_library
///
/// [Manager Route] Creates a library. Name must be present and unique;
/// capacity must be positive.
#[utoipa::path(
    post,
    path = "/libraries",
    request_body = CreateLibraryRequest,
    responses(
        (status = 201, description = "Created", body = LibraryView),
        (status = 400, description = "Validation failure"),
        (status = 403, description = "Not a manager or admin"),
        (status = 409, description = "Duplicate name")
    )
)]
pub async fn create_library(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateLibraryRequest>,
) -> ApiResult<(StatusCode, Json<LibraryView>)> {
    auth.require(PRIVILEGED, "Manager or admin access required")?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("Library name is required".to_string()));
    }
    if payload.max_capacity <= 0 {
        return Err(ApiError::InvalidInput(
            "Max capacity must be greater than 0".to_string(),
        ));
    }
    if state.repo.find_library_by_name(&name).await.is_some() {
        return Err(ApiError::Conflict(
            "Library with this name already exists".to_string(),
        ));
    }

    let library = state
        .repo
        .create_library(Library {
            id: Uuid::new_v4(),
            name,
            current_occupancy: payload.current_occupancy,
            max_capacity: payload.max_capacity,
            is_open: payload.is_open,
            last_updated: Utc::now(),
            updated_by: Some(auth.id),
        })
        .await;

    Ok((StatusCode::CREATED, Json(LibraryView::from(&library))))
}

/// update_library
///
/// [Authenticated Route] The two-tier update path. Managers and admins apply
/// changes directly (including renames and capacity changes); everyone else
/// gets a pending update request capturing exactly the requested fields, and
/// the response carries the *current* entity state.
#[utoipa::path(
    post,
    path = "/libraries/{id}/update",
    params(("id" = Uuid, Path, description = "Library ID")),
    request_body = LibraryUpdatePayload,
    responses(
        (status = 200, description = "Applied or pending", body = LibraryUpdateOutcome),
        (status = 404, description = "Library not found")
    )
)]
pub async fn update_library(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LibraryUpdatePayload>,
) -> ApiResult<Json<LibraryUpdateOutcome>> {
    let mut library = state
        .repo
        .get_library(id)
        .await
        .ok_or_else(|| ApiError::NotFound("Library not found".to_string()))?;

    let changes = ResourceChanges {
        current_occupancy: payload.current_occupancy,
        open: payload.is_open,
    };

    if auth.role.is_privileged() {
        // Renames are a direct-path privilege; uniqueness is re-checked.
        if let Some(name) = payload.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            if name != library.name {
                if let Some(existing) = state.repo.find_library_by_name(name).await {
                    if existing.id != library.id {
                        return Err(ApiError::Conflict(
                            "Library with this name already exists".to_string(),
                        ));
                    }
                }
                library.name = name.to_string();
            }
        }
        if let Some(capacity) = payload.max_capacity {
            if capacity > 0 {
                library.max_capacity = capacity;
            }
        }

        apply_changes(&mut library, &changes, auth.id);
        let library = state.repo.save_library(library).await;
        return Ok(Json(LibraryUpdateOutcome {
            status: UpdateStatus::Applied,
            request_id: None,
            library: LibraryView::from(&library),
        }));
    }

    if changes.is_empty() {
        return Err(ApiError::InvalidInput("No changes specified".to_string()));
    }

    let request = state
        .repo
        .create_update_request(workflow::pending_update_for::<Library>(
            library.id, auth.id, &changes,
        ))
        .await;

    Ok(Json(LibraryUpdateOutcome {
        status: UpdateStatus::Pending,
        request_id: Some(request.id),
        // Current values: the caller's write has not taken effect.
        library: LibraryView::from(&library),
    }))
}

// --- Lab Handlers ---

/// list_labs
///
/// [Public Route] Lists all labs ordered by building then room number.
#[utoipa::path(
    get,
    path = "/labs",
    responses((status = 200, description = "Labs", body = LabList))
)]
pub async fn list_labs(State(state): State<AppState>) -> Json<LabList> {
    let labs = state.repo.list_labs().await.iter().map(LabView::from).collect();
    Json(LabList { labs })
}

/// create_lab
///
/// [Manager Route] Creates a lab. Building and room number are required and
/// unique as a pair; the name defaults to "Lab {room}".
#[utoipa::path(
    post,
    path = "/labs",
    request_body = CreateLabRequest,
    responses(
        (status = 201, description = "Created", body = LabView),
        (status = 400, description = "Validation failure"),
        (status = 403, description = "Not a manager or admin"),
        (status = 409, description = "Duplicate building/room")
    )
)]
pub async fn create_lab(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateLabRequest>,
) -> ApiResult<(StatusCode, Json<LabView>)> {
    auth.require(PRIVILEGED, "Manager or admin access required")?;

    let building = payload.building.trim().to_string();
    let room_number = payload.room_number.trim().to_string();
    if building.is_empty() || room_number.is_empty() {
        return Err(ApiError::InvalidInput(
            "Building and room number are required".to_string(),
        ));
    }
    if payload.max_capacity <= 0 {
        return Err(ApiError::InvalidInput(
            "Max capacity must be greater than 0".to_string(),
        ));
    }
    if state
        .repo
        .find_lab_by_room(&building, &room_number)
        .await
        .is_some()
    {
        return Err(ApiError::Conflict("Lab already exists".to_string()));
    }

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Lab {room_number}"));

    let lab = state
        .repo
        .create_lab(Lab {
            id: Uuid::new_v4(),
            name,
            building,
            room_number,
            current_occupancy: payload.current_occupancy,
            max_capacity: payload.max_capacity,
            is_available: payload.is_available,
            equipment_status: payload.equipment_status,
            last_updated: Utc::now(),
            updated_by: Some(auth.id),
        })
        .await;

    Ok((StatusCode::CREATED, Json(LabView::from(&lab))))
}

/// update_lab
///
/// [Authenticated Route] Two-tier update for a lab: direct for managers and
/// admins, pending request otherwise.
#[utoipa::path(
    post,
    path = "/labs/{id}/update",
    params(("id" = Uuid, Path, description = "Lab ID")),
    request_body = RoomUpdatePayload,
    responses(
        (status = 200, description = "Applied or pending", body = LabUpdateOutcome),
        (status = 400, description = "No changes specified"),
        (status = 404, description = "Lab not found")
    )
)]
pub async fn update_lab(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RoomUpdatePayload>,
) -> ApiResult<Json<LabUpdateOutcome>> {
    let mut lab = state
        .repo
        .get_lab(id)
        .await
        .ok_or_else(|| ApiError::NotFound("Lab not found".to_string()))?;

    let changes = ResourceChanges {
        current_occupancy: payload.current_occupancy,
        open: payload.is_available,
    };

    if auth.role.is_privileged() {
        apply_changes(&mut lab, &changes, auth.id);
        let lab = state.repo.save_lab(lab).await;
        return Ok(Json(LabUpdateOutcome {
            status: UpdateStatus::Applied,
            request_id: None,
            lab: LabView::from(&lab),
        }));
    }

    if changes.is_empty() {
        return Err(ApiError::InvalidInput("No changes specified".to_string()));
    }

    let request = state
        .repo
        .create_update_request(workflow::pending_update_for::<Lab>(lab.id, auth.id, &changes))
        .await;

    Ok(Json(LabUpdateOutcome {
        status: UpdateStatus::Pending,
        request_id: Some(request.id),
        lab: LabView::from(&lab),
    }))
}

// --- Classroom Handlers ---

/// list_classrooms
///
/// [Public Route] Lists all classrooms ordered by building then room number.
#[utoipa::path(
    get,
    path = "/classrooms",
    responses((status = 200, description = "Classrooms", body = ClassroomList))
)]
pub async fn list_classrooms(State(state): State<AppState>) -> Json<ClassroomList> {
    let classrooms = state
        .repo
        .list_classrooms()
        .await
        .iter()
        .map(ClassroomView::from)
        .collect();
    Json(ClassroomList { classrooms })
}

/// create_classroom
///
/// [Manager Route] Creates a classroom; validation mirrors labs.
#[utoipa::path(
    post,
    path = "/classrooms",
    request_body = CreateClassroomRequest,
    responses(
        (status = 201, description = "Created", body = ClassroomView),
        (status = 400, description = "Validation failure"),
        (status = 403, description = "Not a manager or admin"),
        (status = 409, description = "Duplicate building/room")
    )
)]
pub async fn create_classroom(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateClassroomRequest>,
) -> ApiResult<(StatusCode, Json<ClassroomView>)> {
    auth.require(PRIVILEGED, "Manager or admin access required")?;

    let building = payload.building.trim().to_string();
    let room_number = payload.room_number.trim().to_string();
    if building.is_empty() || room_number.is_empty() {
        return Err(ApiError::InvalidInput(
            "Building and room number are required".to_string(),
        ));
    }
    if payload.max_capacity <= 0 {
        return Err(ApiError::InvalidInput(
            "Max capacity must be greater than 0".to_string(),
        ));
    }
    if state
        .repo
        .find_classroom_by_room(&building, &room_number)
        .await
        .is_some()
    {
        return Err(ApiError::Conflict("Classroom already exists".to_string()));
    }

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Classroom {room_number}"));

    let classroom = state
        .repo
        .create_classroom(Classroom {
            id: Uuid::new_v4(),
            name,
            building,
            room_number,
            current_occupancy: payload.current_occupancy,
            max_capacity: payload.max_capacity,
            is_available: payload.is_available,
            last_updated: Utc::now(),
            updated_by: Some(auth.id),
        })
        .await;

    Ok((StatusCode::CREATED, Json(ClassroomView::from(&classroom))))
}

/// update_classroom
///
/// [Authenticated Route] Two-tier update for a classroom. Classrooms route
/// through the same pending-request machinery as libraries and labs.
#[utoipa::path(
    post,
    path = "/classrooms/{id}/update",
    params(("id" = Uuid, Path, description = "Classroom ID")),
    request_body = RoomUpdatePayload,
    responses(
        (status = 200, description = "Applied or pending", body = ClassroomUpdateOutcome),
        (status = 400, description = "No changes specified"),
        (status = 404, description = "Classroom not found")
    )
)]
pub async fn update_classroom(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RoomUpdatePayload>,
) -> ApiResult<Json<ClassroomUpdateOutcome>> {
    let mut classroom = state
        .repo
        .get_classroom(id)
        .await
        .ok_or_else(|| ApiError::NotFound("Classroom not found".to_string()))?;

    let changes = ResourceChanges {
        current_occupancy: payload.current_occupancy,
        open: payload.is_available,
    };

    if auth.role.is_privileged() {
        apply_changes(&mut classroom, &changes, auth.id);
        let classroom = state.repo.save_classroom(classroom).await;
        return Ok(Json(ClassroomUpdateOutcome {
            status: UpdateStatus::Applied,
            request_id: None,
            classroom: ClassroomView::from(&classroom),
        }));
    }

    if changes.is_empty() {
        return Err(ApiError::InvalidInput("No changes specified".to_string()));
    }

    let request = state
        .repo
        .create_update_request(workflow::pending_update_for::<Classroom>(
            classroom.id,
            auth.id,
            &changes,
        ))
        .await;

    Ok(Json(ClassroomUpdateOutcome {
        status: UpdateStatus::Pending,
        request_id: Some(request.id),
        classroom: ClassroomView::from(&classroom),
    }))
}

// --- Update Review Queue Handlers ---

/// list_pending_updates
///
/// [Manager Route] The review queue: every pending resource-update request,
/// enriched with the target's identity and current values, grouped by kind.
/// Requests whose target has since disappeared are omitted.
#[utoipa::path(
    get,
    path = "/updates/pending",
    responses(
        (status = 200, description = "Pending update requests", body = PendingUpdatesResponse),
        (status = 403, description = "Not a manager or admin")
    )
)]
pub async fn list_pending_updates(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<PendingUpdatesResponse>> {
    auth.require(PRIVILEGED, "Manager or admin access required")?;

    let mut response = PendingUpdatesResponse::default();
    for request in state.repo.list_pending_update_requests().await {
        let requested_by = email_of(&state.repo, Some(request.requested_by))
            .await
            .unwrap_or_default();

        let view = match request.kind {
            ResourceKind::Library => {
                state.repo.get_library(request.resource_id).await.map(|lib| {
                    models::UpdateRequestView {
                        id: request.id,
                        kind: request.kind,
                        resource_id: lib.id,
                        resource_name: lib.name,
                        building: None,
                        room_number: None,
                        current_occupancy: lib.current_occupancy,
                        current_open: lib.is_open,
                        requested_occupancy: request.requested_occupancy,
                        requested_open: request.requested_open,
                        requested_by,
                        requested_at: request.requested_at,
                    }
                })
            }
            ResourceKind::Lab => state.repo.get_lab(request.resource_id).await.map(|lab| {
                models::UpdateRequestView {
                    id: request.id,
                    kind: request.kind,
                    resource_id: lab.id,
                    resource_name: lab.name,
                    building: Some(lab.building),
                    room_number: Some(lab.room_number),
                    current_occupancy: lab.current_occupancy,
                    current_open: lab.is_available,
                    requested_occupancy: request.requested_occupancy,
                    requested_open: request.requested_open,
                    requested_by,
                    requested_at: request.requested_at,
                }
            }),
            ResourceKind::Classroom => {
                state.repo.get_classroom(request.resource_id).await.map(|room| {
                    models::UpdateRequestView {
                        id: request.id,
                        kind: request.kind,
                        resource_id: room.id,
                        resource_name: room.name,
                        building: Some(room.building),
                        room_number: Some(room.room_number),
                        current_occupancy: room.current_occupancy,
                        current_open: room.is_available,
                        requested_occupancy: request.requested_occupancy,
                        requested_open: request.requested_open,
                        requested_by,
                        requested_at: request.requested_at,
                    }
                })
            }
        };

        if let Some(view) = view {
            match view.kind {
                ResourceKind::Library => response.library_requests.push(view),
                ResourceKind::Lab => response.lab_requests.push(view),
                ResourceKind::Classroom => response.classroom_requests.push(view),
            }
        }
    }

    response.total_pending = response.library_requests.len()
        + response.lab_requests.len()
        + response.classroom_requests.len();
    Ok(Json(response))
}

/// approve_update
///
/// [Manager Route] Approves a pending resource-update request: only the
/// fields captured at request time are applied; the claim on the request is
/// a compare-and-swap, so a request resolves at most once.
#[utoipa::path(
    post,
    path = "/updates/{kind}/{id}/approve",
    params(
        ("kind" = ResourceKind, Path, description = "Resource kind"),
        ("id" = Uuid, Path, description = "Update request ID")
    ),
    responses(
        (status = 200, description = "Approved and applied", body = ResourceUpdateRequest),
        (status = 400, description = "Request is not pending"),
        (status = 404, description = "Request or resource not found")
    )
)]
pub async fn approve_update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(ResourceKind, Uuid)>,
) -> ApiResult<Json<ResourceUpdateRequest>> {
    auth.require(PRIVILEGED, "Manager or admin access required")?;

    let request = state
        .repo
        .get_update_request(id)
        .await
        .filter(|r| r.kind == kind)
        .ok_or_else(|| ApiError::NotFound("Update request not found".to_string()))?;

    if request.status != RequestStatus::Pending {
        return Err(ApiError::InvalidState("Request is not pending".to_string()));
    }

    let changes = ResourceChanges::from(&request);

    // The target must still exist before the request is claimed.
    match request.kind {
        ResourceKind::Library => {
            let mut library = state
                .repo
                .get_library(request.resource_id)
                .await
                .ok_or_else(|| ApiError::NotFound("Library not found".to_string()))?;
            claim_update(&state, &request, auth.id).await?;
            apply_changes(&mut library, &changes, auth.id);
            state.repo.save_library(library).await;
        }
        ResourceKind::Lab => {
            let mut lab = state
                .repo
                .get_lab(request.resource_id)
                .await
                .ok_or_else(|| ApiError::NotFound("Lab not found".to_string()))?;
            claim_update(&state, &request, auth.id).await?;
            apply_changes(&mut lab, &changes, auth.id);
            state.repo.save_lab(lab).await;
        }
        ResourceKind::Classroom => {
            let mut classroom = state
                .repo
                .get_classroom(request.resource_id)
                .await
                .ok_or_else(|| ApiError::NotFound("Classroom not found".to_string()))?;
            claim_update(&state, &request, auth.id).await?;
            apply_changes(&mut classroom, &changes, auth.id);
            state.repo.save_classroom(classroom).await;
        }
    }

    let resolved = state
        .repo
        .get_update_request(id)
        .await
        .ok_or_else(|| ApiError::Internal("resolved update request vanished".to_string()))?;
    Ok(Json(resolved))
}

/// CAS claim on an update request; a lost claim means another resolver won.
async fn claim_update(
    state: &AppState,
    request: &ResourceUpdateRequest,
    approver: Uuid,
) -> ApiResult<()> {
    let resolution = Resolution::approved(approver);
    if state.repo.resolve_update_request(request.id, &resolution).await {
        Ok(())
    } else {
        Err(ApiError::InvalidState("Request is not pending".to_string()))
    }
}

/// reject_update
///
/// [Manager Route] Rejects a pending resource-update request; the target
/// entity is left untouched.
#[utoipa::path(
    post,
    path = "/updates/{kind}/{id}/reject",
    params(
        ("kind" = ResourceKind, Path, description = "Resource kind"),
        ("id" = Uuid, Path, description = "Update request ID")
    ),
    request_body = RejectPayload,
    responses(
        (status = 200, description = "Rejected", body = ResourceUpdateRequest),
        (status = 400, description = "Request is not pending"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn reject_update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(ResourceKind, Uuid)>,
    Json(payload): Json<RejectPayload>,
) -> ApiResult<Json<ResourceUpdateRequest>> {
    auth.require(PRIVILEGED, "Manager or admin access required")?;

    let request = state
        .repo
        .get_update_request(id)
        .await
        .filter(|r| r.kind == kind)
        .ok_or_else(|| ApiError::NotFound("Update request not found".to_string()))?;

    if request.status != RequestStatus::Pending {
        return Err(ApiError::InvalidState("Request is not pending".to_string()));
    }

    let resolution = Resolution::rejected(auth.id, payload.rejection_reason);
    if !state.repo.resolve_update_request(id, &resolution).await {
        return Err(ApiError::InvalidState("Request is not pending".to_string()));
    }

    let resolved = state
        .repo
        .get_update_request(id)
        .await
        .ok_or_else(|| ApiError::Internal("resolved update request vanished".to_string()))?;
    Ok(Json(resolved))
}

// --- Fault Report Handlers ---

/// list_faults
///
/// [Authenticated Route] Managers and admins see every report; everyone else
/// sees only their own. Newest first.
#[utoipa::path(
    get,
    path = "/faults",
    responses((status = 200, description = "Fault reports", body = FaultList))
)]
pub async fn list_faults(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<FaultList>> {
    let reports = if auth.role.is_privileged() {
        state.repo.list_faults().await
    } else {
        state.repo.list_faults_by_reporter(auth.id).await
    };

    let mut faults = Vec::with_capacity(reports.len());
    for report in &reports {
        faults.push(fault_view(&state.repo, report).await);
    }
    Ok(Json(FaultList { faults }))
}

/// create_fault
///
/// [Authenticated Route] Files a fault report attached to the caller as
/// reporter. Any authenticated role may report.
#[utoipa::path(
    post,
    path = "/faults",
    request_body = CreateFaultRequest,
    responses((status = 201, description = "Fault reported", body = FaultView))
)]
pub async fn create_fault(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateFaultRequest>,
) -> ApiResult<(StatusCode, Json<FaultView>)> {
    let now = Utc::now();
    let report = state
        .repo
        .create_fault(FaultReport {
            id: Uuid::new_v4(),
            reporter_id: auth.id,
            title: payload.title,
            description: payload.description,
            location_type: payload.location_type,
            building: payload.building,
            room_number: payload.room_number,
            category: payload.category,
            severity: payload.severity,
            status: FaultStatus::Open,
            assigned_to: None,
            resolution_notes: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        })
        .await;

    Ok((
        StatusCode::CREATED,
        Json(FaultView::from_report(&report, auth.email)),
    ))
}

/// get_fault
///
/// [Authenticated Route] Report detail: visible to the reporter and to
/// managers/admins.
#[utoipa::path(
    get,
    path = "/faults/{id}",
    params(("id" = Uuid, Path, description = "Fault report ID")),
    responses(
        (status = 200, description = "Fault report", body = FaultView),
        (status = 403, description = "Not the reporter"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn get_fault(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FaultView>> {
    let report = state
        .repo
        .get_fault(id)
        .await
        .ok_or_else(|| ApiError::NotFound("Report not found".to_string()))?;

    if !auth.role.is_privileged() && report.reporter_id != auth.id {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    Ok(Json(fault_view(&state.repo, &report).await))
}

/// update_fault
///
/// [Manager Route] Partial update of status / assignment / resolution notes.
/// The first transition into the terminal set stamps `resolved_at` exactly
/// once; later terminal-to-terminal moves never restamp it.
#[utoipa::path(
    patch,
    path = "/faults/{id}",
    params(("id" = Uuid, Path, description = "Fault report ID")),
    request_body = FaultUpdatePayload,
    responses(
        (status = 200, description = "Updated", body = FaultView),
        (status = 403, description = "Not a manager or admin"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn update_fault(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FaultUpdatePayload>,
) -> ApiResult<Json<FaultView>> {
    auth.require(PRIVILEGED, "Only managers and admins can update faults")?;

    let mut report = state
        .repo
        .get_fault(id)
        .await
        .ok_or_else(|| ApiError::NotFound("Fault not found".to_string()))?;

    if let Some(status) = payload.status {
        report.status = status;
        if status.is_terminal() && report.resolved_at.is_none() {
            report.resolved_at = Some(Utc::now());
        }
    }
    if let Some(assigned_to) = payload.assigned_to {
        report.assigned_to = Some(assigned_to);
    }
    if let Some(notes) = payload.resolution_notes {
        report.resolution_notes = Some(notes);
    }
    report.updated_at = Utc::now();

    let report = state.repo.save_fault(report).await;
    Ok(Json(fault_view(&state.repo, &report).await))
}

// --- Room Request Handlers ---

/// create_room_request
///
/// [Lecturer Route] Files a booking request for a classroom or lab. Dates and
/// times are validated here; a preferred room id is attached best-effort and
/// silently ignored when it does not name an existing room of that type.
#[utoipa::path(
    post,
    path = "/room-requests",
    request_body = CreateRoomRequestPayload,
    responses(
        (status = 201, description = "Request submitted", body = RoomRequestView),
        (status = 400, description = "Validation failure"),
        (status = 403, description = "Not a lecturer")
    )
)]
pub async fn create_room_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateRoomRequestPayload>,
) -> ApiResult<(StatusCode, Json<RoomRequestView>)> {
    auth.require(&[Role::Lecturer], "Only lecturers can request rooms")?;

    let room_type = RoomType::from_str(payload.room_type.trim().to_lowercase().as_str())
        .map_err(|_| {
            ApiError::InvalidInput(
                "Invalid room type. Must be 'classroom' or 'lab'".to_string(),
            )
        })?;

    let purpose = payload.purpose.trim().to_string();
    if purpose.is_empty() {
        return Err(ApiError::InvalidInput("Purpose is required".to_string()));
    }

    let (date_str, start_str, end_str) = match (
        payload.requested_date.as_deref().filter(|s| !s.is_empty()),
        payload.start_time.as_deref().filter(|s| !s.is_empty()),
        payload.end_time.as_deref().filter(|s| !s.is_empty()),
    ) {
        (Some(d), Some(s), Some(e)) => (d, s, e),
        _ => {
            return Err(ApiError::InvalidInput(
                "Date, start time, and end time are required".to_string(),
            ));
        }
    };

    let requested_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|e| ApiError::InvalidInput(format!("Invalid date or time format: {e}")))?;
    let start_time = NaiveTime::parse_from_str(start_str, "%H:%M")
        .map_err(|e| ApiError::InvalidInput(format!("Invalid date or time format: {e}")))?;
    let end_time = NaiveTime::parse_from_str(end_str, "%H:%M")
        .map_err(|e| ApiError::InvalidInput(format!("Invalid date or time format: {e}")))?;

    // Best-effort preferred-room attachment; a dangling id is not an error.
    let mut room_id = None;
    if let Some(preferred) = payload.room_id {
        let exists = match room_type {
            RoomType::Classroom => state.repo.get_classroom(preferred).await.is_some(),
            RoomType::Lab => state.repo.get_lab(preferred).await.is_some(),
        };
        if exists {
            room_id = Some(preferred);
        }
    }

    let request = state
        .repo
        .create_room_request(RoomRequest {
            id: Uuid::new_v4(),
            requested_by: auth.id,
            room_type,
            purpose,
            expected_attendees: payload.expected_attendees,
            requested_date,
            start_time,
            end_time,
            room_id,
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
            resolved_by: None,
            resolved_at: None,
            rejection_reason: None,
        })
        .await;

    Ok((
        StatusCode::CREATED,
        Json(room_request_view(&state.repo, &request).await),
    ))
}

/// list_room_requests
///
/// [Authenticated Route] Managers and admins see every booking request;
/// everyone else sees their own. Newest first.
#[utoipa::path(
    get,
    path = "/room-requests",
    responses((status = 200, description = "Room requests", body = RoomRequestList))
)]
pub async fn list_room_requests(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<RoomRequestList>> {
    let rows = if auth.role.is_privileged() {
        state.repo.list_room_requests().await
    } else {
        state.repo.list_room_requests_by_requester(auth.id).await
    };

    let mut requests = Vec::with_capacity(rows.len());
    for row in &rows {
        requests.push(room_request_view(&state.repo, row).await);
    }
    Ok(Json(RoomRequestList { requests }))
}

/// approve_room_request
///
/// [Manager Route] Approves a booking by assigning a concrete room: the room
/// must exist, be of the requested type, and be available. On success the
/// room's availability flag flips to false. There is no automatic release at
/// the booking's end time; availability is restored manually via the room
/// update endpoints.
#[utoipa::path(
    post,
    path = "/room-requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Room request ID")),
    request_body = ApproveRoomRequestPayload,
    responses(
        (status = 200, description = "Approved", body = RoomRequestView),
        (status = 400, description = "Missing room id or request not pending"),
        (status = 404, description = "Request or room not found"),
        (status = 409, description = "Room not available")
    )
)]
pub async fn approve_room_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveRoomRequestPayload>,
) -> ApiResult<Json<RoomRequestView>> {
    auth.require(PRIVILEGED, "Manager or admin access required")?;

    let request = state
        .repo
        .get_room_request(id)
        .await
        .ok_or_else(|| ApiError::NotFound("Room request not found".to_string()))?;

    if request.status != RequestStatus::Pending {
        return Err(ApiError::InvalidState("Request is not pending".to_string()));
    }

    let room_id = payload.room_id.ok_or_else(|| {
        ApiError::InvalidInput("Room ID is required to approve the request".to_string())
    })?;

    // Availability is checked up front; the flag is flipped only after the
    // claim on the request is won.
    match request.room_type {
        RoomType::Classroom => {
            let mut classroom = state
                .repo
                .get_classroom(room_id)
                .await
                .ok_or_else(|| ApiError::NotFound("Classroom not found".to_string()))?;
            if !classroom.is_available {
                return Err(ApiError::ResourceUnavailable(
                    "Selected classroom is not available".to_string(),
                ));
            }
            claim_room_request(&state, &request, auth.id, room_id).await?;
            classroom.is_available = false;
            classroom.updated_by = Some(auth.id);
            classroom.last_updated = Utc::now();
            state.repo.save_classroom(classroom).await;
        }
        RoomType::Lab => {
            let mut lab = state
                .repo
                .get_lab(room_id)
                .await
                .ok_or_else(|| ApiError::NotFound("Lab not found".to_string()))?;
            if !lab.is_available {
                return Err(ApiError::ResourceUnavailable(
                    "Selected lab is not available".to_string(),
                ));
            }
            claim_room_request(&state, &request, auth.id, room_id).await?;
            lab.is_available = false;
            lab.updated_by = Some(auth.id);
            lab.last_updated = Utc::now();
            state.repo.save_lab(lab).await;
        }
    }

    let resolved = state
        .repo
        .get_room_request(id)
        .await
        .ok_or_else(|| ApiError::Internal("resolved room request vanished".to_string()))?;
    Ok(Json(room_request_view(&state.repo, &resolved).await))
}

/// CAS claim on a room request, stamping the assigned room with the approval.
async fn claim_room_request(
    state: &AppState,
    request: &RoomRequest,
    approver: Uuid,
    room_id: Uuid,
) -> ApiResult<()> {
    let resolution = Resolution::approved(approver);
    if state
        .repo
        .resolve_room_request(request.id, &resolution, Some(room_id))
        .await
    {
        Ok(())
    } else {
        Err(ApiError::InvalidState("Request is not pending".to_string()))
    }
}

/// reject_room_request
///
/// [Manager Route] Rejects a booking request; no room state changes.
#[utoipa::path(
    post,
    path = "/room-requests/{id}/reject",
    params(("id" = Uuid, Path, description = "Room request ID")),
    request_body = RejectPayload,
    responses(
        (status = 200, description = "Rejected", body = RoomRequestView),
        (status = 400, description = "Request is not pending"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn reject_room_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> ApiResult<Json<RoomRequestView>> {
    auth.require(PRIVILEGED, "Manager or admin access required")?;

    let request = state
        .repo
        .get_room_request(id)
        .await
        .ok_or_else(|| ApiError::NotFound("Room request not found".to_string()))?;

    if request.status != RequestStatus::Pending {
        return Err(ApiError::InvalidState("Request is not pending".to_string()));
    }

    let resolution = Resolution::rejected(auth.id, payload.rejection_reason);
    if !state.repo.resolve_room_request(id, &resolution, None).await {
        return Err(ApiError::InvalidState("Request is not pending".to_string()));
    }

    let resolved = state
        .repo
        .get_room_request(id)
        .await
        .ok_or_else(|| ApiError::Internal("resolved room request vanished".to_string()))?;
    Ok(Json(room_request_view(&state.repo, &resolved).await))
}

// --- Admin Handlers ---

/// admin_users
///
/// [Admin Route] Lists every account with its profile fields, newest first.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All accounts", body = UserList),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn admin_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<UserList>> {
    auth.require(&[Role::Admin], "Admin access required")?;
    Ok(Json(UserList {
        users: state.repo.list_accounts().await,
    }))
}

/// admin_role_requests
///
/// [Admin Route] Lists every role request (all statuses), newest first,
/// enriched with user/approver emails.
#[utoipa::path(
    get,
    path = "/admin/role-requests",
    responses(
        (status = 200, description = "Role requests", body = RoleRequestList),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn admin_role_requests(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<RoleRequestList>> {
    auth.require(&[Role::Admin], "Admin access required")?;

    let rows = state.repo.list_role_requests().await;
    let mut requests = Vec::with_capacity(rows.len());
    for row in &rows {
        requests.push(role_request_view(&state.repo, row).await);
    }
    Ok(Json(RoleRequestList { requests }))
}

/// admin_approve_role
///
/// [Admin Route] Approves a pending role request: the claim on the request
/// is a compare-and-swap, then the target user's profile gets the requested
/// role (and manager type where applicable). Returns the updated account.
#[utoipa::path(
    post,
    path = "/admin/role-requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Role request ID")),
    responses(
        (status = 200, description = "Approved", body = UserEnvelope),
        (status = 400, description = "Request is not pending"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn admin_approve_role(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserEnvelope>> {
    auth.require(&[Role::Admin], "Admin access required")?;

    let request = state
        .repo
        .get_role_request(id)
        .await
        .ok_or_else(|| ApiError::NotFound("Role request not found".to_string()))?;

    if request.status != RequestStatus::Pending {
        return Err(ApiError::InvalidState("Request is not pending".to_string()));
    }

    let resolution = Resolution::approved(auth.id);
    if !state.repo.resolve_role_request(id, &resolution).await {
        return Err(ApiError::InvalidState("Request is not pending".to_string()));
    }

    let mut profile = state.repo.get_or_create_profile(request.user_id).await;
    profile.role = request.requested_role;
    if request.requested_role == Role::Manager && request.manager_type.is_some() {
        profile.manager_type = request.manager_type.clone();
    }
    state.repo.save_profile(profile).await;

    let user = account_for(&state.repo, request.user_id)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(UserEnvelope { user }))
}

/// admin_reject_role
///
/// [Admin Route] Rejects a pending role request; the profile is untouched.
#[utoipa::path(
    post,
    path = "/admin/role-requests/{id}/reject",
    params(("id" = Uuid, Path, description = "Role request ID")),
    request_body = RejectPayload,
    responses(
        (status = 200, description = "Rejected", body = RoleRequestView),
        (status = 400, description = "Request is not pending"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn admin_reject_role(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> ApiResult<Json<RoleRequestView>> {
    auth.require(&[Role::Admin], "Admin access required")?;

    let request = state
        .repo
        .get_role_request(id)
        .await
        .ok_or_else(|| ApiError::NotFound("Role request not found".to_string()))?;

    if request.status != RequestStatus::Pending {
        return Err(ApiError::InvalidState("Request is not pending".to_string()));
    }

    let resolution = Resolution::rejected(auth.id, payload.rejection_reason);
    if !state.repo.resolve_role_request(id, &resolution).await {
        return Err(ApiError::InvalidState("Request is not pending".to_string()));
    }

    let resolved = state
        .repo
        .get_role_request(id)
        .await
        .ok_or_else(|| ApiError::Internal("resolved role request vanished".to_string()))?;
    Ok(Json(role_request_view(&state.repo, &resolved).await))
}

/// admin_stats
///
/// [Admin Route] Core counters for the administrative dashboard.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Stats", body = AdminDashboardStats),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn admin_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<AdminDashboardStats>> {
    auth.require(&[Role::Admin], "Admin access required")?;
    Ok(Json(state.repo.get_stats().await))
}
