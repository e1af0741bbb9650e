use campus_facilities::{
    models::{
        FaultReport, FaultStatus, Lab, Library, RequestStatus, ResourceKind,
        ResourceUpdateRequest, Role, RoleRequest, RoomRequest, RoomType, User,
    },
    repository::{MemoryRepository, Repository},
    workflow::Resolution,
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

fn user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: "$argon2id$fake".to_string(),
        created_at: Utc::now(),
    }
}

fn library(name: &str) -> Library {
    Library {
        id: Uuid::new_v4(),
        name: name.to_string(),
        current_occupancy: 0,
        max_capacity: 100,
        is_open: true,
        last_updated: Utc::now(),
        updated_by: None,
    }
}

fn lab(building: &str, room: &str) -> Lab {
    Lab {
        id: Uuid::new_v4(),
        name: format!("Lab {room}"),
        building: building.to_string(),
        room_number: room.to_string(),
        current_occupancy: 0,
        max_capacity: 30,
        is_available: true,
        equipment_status: String::new(),
        last_updated: Utc::now(),
        updated_by: None,
    }
}

fn role_request(user_id: Uuid, role: Role) -> RoleRequest {
    RoleRequest {
        id: Uuid::new_v4(),
        user_id,
        requested_role: role,
        manager_type: None,
        reason: None,
        status: RequestStatus::Pending,
        requested_at: Utc::now(),
        resolved_by: None,
        resolved_at: None,
        rejection_reason: None,
    }
}

#[tokio::test]
async fn profile_is_lazily_created_with_default_role() {
    let repo = MemoryRepository::new();
    let user = repo.create_user(user("p@x.com")).await;

    let profile = repo.get_or_create_profile(user.id).await;
    assert_eq!(profile.role, Role::Student);
    assert!(profile.department.is_none());

    // A second access returns the same row, not a fresh default.
    let mut updated = profile.clone();
    updated.role = Role::Lecturer;
    repo.save_profile(updated).await;
    let again = repo.get_or_create_profile(user.id).await;
    assert_eq!(again.role, Role::Lecturer);
}

#[tokio::test]
async fn pending_role_request_lookup_ignores_resolved_rows() {
    let repo = MemoryRepository::new();
    let u = repo.create_user(user("r@x.com")).await;
    let admin = repo.create_user(user("a@x.com")).await;

    let request = repo.create_role_request(role_request(u.id, Role::Manager)).await;
    assert!(
        repo.find_pending_role_request(u.id, Role::Manager)
            .await
            .is_some()
    );
    // Different role: no match.
    assert!(
        repo.find_pending_role_request(u.id, Role::Lecturer)
            .await
            .is_none()
    );

    assert!(
        repo.resolve_role_request(request.id, &Resolution::approved(admin.id))
            .await
    );
    assert!(
        repo.find_pending_role_request(u.id, Role::Manager)
            .await
            .is_none()
    );
}

#[tokio::test]
async fn resolve_is_a_compare_and_swap() {
    let repo = MemoryRepository::new();
    let u = repo.create_user(user("u@x.com")).await;
    let admin = repo.create_user(user("a@x.com")).await;

    let request = repo.create_role_request(role_request(u.id, Role::Lecturer)).await;

    let first = repo
        .resolve_role_request(request.id, &Resolution::approved(admin.id))
        .await;
    let second = repo
        .resolve_role_request(request.id, &Resolution::rejected(admin.id, None))
        .await;
    assert!(first);
    assert!(!second, "a resolved request must not resolve again");

    let row = repo.get_role_request(request.id).await.unwrap();
    assert_eq!(row.status, RequestStatus::Approved);
    assert_eq!(row.resolved_by, Some(admin.id));
    assert!(row.resolved_at.is_some());

    // Unknown ids also lose the claim rather than erroring.
    assert!(
        !repo
            .resolve_role_request(Uuid::new_v4(), &Resolution::approved(admin.id))
            .await
    );
}

#[tokio::test]
async fn update_request_resolution_is_terminal() {
    let repo = MemoryRepository::new();
    let u = repo.create_user(user("u@x.com")).await;
    let target = repo.create_lab(lab("B1", "101")).await;

    let request = repo
        .create_update_request(ResourceUpdateRequest {
            id: Uuid::new_v4(),
            kind: ResourceKind::Lab,
            resource_id: target.id,
            requested_by: u.id,
            requested_occupancy: Some(12),
            requested_open: None,
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
            resolved_by: None,
            resolved_at: None,
            rejection_reason: None,
        })
        .await;

    assert_eq!(repo.list_pending_update_requests().await.len(), 1);

    let reason = Some("reading looks wrong".to_string());
    assert!(
        repo.resolve_update_request(request.id, &Resolution::rejected(u.id, reason.clone()))
            .await
    );
    assert!(
        !repo
            .resolve_update_request(request.id, &Resolution::approved(u.id))
            .await
    );

    let row = repo.get_update_request(request.id).await.unwrap();
    assert_eq!(row.status, RequestStatus::Rejected);
    assert_eq!(row.rejection_reason, reason);
    assert!(repo.list_pending_update_requests().await.is_empty());
}

#[tokio::test]
async fn room_request_resolution_assigns_room_only_with_claim() {
    let repo = MemoryRepository::new();
    let lecturer = repo.create_user(user("l@x.com")).await;
    let manager = repo.create_user(user("m@x.com")).await;
    let target = repo.create_lab(lab("B2", "201")).await;

    let request = repo
        .create_room_request(RoomRequest {
            id: Uuid::new_v4(),
            requested_by: lecturer.id,
            room_type: RoomType::Lab,
            purpose: "Practical".to_string(),
            expected_attendees: 20,
            requested_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            room_id: None,
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
            resolved_by: None,
            resolved_at: None,
            rejection_reason: None,
        })
        .await;

    assert!(
        repo.resolve_room_request(
            request.id,
            &Resolution::approved(manager.id),
            Some(target.id)
        )
        .await
    );
    let row = repo.get_room_request(request.id).await.unwrap();
    assert_eq!(row.status, RequestStatus::Approved);
    assert_eq!(row.room_id, Some(target.id));

    // A lost claim never overwrites the assigned room.
    assert!(
        !repo
            .resolve_room_request(
                request.id,
                &Resolution::approved(manager.id),
                Some(Uuid::new_v4())
            )
            .await
    );
    let row = repo.get_room_request(request.id).await.unwrap();
    assert_eq!(row.room_id, Some(target.id));
}

#[tokio::test]
async fn listings_are_ordered() {
    let repo = MemoryRepository::new();

    repo.create_library(library("Science Library")).await;
    repo.create_library(library("Arts Library")).await;
    let names: Vec<String> = repo
        .list_libraries()
        .await
        .into_iter()
        .map(|l| l.name)
        .collect();
    assert_eq!(names, vec!["Arts Library", "Science Library"]);

    repo.create_lab(lab("B2", "101")).await;
    repo.create_lab(lab("B1", "202")).await;
    repo.create_lab(lab("B1", "101")).await;
    let rooms: Vec<(String, String)> = repo
        .list_labs()
        .await
        .into_iter()
        .map(|l| (l.building, l.room_number))
        .collect();
    assert_eq!(
        rooms,
        vec![
            ("B1".to_string(), "101".to_string()),
            ("B1".to_string(), "202".to_string()),
            ("B2".to_string(), "101".to_string()),
        ]
    );
}

#[tokio::test]
async fn fault_listings_are_newest_first_and_scoped() {
    let repo = MemoryRepository::new();
    let alice = repo.create_user(user("alice@x.com")).await;
    let bob = repo.create_user(user("bob@x.com")).await;

    let base = Utc::now();
    for (reporter, title, offset) in [
        (alice.id, "first", 0),
        (bob.id, "second", 1),
        (alice.id, "third", 2),
    ] {
        repo.create_fault(FaultReport {
            id: Uuid::new_v4(),
            reporter_id: reporter,
            title: title.to_string(),
            description: String::new(),
            location_type: Default::default(),
            building: String::new(),
            room_number: String::new(),
            category: Default::default(),
            severity: Default::default(),
            status: FaultStatus::Open,
            assigned_to: None,
            resolution_notes: None,
            created_at: base + Duration::seconds(offset),
            updated_at: base + Duration::seconds(offset),
            resolved_at: None,
        })
        .await;
    }

    let all: Vec<String> = repo.list_faults().await.into_iter().map(|f| f.title).collect();
    assert_eq!(all, vec!["third", "second", "first"]);

    let alices: Vec<String> = repo
        .list_faults_by_reporter(alice.id)
        .await
        .into_iter()
        .map(|f| f.title)
        .collect();
    assert_eq!(alices, vec!["third", "first"]);
}

#[tokio::test]
async fn unique_key_lookups_cover_all_kinds() {
    let repo = MemoryRepository::new();
    repo.create_library(library("Main Library")).await;
    repo.create_lab(lab("B1", "101")).await;

    assert!(repo.find_library_by_name("Main Library").await.is_some());
    assert!(repo.find_library_by_name("Other").await.is_none());
    assert!(repo.find_lab_by_room("B1", "101").await.is_some());
    assert!(repo.find_lab_by_room("B1", "102").await.is_none());
    assert!(repo.find_user_by_email("nobody@x.com").await.is_none());
}
