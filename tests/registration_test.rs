mod common;

use std::sync::Arc;

use campfire::{
    config::{DatabaseConfig, SchedulingConfig},
    db,
    domain::{RegistrationStatus, Role},
    error::AppError,
    service::ServiceContext,
};
use common::*;
use uuid::Uuid;

#[tokio::test]
async fn test_capacity_is_enforced() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let alice = user(&ctx, "Alice", Role::Public).await?;
    let bob = user(&ctx, "Bob", Role::Public).await?;
    let carol = user(&ctx, "Carol", Role::Public).await?;

    let mut data = event_data("Canoe trip", days_from_now(14));
    data.max_participants = 2;
    let event = ctx.event_service.create(leader.id, data, vec![]).await?;

    ctx.registration_service.register(event.id, alice.id, None).await?;
    ctx.registration_service.register(event.id, bob.id, Some("Bringing a tent".to_string())).await?;

    let result = ctx.registration_service.register(event.id, carol.id, None).await;
    assert!(matches!(result, Err(AppError::CapacityExceeded { max_participants: 2 })));

    let seats = ctx.registration_service.seats(event.id).await?;
    assert_eq!(seats.active_registrations, 2);
    assert_eq!(seats.remaining, Some(0));

    let participants = ctx.registration_service.participants(event.id).await?;
    assert_eq!(participants.len(), 2);
    let bobs = participants
        .iter()
        .find(|p| p.registration.user_id == bob.id)
        .expect("bob is listed");
    assert_eq!(bobs.display_name.as_deref(), Some("Bob"));
    assert_eq!(bobs.registration.notes.as_deref(), Some("Bringing a tent"));

    // A cancellation frees the seat
    ctx.registration_service.cancel(event.id, alice.id).await?;
    ctx.registration_service.register(event.id, carol.id, None).await?;

    Ok(())
}

#[tokio::test]
async fn test_zero_capacity_is_unlimited() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let event = ctx.event_service
        .create(leader.id, event_data("Open meeting", days_from_now(3)), vec![])
        .await?;
    assert_eq!(event.max_participants, 0);

    for i in 0..10 {
        let scout = user(&ctx, &format!("Scout{}", i), Role::Public).await?;
        ctx.registration_service.register(event.id, scout.id, None).await?;
    }
    assert_eq!(ctx.registration_service.participants(event.id).await?.len(), 10);
    assert_eq!(ctx.registration_service.seats(event.id).await?.remaining, None);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let scout = user(&ctx, "Scout", Role::Public).await?;
    let event = ctx.event_service
        .create(leader.id, event_data("Meeting", days_from_now(3)), vec![])
        .await?;

    ctx.registration_service.register(event.id, scout.id, None).await?;
    let again = ctx.registration_service.register(event.id, scout.id, None).await;
    assert!(matches!(again, Err(AppError::AlreadyRegistered)));

    Ok(())
}

#[tokio::test]
async fn test_cannot_register_for_started_event() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let scout = user(&ctx, "Scout", Role::Public).await?;
    let event = ctx.event_service
        .create(leader.id, event_data("Yesterday", days_from_now(-1)), vec![])
        .await?;

    let result = ctx.registration_service.register(event.id, scout.id, None).await;
    assert!(matches!(result, Err(AppError::EventAlreadyStarted)));
    assert!(!ctx.registration_service.is_registered(event.id, scout.id).await?);

    Ok(())
}

#[tokio::test]
async fn test_register_for_missing_event() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let scout = user(&ctx, "Scout", Role::Public).await?;
    let id = Uuid::new_v4();

    let result = ctx.registration_service.register(id, scout.id, None).await;
    assert!(matches!(result, Err(AppError::EventNotFound(missing)) if missing == id));

    Ok(())
}

#[tokio::test]
async fn test_register_unknown_user() -> anyhow::Result<()> {
    let (pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let event = ctx.event_service
        .create(leader.id, event_data("Meeting", days_from_now(2)), vec![])
        .await?;

    let result = ctx.registration_service.register(event.id, Uuid::new_v4(), None).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM event_participants")
        .fetch_one(&pool)
        .await?;
    assert_eq!(rows, 0);

    Ok(())
}

#[tokio::test]
async fn test_capacity_cannot_shrink_below_registrations() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let alice = user(&ctx, "Alice", Role::Public).await?;
    let bob = user(&ctx, "Bob", Role::Public).await?;

    let mut data = event_data("Canoe trip", days_from_now(14));
    data.max_participants = 2;
    let event = ctx.event_service.create(leader.id, data.clone(), vec![]).await?;
    ctx.registration_service.register(event.id, alice.id, None).await?;
    ctx.registration_service.register(event.id, bob.id, None).await?;

    data.max_participants = 1;
    let result = ctx.event_service.update(event.id, data.clone(), None).await;
    assert!(matches!(result, Err(AppError::CapacityExceeded { max_participants: 1 })));

    let seats = ctx.registration_service.seats(event.id).await?;
    assert_eq!(seats.max_participants, 2);
    assert_eq!(seats.active_registrations, 2);

    // Unlimited always fits, and so does a limit matching the headcount
    data.max_participants = 0;
    ctx.event_service.update(event.id, data.clone(), None).await?;
    data.max_participants = 2;
    ctx.event_service.update(event.id, data.clone(), None).await?;

    // Cancelled registrations do not count
    ctx.registration_service.cancel(event.id, bob.id).await?;
    data.max_participants = 1;
    let updated = ctx.event_service.update(event.id, data, None).await?;
    assert_eq!(updated.max_participants, 1);

    Ok(())
}

#[tokio::test]
async fn test_cancel_and_register_again() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let scout = user(&ctx, "Scout", Role::Public).await?;
    let event = ctx.event_service
        .create(leader.id, event_data("Campfire", days_from_now(6)), vec![])
        .await?;

    let first = ctx.registration_service.register(event.id, scout.id, None).await?;
    assert_eq!(first.status, RegistrationStatus::Registered);
    assert!(ctx.registration_service.is_registered(event.id, scout.id).await?);

    let cancelled = ctx.registration_service.cancel(event.id, scout.id).await?;
    assert_eq!(cancelled.id, first.id);
    assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
    assert!(!ctx.registration_service.is_registered(event.id, scout.id).await?);

    // Cancelling twice finds nothing active
    let again = ctx.registration_service.cancel(event.id, scout.id).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));

    let second = ctx.registration_service.register(event.id, scout.id, None).await?;
    assert_ne!(second.id, first.id);
    assert!(ctx.registration_service.is_registered(event.id, scout.id).await?);

    // Both rows are kept, only one active
    let participants = ctx.registration_service.participants(event.id).await?;
    assert_eq!(participants.len(), 2);
    assert_eq!(
        participants.iter().filter(|p| p.registration.status.is_active()).count(),
        1
    );

    Ok(())
}

#[tokio::test]
async fn test_attended_registration_cannot_be_cancelled() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let scout = user(&ctx, "Scout", Role::Public).await?;
    let event = ctx.event_service
        .create(leader.id, event_data("Meeting", days_from_now(2)), vec![])
        .await?;

    ctx.registration_service.register(event.id, scout.id, None).await?;
    ctx.attendance_service.record_attendance(event.id, scout.id, None, None).await?;

    let result = ctx.registration_service.cancel(event.id, scout.id).await;
    assert!(matches!(result, Err(AppError::InvalidState(_))));

    Ok(())
}

#[tokio::test]
async fn test_upcoming_registrations_for_user() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let scout = user(&ctx, "Scout", Role::Public).await?;

    let later = ctx.event_service
        .create(leader.id, event_data("Later", days_from_now(20)), vec![])
        .await?;
    let sooner = ctx.event_service
        .create(leader.id, event_data("Sooner", days_from_now(2)), vec![])
        .await?;
    let dropped = ctx.event_service
        .create(leader.id, event_data("Dropped", days_from_now(5)), vec![])
        .await?;

    for event in [&later, &sooner, &dropped] {
        ctx.registration_service.register(event.id, scout.id, None).await?;
    }
    ctx.registration_service.cancel(dropped.id, scout.id).await?;

    let mine = ctx.registration_service.upcoming_for_user(scout.id).await?;
    let titles: Vec<&str> = mine.iter().map(|r| r.event_title.as_str()).collect();
    assert_eq!(titles, vec!["Sooner", "Later"]);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_never_overbook() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("campfire.db").display()),
        max_connections: 8,
        busy_timeout_secs: 30,
    };
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;
    let ctx = Arc::new(ServiceContext::new(pool.clone(), SchedulingConfig::default()));

    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let mut data = event_data("Limited", days_from_now(9));
    data.max_participants = 3;
    let event = ctx.event_service.create(leader.id, data, vec![]).await?;

    let event_id = event.id;
    let mut scouts = Vec::new();
    for i in 0..10 {
        scouts.push(user(&ctx, &format!("Scout{}", i), Role::Public).await?);
    }

    let handles: Vec<_> = scouts
        .iter()
        .map(|scout| {
            let ctx = ctx.clone();
            let scout_id = scout.id;
            tokio::spawn(async move {
                ctx.registration_service.register(event_id, scout_id, None).await
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => accepted += 1,
            Err(AppError::CapacityExceeded { .. }) => {}
            Err(e) => panic!("unexpected registration error: {}", e),
        }
    }

    assert_eq!(accepted, 3);
    let (active,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM event_participants WHERE event_id = ? AND status != 'cancelled'",
    )
    .bind(event_id.to_string())
    .fetch_one(&pool)
    .await?;
    assert_eq!(active, 3);

    pool.close().await;
    Ok(())
}
