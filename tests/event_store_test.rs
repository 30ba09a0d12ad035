mod common;

use campfire::{
    domain::{CreateReminderRequest, EventFilter, EventType, Role, Visibility},
    error::AppError,
};
use chrono::{Duration, Utc};
use common::*;
use uuid::Uuid;

#[tokio::test]
async fn test_event_crud() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let knots = badge(&ctx, "Knots").await?;
    let first_aid = badge(&ctx, "First Aid").await?;

    // Create
    let date = days_from_now(7);
    let event = ctx.event_service
        .create(leader.id, event_data("Knot night", date), vec![knots.id])
        .await?;
    assert_eq!(event.title, "Knot night");
    assert_eq!(event.start_date, date);
    assert_eq!(event.start_time, Some(hm(10, 0)));
    assert_eq!(event.created_by, leader.id);
    assert_eq!(event.location.name.as_deref(), Some("Scout hut"));

    // Read with details
    let details = ctx.event_service.get(event.id).await?.expect("event exists");
    assert_eq!(details.badges.len(), 1);
    assert_eq!(details.badges[0].id, knots.id);
    assert!(details.helpers.is_empty());
    assert!(details.participants.is_empty());

    // Update scalar fields and replace the badge set
    let mut data = event_data("Knot and first aid night", date);
    data.event_type = EventType::Training;
    data.max_participants = 12;
    let updated = ctx.event_service
        .update(event.id, data, Some(vec![first_aid.id]))
        .await?;
    assert_eq!(updated.title, "Knot and first aid night");
    assert_eq!(updated.event_type, EventType::Training);
    assert_eq!(updated.max_participants, 12);

    let badges = ctx.event_service.badges(event.id).await?;
    assert_eq!(badges.iter().map(|b| b.id).collect::<Vec<_>>(), vec![first_aid.id]);

    // Update without badge ids leaves links alone
    ctx.event_service
        .update(event.id, event_data("Renamed", date), None)
        .await?;
    assert_eq!(ctx.event_service.badges(event.id).await?.len(), 1);

    // Delete
    assert!(ctx.event_service.delete(event.id).await?);
    assert!(ctx.event_service.get(event.id).await?.is_none());
    assert!(!ctx.event_service.delete(event.id).await?);

    Ok(())
}

#[tokio::test]
async fn test_create_with_unknown_badge_leaves_nothing_behind() -> anyhow::Result<()> {
    let (pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let known = badge(&ctx, "Knots").await?;

    let result = ctx.event_service
        .create(leader.id, event_data("Orphan", days_from_now(3)), vec![known.id, Uuid::new_v4()])
        .await;
    assert!(matches!(result, Err(AppError::Database(_))));

    let (events,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events").fetch_one(&pool).await?;
    let (links,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM event_badges").fetch_one(&pool).await?;
    assert_eq!(events, 0);
    assert_eq!(links, 0);

    Ok(())
}

#[tokio::test]
async fn test_update_with_unknown_badge_keeps_previous_state() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let knots = badge(&ctx, "Knots").await?;
    let first_aid = badge(&ctx, "First Aid").await?;
    let date = days_from_now(6);

    let event = ctx.event_service
        .create(leader.id, event_data("Knot night", date), vec![knots.id])
        .await?;

    let mut data = event_data("Renamed", date);
    data.event_type = EventType::Training;
    let result = ctx.event_service
        .update(event.id, data, Some(vec![first_aid.id, Uuid::new_v4()]))
        .await;
    assert!(matches!(result, Err(AppError::Database(_))));

    let details = ctx.event_service.get(event.id).await?.expect("event exists");
    assert_eq!(details.event.title, "Knot night");
    assert_eq!(details.event.event_type, EventType::Meeting);
    assert_eq!(details.badges.iter().map(|b| b.id).collect::<Vec<_>>(), vec![knots.id]);

    Ok(())
}

#[tokio::test]
async fn test_update_missing_event() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let id = Uuid::new_v4();

    let result = ctx.event_service
        .update(id, event_data("Ghost", days_from_now(1)), None)
        .await;
    assert!(matches!(result, Err(AppError::EventNotFound(missing)) if missing == id));

    Ok(())
}

#[tokio::test]
async fn test_validation_rejects_bad_input() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let creator = Uuid::new_v4();

    let mut data = event_data("", days_from_now(1));
    let result = ctx.event_service.create(creator, data.clone(), vec![]).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    data.title = "Backwards".to_string();
    data.end_date = Some(data.start_date - Duration::days(1));
    let result = ctx.event_service.create(creator, data, vec![]).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn test_delete_removes_every_owned_row() -> anyhow::Result<()> {
    let (pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let helper = user(&ctx, "Helper", Role::Helper).await?;
    let scout = user(&ctx, "Scout", Role::Public).await?;
    let knots = badge(&ctx, "Knots").await?;

    let event = ctx.event_service
        .create(leader.id, event_data("Camp", days_from_now(5)), vec![knots.id])
        .await?;
    ctx.helper_service.assign_helper(event.id, helper.id, true).await?;
    ctx.registration_service.register(event.id, scout.id, None).await?;
    ctx.attendance_service.record_attendance(event.id, scout.id, None, None).await?;
    ctx.reminder_service
        .create_reminder(event.id, CreateReminderRequest {
            reminder_type: "email".to_string(),
            reminder_time: Utc::now() + Duration::days(4),
        })
        .await?;

    assert!(ctx.event_service.delete(event.id).await?);

    for table in ["event_badges", "event_helpers", "event_participants", "event_attendance", "event_reminders"] {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {} WHERE event_id = ?", table))
            .bind(event.id.to_string())
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 0, "{} still has rows", table);
    }

    // The badge catalog itself is untouched
    assert_eq!(ctx.badge_repo.list().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_failed_delete_rolls_back_everything() -> anyhow::Result<()> {
    let (pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let scout = user(&ctx, "Scout", Role::Public).await?;
    let knots = badge(&ctx, "Knots").await?;

    let event = ctx.event_service
        .create(leader.id, event_data("Hike", days_from_now(5)), vec![knots.id])
        .await?;
    ctx.registration_service.register(event.id, scout.id, None).await?;
    ctx.reminder_service
        .create_reminder(event.id, CreateReminderRequest {
            reminder_type: "sms".to_string(),
            reminder_time: Utc::now() + Duration::days(1),
        })
        .await?;

    // Make the delete fail partway through the child tables
    sqlx::query(
        "CREATE TRIGGER block_reminder_delete BEFORE DELETE ON event_reminders \
         BEGIN SELECT RAISE(ABORT, 'reminder delete blocked'); END;",
    )
    .execute(&pool)
    .await?;

    let result = ctx.event_service.delete(event.id).await;
    assert!(matches!(result, Err(AppError::Database(_))));

    let details = ctx.event_service.get(event.id).await?.expect("event survives");
    assert_eq!(details.badges.len(), 1);
    assert_eq!(details.participants.len(), 1);
    assert_eq!(ctx.reminder_service.event_reminders(event.id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_list_filters() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let other = user(&ctx, "Other", Role::Leader).await?;
    let swimming = badge(&ctx, "Swimming").await?;

    let past = ctx.event_service
        .create(leader.id, event_data("Last month", days_from_now(-30)), vec![])
        .await?;
    let mut hike = event_data("Hike", days_from_now(10));
    hike.event_type = EventType::Hike;
    let hike = ctx.event_service.create(other.id, hike, vec![swimming.id]).await?;
    let soon = ctx.event_service
        .create(leader.id, event_data("Soon", days_from_now(2)), vec![])
        .await?;

    let ids = |events: Vec<campfire::domain::Event>| events.into_iter().map(|e| e.id).collect::<Vec<_>>();

    // Ordered by start date
    let all = ctx.event_service.list(&EventFilter::default()).await?;
    assert_eq!(ids(all), vec![past.id, soon.id, hike.id]);

    let upcoming = ctx.event_service
        .list(&EventFilter { upcoming: true, ..Default::default() })
        .await?;
    assert_eq!(ids(upcoming), vec![soon.id, hike.id]);

    let previous = ctx.event_service
        .list(&EventFilter { past: true, ..Default::default() })
        .await?;
    assert_eq!(ids(previous), vec![past.id]);

    let hikes = ctx.event_service
        .list(&EventFilter { event_type: Some(EventType::Hike), ..Default::default() })
        .await?;
    assert_eq!(ids(hikes), vec![hike.id]);

    let mine = ctx.event_service
        .list(&EventFilter { created_by: Some(leader.id), ..Default::default() })
        .await?;
    assert_eq!(ids(mine), vec![past.id, soon.id]);

    let with_badge = ctx.event_service
        .list(&EventFilter { badge_id: Some(swimming.id), ..Default::default() })
        .await?;
    assert_eq!(ids(with_badge), vec![hike.id]);

    let window = ctx.event_service
        .list(&EventFilter {
            from: Some(days_from_now(1)),
            to: Some(days_from_now(5)),
            ..Default::default()
        })
        .await?;
    assert_eq!(ids(window), vec![soon.id]);

    Ok(())
}

#[tokio::test]
async fn test_list_respects_visibility() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let date = days_from_now(4);

    let public = ctx.event_service
        .create(leader.id, event_data("Open day", date), vec![])
        .await?;

    let mut leaders = event_data("Leaders meeting", date);
    leaders.visibility = Visibility {
        public_visible: false,
        leaders_only_visible: true,
        helpers_only_visible: false,
    };
    let leaders = ctx.event_service.create(leader.id, leaders, vec![]).await?;

    let mut helpers = event_data("Helper briefing", date);
    helpers.visibility = Visibility {
        public_visible: false,
        leaders_only_visible: false,
        helpers_only_visible: true,
    };
    let helpers = ctx.event_service.create(leader.id, helpers, vec![]).await?;

    let visible = |role: Role| {
        let service = ctx.event_service.clone();
        async move {
            let filter = EventFilter { role: Some(role), ..Default::default() };
            service.list(&filter).await.map(|events| {
                let mut ids: Vec<Uuid> = events.into_iter().map(|e| e.id).collect();
                ids.sort();
                ids
            })
        }
    };

    let sorted = |mut ids: Vec<Uuid>| {
        ids.sort();
        ids
    };

    assert_eq!(visible(Role::Public).await?, vec![public.id]);
    assert_eq!(visible(Role::Helper).await?, sorted(vec![public.id, helpers.id]));
    assert_eq!(visible(Role::Leader).await?, sorted(vec![public.id, leaders.id]));
    assert_eq!(ctx.event_service.list(&EventFilter::default()).await?.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_event_that_started_today_is_not_upcoming() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let scout = user(&ctx, "Scout", Role::Public).await?;

    // Untimed events start at midnight
    let mut data = event_data("All day", days_from_now(0));
    data.start_time = None;
    data.end_time = None;
    let today = ctx.event_service.create(leader.id, data, vec![]).await?;
    let tomorrow = ctx.event_service
        .create(leader.id, event_data("Tomorrow", days_from_now(1)), vec![])
        .await?;

    let upcoming = ctx.event_service
        .list(&EventFilter { upcoming: true, ..Default::default() })
        .await?;
    assert_eq!(upcoming.iter().map(|e| e.id).collect::<Vec<_>>(), vec![tomorrow.id]);

    let past = ctx.event_service
        .list(&EventFilter { past: true, ..Default::default() })
        .await?;
    assert_eq!(past.iter().map(|e| e.id).collect::<Vec<_>>(), vec![today.id]);

    // Listing and registration agree on what has started
    let result = ctx.registration_service.register(today.id, scout.id, None).await;
    assert!(matches!(result, Err(AppError::EventAlreadyStarted)));

    Ok(())
}
