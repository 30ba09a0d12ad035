mod common;

use campfire::{
    domain::{CreateReminderRequest, Role},
    error::AppError,
};
use chrono::{Duration, Utc};
use common::*;
use uuid::Uuid;

fn reminder(kind: &str, offset: Duration) -> CreateReminderRequest {
    CreateReminderRequest {
        reminder_type: kind.to_string(),
        reminder_time: Utc::now() + offset,
    }
}

#[tokio::test]
async fn test_pending_reminders_are_due_and_unsent() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let event = ctx.event_service
        .create(leader.id, timed("Camp", days_from_now(2), hm(9, 0), hm(17, 0)), vec![])
        .await?;

    let older = ctx.reminder_service
        .create_reminder(event.id, reminder("email", Duration::hours(-3)))
        .await?;
    let newer = ctx.reminder_service
        .create_reminder(event.id, reminder("sms", Duration::minutes(-10)))
        .await?;
    let future = ctx.reminder_service
        .create_reminder(event.id, reminder("email", Duration::days(1)))
        .await?;
    assert!(!future.sent);
    assert!(future.sent_time.is_none());

    let pending = ctx.reminder_service.pending_reminders().await?;
    let ids: Vec<Uuid> = pending.iter().map(|p| p.reminder.id).collect();
    assert_eq!(ids, vec![older.id, newer.id]);
    assert_eq!(pending[0].event_title, "Camp");
    assert_eq!(pending[0].event_date, event.start_date);
    assert_eq!(pending[0].event_start_time, Some(hm(9, 0)));
    assert_eq!(pending[0].event_end_time, Some(hm(17, 0)));

    ctx.reminder_service.mark_reminder_sent(older.id).await?;

    let pending = ctx.reminder_service.pending_reminders().await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].reminder.id, newer.id);

    Ok(())
}

#[tokio::test]
async fn test_sent_is_monotonic() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let event = ctx.event_service
        .create(leader.id, event_data("Meeting", days_from_now(1)), vec![])
        .await?;
    let created = ctx.reminder_service
        .create_reminder(event.id, reminder("email", Duration::hours(-1)))
        .await?;

    ctx.reminder_service.mark_reminder_sent(created.id).await?;
    let after_first = ctx.reminder_service.event_reminders(event.id).await?;
    assert!(after_first[0].sent);
    let first_sent = after_first[0].sent_time.expect("sent time is set");

    ctx.reminder_service.mark_reminder_sent(created.id).await?;
    let after_second = ctx.reminder_service.event_reminders(event.id).await?;
    assert!(after_second[0].sent);
    assert!(after_second[0].sent_time.expect("sent time is set") >= first_sent);

    assert!(ctx.reminder_service.pending_reminders().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_reminder_errors() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let event = ctx.event_service
        .create(leader.id, event_data("Meeting", days_from_now(1)), vec![])
        .await?;

    let missing_event = ctx.reminder_service
        .create_reminder(Uuid::new_v4(), reminder("email", Duration::hours(1)))
        .await;
    assert!(matches!(missing_event, Err(AppError::EventNotFound(_))));

    let blank_type = ctx.reminder_service
        .create_reminder(event.id, reminder("", Duration::hours(1)))
        .await;
    assert!(matches!(blank_type, Err(AppError::Validation(_))));

    let id = Uuid::new_v4();
    let missing_reminder = ctx.reminder_service.mark_reminder_sent(id).await;
    assert!(matches!(missing_reminder, Err(AppError::ReminderNotFound(missing)) if missing == id));

    Ok(())
}
