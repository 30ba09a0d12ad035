mod common;

use campfire::{
    config::SchedulingConfig,
    domain::{EventType, Role},
    repository::{SqliteStatisticsRepository, StatisticsRepository},
};
use chrono::Utc;
use common::*;

#[tokio::test]
async fn test_statistics_rollups() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;
    let helper = user(&ctx, "Hana", Role::Helper).await?;

    let mut camp = event_data("Summer camp", days_from_now(5));
    camp.event_type = EventType::Camp;
    camp.required_helpers = 2;
    let camp = ctx.event_service.create(leader.id, camp, vec![]).await?;

    let mut staffed = event_data("Staffed meeting", days_from_now(6));
    staffed.required_helpers = 1;
    let staffed = ctx.event_service.create(leader.id, staffed, vec![]).await?;
    ctx.helper_service.assign_helper(staffed.id, helper.id, true).await?;

    let mut far = event_data("Far away", days_from_now(90));
    far.required_helpers = 3;
    ctx.event_service.create(leader.id, far, vec![]).await?;

    ctx.event_service
        .create(leader.id, event_data("Past meeting", days_from_now(-10)), vec![])
        .await?;

    for i in 0..3 {
        let scout = user(&ctx, &format!("Scout{}", i), Role::Public).await?;
        ctx.registration_service.register(camp.id, scout.id, None).await?;
        if i == 0 {
            ctx.registration_service.register(staffed.id, scout.id, None).await?;
        }
        if i == 2 {
            ctx.registration_service.cancel(camp.id, scout.id).await?;
        }
    }

    let stats = ctx.statistics_service.get_statistics().await?;

    assert_eq!(stats.total_events, 4);
    assert_eq!(stats.upcoming_events, 3);
    assert_eq!(stats.total_active_participants, 3);

    let meetings = stats.events_by_type
        .iter()
        .find(|t| t.event_type == EventType::Meeting)
        .map(|t| t.count);
    assert_eq!(meetings, Some(3));
    assert_eq!(stats.events_by_type[0].event_type, EventType::Meeting);

    // Only the camp is short-handed inside the default 30 day window
    assert_eq!(stats.understaffed_events.len(), 1);
    assert_eq!(stats.understaffed_events[0].event_id, camp.id);
    assert_eq!(stats.understaffed_events[0].current_helpers, 0);
    assert_eq!(stats.understaffed_events[0].required_helpers, 2);

    assert_eq!(stats.popular_events[0].event_id, camp.id);
    assert_eq!(stats.popular_events[0].participant_count, 2);
    assert_eq!(stats.popular_events[1].event_id, staffed.id);

    let counted: i64 = stats.events_by_month.iter().map(|m| m.count).sum();
    assert!(counted >= 1 && counted <= 4);
    assert!(stats.events_by_month.windows(2).all(|w| w[0].month < w[1].month));

    Ok(())
}

#[tokio::test]
async fn test_statistics_limits_are_configurable() -> anyhow::Result<()> {
    let (pool, ctx) = setup().await?;
    let leader = user(&ctx, "Leader", Role::Leader).await?;

    for i in 0..4 {
        let mut data = event_data(&format!("Event {}", i), days_from_now(i + 1));
        data.required_helpers = 1;
        let event = ctx.event_service.create(leader.id, data, vec![]).await?;
        let scout = user(&ctx, &format!("Scout{}", i), Role::Public).await?;
        ctx.registration_service.register(event.id, scout.id, None).await?;
    }

    let config = SchedulingConfig {
        understaffed_window_days: 2,
        understaffed_limit: 5,
        top_events_limit: 2,
    };
    let stats = SqliteStatisticsRepository::new(pool)
        .compute(Utc::now().date_naive(), &config)
        .await?;

    assert_eq!(stats.understaffed_events.len(), 2);
    assert_eq!(stats.popular_events.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_statistics_on_empty_database() -> anyhow::Result<()> {
    let (_pool, ctx) = setup().await?;

    let stats = ctx.statistics_service.get_statistics().await?;
    assert_eq!(stats.total_events, 0);
    assert!(stats.events_by_type.is_empty());
    assert!(stats.events_by_month.is_empty());
    assert!(stats.understaffed_events.is_empty());
    assert!(stats.popular_events.is_empty());

    Ok(())
}
