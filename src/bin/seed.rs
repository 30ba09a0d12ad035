use campfire::{
    config::Settings,
    db,
    domain::{
        Badge, CreateReminderRequest, EventData, EventType, Location, Role, UpsertUserRequest,
        User, Visibility,
    },
    error::AppError,
    service::ServiceContext,
};
use chrono::{Duration, NaiveTime, TimeZone, Utc};
use clap::Parser;
use fake::{
    faker::{address::en::CityName, internet::en::SafeEmail, name::en::Name},
    Fake,
};
use uuid::Uuid;

/// Fill a database with a plausible troop calendar.
#[derive(Debug, Parser)]
#[command(name = "seed")]
struct Args {
    /// Overrides `database.url` from the configuration
    #[arg(long)]
    database_url: Option<String>,

    /// Number of ordinary members
    #[arg(long, default_value_t = 20)]
    members: usize,

    /// Number of helpers
    #[arg(long, default_value_t = 6)]
    helpers: usize,

    /// Number of upcoming events
    #[arg(long, default_value_t = 8)]
    events: usize,
}

const BADGES: &[&str] = &["First Aid", "Orienteering", "Campcraft", "Knots", "Swimming"];

const EVENT_TYPES: &[EventType] = &[
    EventType::Meeting,
    EventType::Hike,
    EventType::Camp,
    EventType::Service,
    EventType::Training,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let mut settings = Settings::new().unwrap_or_default();
    if let Some(url) = args.database_url {
        settings.database.url = url;
    }

    let db_pool = db::connect(&settings.database).await?;

    println!("📋 Running migrations...");
    db::migrate(&db_pool).await?;

    let ctx = ServiceContext::new(db_pool, settings.scheduling.clone());

    // Directory
    println!("👥 Creating users...");
    let leader = create_user(&ctx, "Troop Leader".to_string(), Role::Leader).await?;
    create_user(&ctx, "Admin User".to_string(), Role::Admin).await?;

    let mut helpers = Vec::with_capacity(args.helpers);
    for _ in 0..args.helpers {
        helpers.push(create_user(&ctx, Name().fake(), Role::Helper).await?);
    }

    let mut members = Vec::with_capacity(args.members);
    for _ in 0..args.members {
        members.push(create_user(&ctx, Name().fake(), Role::Public).await?);
    }
    println!("  ✅ Created {} helpers and {} members", helpers.len(), members.len());

    println!("🏅 Creating badges...");
    let mut badges = Vec::with_capacity(BADGES.len());
    for name in BADGES {
        badges.push(
            ctx.badge_repo
                .upsert(Badge { id: Uuid::new_v4(), name: name.to_string() })
                .await?,
        );
    }

    println!("📅 Creating events...");
    let today = Utc::now().date_naive();
    let mut seeded = 0;
    for i in 0..args.events {
        let event_type = EVENT_TYPES[i % EVENT_TYPES.len()];
        let start_hour = 9 + (i as u32 % 4) * 2;
        let data = EventData {
            title: format!("{:?} #{}", event_type, i + 1),
            description: "Seeded event".to_string(),
            location: Location {
                name: Some(CityName().fake()),
                ..Default::default()
            },
            start_date: today + Duration::days(1 + (i as i64 % 5) * 3),
            end_date: None,
            start_time: NaiveTime::from_hms_opt(start_hour, 0, 0),
            end_time: NaiveTime::from_hms_opt(start_hour + 3, 0, 0),
            event_type,
            required_helpers: 2,
            max_participants: if i % 3 == 0 { 0 } else { 12 },
            visibility: Visibility::default(),
            notes: None,
            equipment: None,
            cost: None,
        };

        let badge_ids = vec![badges[i % badges.len()].id];
        let event = ctx.event_service.create(leader.id, data, badge_ids).await?;

        // Overlapping slots are expected; the resolver refuses those
        if let Some(helper) = helpers.get(i % helpers.len().max(1)) {
            match ctx.helper_service.assign_helper(event.id, helper.id, i % 2 == 0).await {
                Ok(_) | Err(AppError::HelperUnavailable { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        for member in members.iter().skip(i).step_by(2) {
            match ctx.registration_service.register(event.id, member.id, None).await {
                Ok(_) | Err(AppError::CapacityExceeded { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        let day_before = Utc.from_utc_datetime(&event.starts_at()) - Duration::days(1);
        ctx.reminder_service
            .create_reminder(event.id, CreateReminderRequest {
                reminder_type: "email".to_string(),
                reminder_time: day_before,
            })
            .await?;

        seeded += 1;
    }
    println!("  ✅ Created {} events", seeded);

    println!("\n✨ Database seeding complete!");
    println!("   Leader id: {}", leader.id);

    Ok(())
}

async fn create_user(ctx: &ServiceContext, display_name: String, role: Role) -> anyhow::Result<User> {
    let user = ctx.user_repo
        .upsert(UpsertUserRequest {
            id: Uuid::new_v4(),
            display_name,
            email: Some(SafeEmail().fake()),
            role,
        })
        .await?;
    Ok(user)
}
