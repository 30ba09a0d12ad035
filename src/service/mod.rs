pub mod attendance_service;
pub mod event_service;
pub mod helper_service;
pub mod registration_service;
pub mod reminder_service;
pub mod statistics_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::config::SchedulingConfig;
use crate::repository::*;
use attendance_service::AttendanceService;
use event_service::EventService;
use helper_service::HelperService;
use registration_service::RegistrationService;
use reminder_service::ReminderService;
use statistics_service::StatisticsService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub badge_repo: Arc<dyn BadgeRepository>,
    pub event_service: Arc<EventService>,
    pub registration_service: Arc<RegistrationService>,
    pub helper_service: Arc<HelperService>,
    pub attendance_service: Arc<AttendanceService>,
    pub reminder_service: Arc<ReminderService>,
    pub statistics_service: Arc<StatisticsService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, scheduling: SchedulingConfig) -> Self {
        // Create repositories
        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let badge_repo: Arc<dyn BadgeRepository> = Arc::new(SqliteBadgeRepository::new(db_pool.clone()));
        let event_repo: Arc<dyn EventRepository> = Arc::new(SqliteEventRepository::new(db_pool.clone()));
        let registration_repo = Arc::new(SqliteRegistrationRepository::new(db_pool.clone()));
        let helper_repo = Arc::new(SqliteHelperRepository::new(db_pool.clone()));
        let attendance_repo = Arc::new(SqliteAttendanceRepository::new(db_pool.clone()));
        let reminder_repo = Arc::new(SqliteReminderRepository::new(db_pool.clone()));
        let statistics_repo = Arc::new(SqliteStatisticsRepository::new(db_pool.clone()));

        // Create services
        let event_service = Arc::new(EventService::new(event_repo.clone()));
        let registration_service = Arc::new(RegistrationService::new(registration_repo, event_repo.clone()));
        let helper_service = Arc::new(HelperService::new(helper_repo, event_repo.clone(), user_repo.clone()));
        let attendance_service = Arc::new(AttendanceService::new(attendance_repo, event_repo.clone()));
        let reminder_service = Arc::new(ReminderService::new(reminder_repo, event_repo));
        let statistics_service = Arc::new(StatisticsService::new(statistics_repo, scheduling));

        Self {
            user_repo,
            badge_repo,
            event_service,
            registration_service,
            helper_service,
            attendance_service,
            reminder_service,
            statistics_service,
            db_pool,
        }
    }
}
