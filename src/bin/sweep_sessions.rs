use domain::{gateway::livekit::meeting_service_from_config, SessionStatusService, TimingDefaults};
use events::{EventPublisher, LoggingEventHandler};
use log::{error, info};
use service::{config::Config, logging::Logger};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Sweeping overdue sessions in [{}]...", config.database_url());

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let meetings = match meeting_service_from_config(&config) {
        Ok(meetings) => meetings,
        Err(e) => {
            error!("Failed to set up the LiveKit client: {e}");
            std::process::exit(1);
        }
    };

    let service_state = service::AppState::new(config, &db);

    let sessions = SessionStatusService::new(
        TimingDefaults::from(&service_state.config),
        meetings,
    )
    .with_events(EventPublisher::new().with_handler(Arc::new(LoggingEventHandler)));

    match sessions
        .sweep_expired_sessions(service_state.db_conn_ref(), None)
        .await
    {
        Ok(report) if report.failed.is_empty() => {}
        Ok(report) => {
            error!("Sessions left for the next sweep: {:?}", report.failed);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Session sweep failed: {e}");
            std::process::exit(1);
        }
    }
}
