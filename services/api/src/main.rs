use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod middleware;
mod models;
mod qr;
mod repositories;
mod routes;
mod state;
mod suggestions;

use common::auth::TokenVerifier;
use common::database::{DatabaseConfig, init_pool};

use crate::{
    qr::QrSigner,
    repositories::{
        CertificateRepository, DocumentRepository, EventRepository, FeedbackRepository,
        NotificationRepository, RegistrationRepository,
    },
    state::AppState,
    suggestions::{SuggestionClient, SuggestionConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting event API service");

    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;
    info!("Database migrations applied");

    let verifier = TokenVerifier::from_env()?;
    let qr_signer = QrSigner::from_env()?;
    let suggestion_client = SuggestionClient::new(SuggestionConfig::from_env())?;

    let app_state = AppState {
        verifier,
        qr_signer,
        suggestion_client,
        event_repository: EventRepository::new(pool.clone()),
        registration_repository: RegistrationRepository::new(pool.clone()),
        certificate_repository: CertificateRepository::new(pool.clone()),
        feedback_repository: FeedbackRepository::new(pool.clone()),
        document_repository: DocumentRepository::new(pool.clone()),
        notification_repository: NotificationRepository::new(pool),
    };

    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
    info!("Event API service listening on 0.0.0.0:3001");

    axum::serve(listener, app).await?;

    Ok(())
}
