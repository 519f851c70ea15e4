use std::{process, sync::Arc};

use recibo::{
    application::{
        billing::BillingService,
        error::AppError,
        generation::{ArtifactStore, GenerationService},
        layouts::{LayoutExtractor, LayoutService},
        receipts::ReceiptQueryService,
        repos::{FilesRepo, ReceiptsRepo, SubscriptionsRepo, UsersRepo},
        users::{AdminUserService, UserService},
    },
    config,
    infra::{
        ai::GeminiLayoutExtractor,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, auth::TokenVerifier},
        logos::HttpLogoFetcher,
        storage::ReceiptStorage,
        telemetry,
    },
    render::VectorRasterizer,
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_api_state(repositories, &settings)?;

    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "recibo::server",
        addr = %settings.server.public_addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!(target = "recibo::migrate", "migrations applied");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

/// Construct every service once at process start and hand them to the router
/// explicitly; no service is reachable as an ambient global.
fn build_api_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<ApiState, AppError> {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let receipts_repo: Arc<dyn ReceiptsRepo> = repositories.clone();
    let subscriptions_repo: Arc<dyn SubscriptionsRepo> = repositories.clone();
    let files_repo: Arc<dyn FilesRepo> = repositories.clone();

    let storage = Arc::new(
        ReceiptStorage::new(
            settings.storage.directory.clone(),
            settings.storage.public_base_url.clone(),
        )
        .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );
    let artifact_store: Arc<dyn ArtifactStore> = storage.clone();

    let rasterizer = Arc::new(VectorRasterizer::new());
    let generation = Arc::new(
        GenerationService::new(
            users_repo.clone(),
            receipts_repo.clone(),
            rasterizer,
            artifact_store.clone(),
        )
        .with_logo_fetcher(Arc::new(HttpLogoFetcher::new())),
    );

    let extractor = GeminiLayoutExtractor::from_settings(&settings.ai)
        .map(|client| Arc::new(client) as Arc<dyn LayoutExtractor>);
    if extractor.is_none() {
        info!(
            target = "recibo::server",
            "no AI api key configured; layout extraction serves the default layout"
        );
    }

    let layouts = Arc::new(LayoutService::new(
        extractor,
        artifact_store,
        files_repo.clone(),
    ));

    let free_tier_credits = settings.generation.free_tier_credits;
    let users = Arc::new(UserService::new(users_repo.clone(), free_tier_credits));
    let admin_users = Arc::new(AdminUserService::new(users_repo.clone()));
    let receipts = Arc::new(ReceiptQueryService::new(receipts_repo));
    let billing = Arc::new(BillingService::new(
        subscriptions_repo,
        users_repo,
        free_tier_credits,
    ));

    Ok(ApiState {
        generation,
        receipts,
        users,
        admin_users,
        layouts,
        billing,
        storage,
        files: files_repo,
        auth: Arc::new(TokenVerifier::new(&settings.auth)),
        db: repositories,
        webhook_secret: Arc::from(settings.billing.webhook_secret.as_str()),
        upload_limit_bytes: settings.uploads.max_request_bytes.get() as usize,
    })
}
