use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use case_pair::config::{LogFormat, Settings};
use case_pair::core::{EmailRule, Matcher};
use case_pair::routes::{self, AppState};
use case_pair::services::{
    CacheManager, CachedProfileStore, JwtIdentity, PostgresClient, ProfileStore, ResourceCatalog,
    SessionStore, SupabaseClient, SupabaseTables,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(settings_level: &str, settings_format: &str) {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings_level.to_string());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings_format.to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match LogFormat::parse(&format) {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
        LogFormat::Compact => subscriber.compact().init(),
    }
}

fn io_error<E: std::fmt::Display>(context: &str, e: E) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io_error("Configuration error", e)
    })?;

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting case-pair service...");

    // Hosted backend holds profiles, and sessions unless a database is configured
    let tables = SupabaseTables {
        profiles: settings.supabase.profiles_table.clone(),
        sessions: settings.supabase.sessions_table.clone(),
    };
    let supabase = Arc::new(
        SupabaseClient::new(
            settings.supabase.url.clone(),
            settings.supabase.api_key.clone(),
            tables,
            settings.supabase.timeout_secs,
        )
        .map_err(|e| {
            error!("Failed to build hosted backend client: {}", e);
            io_error("Hosted backend client error", e)
        })?,
    );

    info!("Hosted backend client initialized");

    // Profile cache: Redis-backed when configured, process-local otherwise
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = match settings.cache.redis_url.as_deref() {
        Some(url) => match CacheManager::new(url, l1_cache_size, cache_ttl).await {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to connect to Redis ({}), falling back to in-process cache", e);
                CacheManager::in_memory(l1_cache_size, cache_ttl)
            }
        },
        None => CacheManager::in_memory(l1_cache_size, cache_ttl),
    };

    info!(
        "Cache manager initialized (L1: {} entries, TTL: {}s, shared: {})",
        l1_cache_size,
        cache_ttl,
        cache.is_shared()
    );

    let profiles: Arc<dyn ProfileStore> =
        Arc::new(CachedProfileStore::new(supabase.clone(), Arc::new(cache)));

    let sessions: Arc<dyn SessionStore> = match settings.database.url.as_deref() {
        Some(url) => {
            let postgres = PostgresClient::from_settings(
                url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                io_error("PostgreSQL connection error", e)
            })?;
            info!("Sessions stored in PostgreSQL with transactional admission");
            Arc::new(postgres)
        }
        None => {
            info!("Sessions stored through the hosted REST API");
            supabase.clone()
        }
    };

    let email_rule = EmailRule::new(&settings.matching.institution_domain).map_err(|e| {
        error!("Invalid institution domain {}: {}", settings.matching.institution_domain, e);
        io_error("Email rule error", e)
    })?;

    if !settings.resources.is_empty() {
        info!("Adding {} configured resources to the catalog", settings.resources.len());
    }

    info!(
        "Matching for @{} with conflict rule {:?}",
        email_rule.domain(),
        settings.matching.conflict_rule
    );

    // Build application state
    let app_state = AppState {
        profiles,
        sessions,
        identity: Arc::new(JwtIdentity::new(&settings.auth.jwt_secret, &settings.auth.audience)),
        resources: Arc::new(ResourceCatalog::with_extras(settings.resources.clone())),
        email_rule: Arc::new(email_rule),
        matcher: Matcher::new(settings.matching.max_limit as usize),
        conflict_rule: settings.matching.conflict_rule,
        default_limit: settings.matching.default_limit,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
