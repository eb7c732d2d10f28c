//! 신원 서비스 API 서버.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, middleware, routing::get, Router};
use identity_core::{
    init_logging, AppConfig, Argon2Hasher, CredentialStore, DatabaseConfig, MemoryStore,
    PasswordHasher,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use identity_api::auth::{AccessPolicy, TokenCodec};
use identity_api::{bootstrap, create_router, metrics_layer, setup_metrics_recorder, AppState};

/// 설정에 따라 저장소 선택.
///
/// `database.url`이 있으면 PostgreSQL, 없으면 인메모리 저장소를 사용합니다.
#[cfg(feature = "postgres")]
async fn create_store(
    config: &DatabaseConfig,
) -> Result<Arc<dyn CredentialStore>, Box<dyn std::error::Error>> {
    use identity_core::PgStore;

    match &config.url {
        Some(url) => {
            let store = PgStore::connect(url, config.max_connections).await?;
            store.migrate().await?;
            info!(max_connections = config.max_connections, "PostgreSQL store ready");
            Ok(Arc::new(store))
        }
        None => {
            warn!("database.url not set, using in-memory store (data is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn create_store(
    config: &DatabaseConfig,
) -> Result<Arc<dyn CredentialStore>, Box<dyn std::error::Error>> {
    if config.url.is_some() {
        warn!("database.url is set but the postgres feature is disabled, using in-memory store");
    } else {
        warn!("database.url not set, using in-memory store (data is lost on restart)");
    }
    Ok(Arc::new(MemoryStore::new()))
}

/// CORS 레이어 생성.
///
/// 허용 origin 목록이 비어 있으면 모든 origin을 허용합니다 (개발 모드).
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<_> = allowed_origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let (allow_origin, restricted) = if origins.is_empty() {
        if !allowed_origins.is_empty() {
            warn!("security.allowed_origins contains no valid origins, allowing any");
        } else {
            warn!("security.allowed_origins not set, allowing any origin (development mode)");
        }
        (AllowOrigin::any(), false)
    } else {
        info!("CORS configured with {} allowed origins", origins.len());
        (AllowOrigin::list(origins), true)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(restricted)
        .max_age(Duration::from_secs(3600))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn build_app(state: Arc<AppState>, metrics_handle: PrometheusHandle, config: &AppConfig) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    // 정책이 적용된 fallback을 유지하려면 API 라우터가 병합의 기준이어야 함
    create_router(state)
        .merge(metrics_router)
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 (30초) - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer(&config.security.allowed_origins))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default()?;
    init_logging(&config.logging)?;

    info!("Starting Identity API server...");

    let metrics_handle = setup_metrics_recorder()?;
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            error!(
                host = %config.server.host,
                port = config.server.port,
                error = %e,
                "소켓 주소 설정이 유효하지 않습니다. server.host, server.port 설정을 확인하세요."
            );
            e
        })?;

    if config.security.uses_dev_secret() {
        warn!("security.jwt_secret not set, using default (INSECURE for development only)");
    }

    let store = create_store(&config.database).await?;
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::default());

    let report = bootstrap::seed(store.as_ref(), hasher.as_ref(), &config.bootstrap).await?;
    info!(
        created_roles = report.created_roles.len(),
        admin_created = report.admin_created,
        "Bootstrap completed"
    );

    let codec = TokenCodec::new(
        config.security.jwt_secret.as_bytes(),
        chrono::Duration::seconds(config.security.token_ttl_secs),
    );
    let state = Arc::new(AppState::new(store, hasher, codec, AccessPolicy::standard()));
    info!(
        version = %state.version,
        token_ttl_secs = config.security.token_ttl_secs,
        "Application state initialized"
    );

    let app = build_app(state, metrics_handle, &config);

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
