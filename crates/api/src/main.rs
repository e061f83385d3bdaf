use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use brokerpick_core::config::Settings;
use brokerpick_core::ingest::FileRecordSource;
use brokerpick_core::invocation::{invoke, InvocationDeps, InvocationEvent, InvocationResponse};
use brokerpick_core::storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    // Fail fast on bad window/label configuration rather than on the first request.
    settings.filter_options()?;

    let state = AppState {
        settings: Arc::new(settings),
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/broker-recommendation",
            get(run_from_query).post(run_from_body),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

/// Settings are read-only; every request builds its own source and store from them.
#[derive(Debug, Clone)]
struct AppState {
    settings: Arc<Settings>,
}

async fn run_from_query(
    State(state): State<AppState>,
    Query(event): Query<InvocationEvent>,
) -> (StatusCode, Json<Value>) {
    respond(run(&state.settings, event).await)
}

async fn run_from_body(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> (StatusCode, Json<Value>) {
    let trigger = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let event = match InvocationEvent::from_trigger(&trigger) {
        Ok(event) => event,
        Err(e) => return respond(failure(e)),
    };
    respond(run(&state.settings, event).await)
}

async fn run(settings: &Settings, event: InvocationEvent) -> InvocationResponse {
    let options = match settings.filter_options() {
        Ok(options) => options,
        Err(e) => return failure(e),
    };
    let store = match storage::from_settings(settings) {
        Ok(store) => store,
        Err(e) => return failure(e),
    };
    let source = FileRecordSource::new(&settings.data_file);

    let deps = InvocationDeps {
        source: &source,
        store: store.as_ref(),
        options,
        report_prefix: &settings.report_prefix,
        now: chrono::Utc::now(),
    };

    // Failures are already reported through the sentry tracing layer.
    invoke(&event, &deps).await
}

fn failure(err: anyhow::Error) -> InvocationResponse {
    let message = format!("{err:#}");
    tracing::error!(error = %message, "invocation setup failed");
    InvocationResponse {
        status_code: 500,
        body: serde_json::json!({ "error": message }),
    }
}

fn respond(response: InvocationResponse) -> (StatusCode, Json<Value>) {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokerpick_core::domain::record::Recommendation;

    fn settings(dir: &std::path::Path, data: &str) -> Settings {
        let data_file = dir.join("broker_data.csv");
        std::fs::write(&data_file, data).unwrap();
        Settings {
            sentry_dsn: None,
            data_file: data_file.display().to_string(),
            report_dir: dir.join("reports").display().to_string(),
            report_prefix: "broker_reports".to_string(),
            report_store_base_url: None,
            report_store_api_key: None,
            report_store_timeout_secs: 30,
            window_days: 36_500,
            allowed_recommendations: vec![Recommendation::Buy, Recommendation::Sell],
            retention_days: 180,
        }
    }

    #[tokio::test]
    async fn run_writes_report_and_returns_summary() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(
            dir.path(),
            "Broker,Company,Reporting_Date,Recommendation,Profit_Potential\n\
             Kotak Securities,Wipro,2024-01-01,Buy,14.0\n",
        );

        let (status, Json(body)) = respond(run(&settings, InvocationEvent::default()).await);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["top_brokers"][0]["Broker"], "Kotak Securities");

        let location = body["report_location"].as_str().unwrap();
        assert!(std::path::Path::new(location).exists());
    }

    #[tokio::test]
    async fn post_accepts_numeric_window_days() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(
            dir.path(),
            "Broker,Company,Reporting_Date,Recommendation,Profit_Potential\n\
             Kotak Securities,Wipro,2024-01-01,Buy,14.0\n",
        );
        let state = AppState {
            settings: Arc::new(settings),
        };

        let body = serde_json::json!({"window_days": 36500, "allowed": "Buy"});
        let (status, Json(body)) = run_from_body(State(state.clone()), Some(Json(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["top_companies"][0]["Company"], "Wipro");

        let bad = serde_json::json!({"window_days": [30]});
        let (status, Json(body)) = run_from_body(State(state), Some(Json(bad))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("unexpected shape"));
    }

    #[tokio::test]
    async fn missing_source_file_is_a_500() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path(), "");
        settings.data_file = dir.path().join("absent.csv").display().to_string();

        let (status, Json(body)) = respond(run(&settings, InvocationEvent::default()).await);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("absent.csv"));
    }
}
