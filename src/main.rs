use axum::{
    routing::{get, post},
    Router,
};
use chrono::{Datelike, Local, NaiveDate};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod cli;
mod config;
mod error;
mod handlers;
mod models;
mod services;

use config::Config;
use services::calendar::EventSource;
use services::heatmap::HeatmapGenerator;
use services::record_store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: RecordStore,
    pub heatmaps: HeatmapGenerator,
    pub events: EventSource,
}

impl AppState {
    pub fn new(config: Config) -> error::AppResult<Self> {
        let store = RecordStore::open(&config.base_dir)?;
        let heatmaps = HeatmapGenerator::new(config.heatmap_dir());
        let events = EventSource::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            store,
            heatmaps,
            events,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/events/today", get(handlers::events::get_today_events))
        .route("/api/diaries", post(handlers::diaries::save_diary))
        .route("/api/diaries/:date", get(handlers::diaries::get_diary))
        .route("/api/history", get(handlers::diaries::list_history))
        .route("/api/heatmaps", post(handlers::heatmaps::generate_heatmaps))
        .route("/heatmaps/:filename", get(handlers::heatmaps::serve_heatmap))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = std::iter::once(&config.frontend_url)
        .chain(config.cors_extra_origins.iter())
        .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT])
}

fn usage(opts: &getopts::Options) -> String {
    opts.usage("Usage: diarylog [serve|new|heatmaps] [options]")
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "diarylog=debug,tower_http=debug".into());
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let cors = cors_layer(&config);
    let addr = config.listen_addr();
    let state = AppState::new(config)?;
    tracing::info!(path = %state.store.base_dir().display(), "Using diary directory");

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut opts = getopts::Options::new();
    opts.optopt("d", "dir", "diary directory (overrides DIARY_BASE_DIR)", "DIR");
    opts.optopt("y", "year", "heatmap year (default: current year)", "YEAR");
    opts.optopt("", "date", "entry date for `new` (default: today)", "YYYY-MM-DD");
    opts.optflag("h", "help", "print this help");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{e}\n\n{}", usage(&opts));
            std::process::exit(2);
        }
    };
    if matches.opt_present("h") {
        println!("{}", usage(&opts));
        return Ok(());
    }

    let mut config = Config::from_env()?;
    if let Some(dir) = matches.opt_str("d") {
        config.base_dir = dir.into();
    }

    let command = matches.free.first().map(String::as_str).unwrap_or("serve");
    init_tracing(command == "serve");

    let result = match command {
        "serve" => return serve(config).await,
        "new" => {
            let date = match matches.opt_str("date") {
                Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .map_err(|e| anyhow::anyhow!("--date must be YYYY-MM-DD: {e}"))?,
                None => Local::now().date_naive(),
            };
            let events = EventSource::from_config(&config)?;
            let stdin = std::io::stdin();
            let mut prompter = cli::Prompter::new(stdin.lock(), std::io::stdout());
            cli::run_new(&config, &events, date, &mut prompter).await
        }
        "heatmaps" => {
            let year = match matches.opt_str("y") {
                Some(raw) => raw
                    .parse()
                    .map_err(|e| anyhow::anyhow!("--year must be a number: {e}"))?,
                None => Local::now().year(),
            };
            let stdin = std::io::stdin();
            let mut prompter = cli::Prompter::new(stdin.lock(), std::io::stdout());
            cli::generate_and_report(&config, year, &mut prompter)
        }
        other => {
            eprintln!("Unknown command: {other}\n\n{}", usage(&opts));
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app(dir: &std::path::Path) -> Router {
        router(AppState::new(Config::with_base_dir(dir)).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().expect("tempdir");
        let res = test_app(dir.path()).oneshot(get("/health")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_save_diary_then_conflict() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test_app(dir.path());
        let body = json!({
            "date": "2026-03-01",
            "emotion": "开心😊",
            "appetite": "食欲稳定🥗",
            "confidence": "自信满满",
            "events": [{"subject": "Standup", "start": "09:00", "end": "09:15"}],
            "diary": "Good day."
        });

        let res = app.clone().oneshot(post_json("/api/diaries", body.clone())).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["file"], "20260301.md");

        let content = std::fs::read_to_string(dir.path().join("20260301.md")).unwrap();
        assert!(content.contains("Date: 2026-03-01T00:00:00"));
        assert!(content.contains("Location: 东涌镇,中国,广东省,广州市 南沙区"));
        assert!(content.contains("- 09:00 - 09:15: Standup"));

        let res = app.clone().oneshot(post_json("/api/diaries", body.clone())).await.unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert!(json_body(res).await["error"].is_string());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("20260301.md")).unwrap(),
            content
        );

        let mut overwrite = body;
        overwrite["overwrite"] = json!(true);
        overwrite["emotion"] = json!("平静😐");
        let res = app.clone().oneshot(post_json("/api/diaries", overwrite)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app.oneshot(get("/api/diaries/2026-03-01")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let record = json_body(res).await;
        assert_eq!(record["metadata"]["emotion"], "平静😐");
        assert_eq!(record["events"][0]["subject"], "Standup");
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test_app(dir.path());

        let res = app
            .clone()
            .oneshot(post_json("/api/diaries", json!({"emotion": "meh"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(res).await["error"].as_str().unwrap().contains("emotion"));

        let res = app
            .clone()
            .oneshot(post_json("/api/diaries", json!({"date": "not-a-date"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app.oneshot(get("/api/diaries/someday")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_diary_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let res = test_app(dir.path())
            .oneshot(get("/api/diaries/20260101"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("20260101.md"),
            "---\nDate: 2026-01-01T08:00:00\nEmotion: 开心😊\n---\n\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("20260102.md"), "---\nAppetite: 想吃辣的🌶\n---\n\n").unwrap();

        let res = test_app(dir.path()).oneshot(get("/api/history")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let history = json_body(res).await;
        assert_eq!(history[0]["date"], "2026-01-02");
        assert_eq!(history[0]["appetite"], "想吃辣的🌶");
        assert_eq!(history[1]["date"], "2026-01-01");
        assert_eq!(history[1]["emotion"], "开心😊");
    }

    #[tokio::test]
    async fn test_generate_and_serve_heatmap() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("20260214.md"),
            "---\nDate: 2026-02-14T22:00:00\nEmotion: 幸福🥰\n---\n\n",
        )
        .unwrap();
        let app = test_app(dir.path());

        let res = app
            .clone()
            .oneshot(post_json("/api/heatmaps", json!({"year": 2026})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let report = json_body(res).await;
        assert_eq!(report["fields"][0]["field"], "Emotion");
        assert_eq!(report["fields"][0]["status"], "written");
        assert_eq!(report["fields"][1]["status"], "skipped");

        let res = app.clone().oneshot(get("/heatmaps/2026_Emotion.png")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");

        let res = app.clone().oneshot(get("/heatmaps/2026_Appetite.png")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = app.oneshot(get("/heatmaps/secrets.txt")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_today_events_without_calendar() {
        let dir = tempfile::tempdir().expect("tempdir");
        let res = test_app(dir.path()).oneshot(get("/api/events/today")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await, json!([]));
    }
}
