//! Trade Dash — trading analytics dashboard backend
//!
//! Usage:
//!   trade-dash serve --port 3001              — Launch web server with UI
//!   trade-dash leaderboard                    — Print the copy-trading leaderboard
//!   trade-dash win-rates --view settled       — Print the forecaster scoreboard
//!   trade-dash bundle --address 0x...         — Run a bundle analysis
//!   trade-dash import-predictions file.json   — Load a prediction snapshot
//!   trade-dash import-arbitrage file.json     — Replace stored arbitrage events

mod config;

use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use config::AppConfig;
use engine::chart::HOUR_MS;
use engine::leaderboard::trades_from_records;
use engine::sources::read_json_array;
use engine::{
    arbitrage_view, beijing_clock, build_rows, group_trades, market_cap_view, rank_smart_wallets,
    scoreboard, sort_closing_markets, speech_probability, summarize, ActivityCategory,
    AnalyzeRequest, BundleFinderClient, ClosingSort, DatabaseSource, EventSort, OpinionSource,
    OpinionStore, PredictionSource, PredictionView, SnapshotFileSource, SortDirection,
};
use persistence::repository::{
    ActivityRepository, MarketCapRepository, OpinionArbitrageRepository, PredictionRepository,
    SmartWalletRepository, TradeRepository,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

const DEFAULT_WINDOW_HOURS: u32 = 24;
const MAX_WINDOW_HOURS: u32 = 24 * 7;

#[derive(Parser)]
#[command(name = "trade-dash")]
#[command(about = "Trading analytics dashboard backend", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the dashboard web server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 3001)]
        port: u16,
    },
    /// Print the copy-trading leaderboard grouped by followed wallet
    Leaderboard,
    /// Print win rates for every forecaster
    WinRates {
        /// all, settled or exclusive
        #[arg(long, default_value = "all")]
        view: String,
    },
    /// Ask the analysis server for wallets bundled with an address
    Bundle {
        #[arg(long)]
        address: String,
        #[arg(long, default_value = "56")]
        chain_id: String,
        #[arg(long, default_value_t = 50)]
        token_count: u32,
        #[arg(long, default_value_t = 100)]
        history_limit: u32,
        /// Analysis scope: small, middle, large
        #[arg(long, default_value = "middle")]
        scope: String,
        /// fast or precise
        #[arg(long, default_value = "precise")]
        precision: String,
    },
    /// Upsert a JSON snapshot of predictions into the database
    ImportPredictions {
        path: PathBuf,
    },
    /// Replace the stored arbitrage events with a JSON array from disk
    ImportArbitrage {
        path: PathBuf,
    },
}

#[derive(Clone)]
struct AppState {
    db: Arc<persistence::Database>,
    bundle: Arc<BundleFinderClient>,
    predictions: Arc<dyn PredictionSource>,
    opinion: Arc<dyn OpinionSource>,
    handles: Arc<Vec<String>>,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,engine=debug,trade_dash=debug")
    } else {
        EnvFilter::new("info,engine=info,trade_dash=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

async fn open_database(path: &str) -> anyhow::Result<persistence::Database> {
    persistence::Database::new(path).await.map_err(|e| {
        error!("Failed to initialize database: {}", e);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })
}

fn prediction_source(config: &AppConfig, db: &persistence::Database) -> Arc<dyn PredictionSource> {
    match &config.predictions_snapshot {
        Some(path) => {
            info!("Predictions from snapshot: {}", path.display());
            Arc::new(SnapshotFileSource::new(path))
        }
        None => Arc::new(DatabaseSource::new(db.pool_clone())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(&config, &host, port).await?;
        }
        Commands::Leaderboard => {
            cmd_leaderboard(&config).await?;
        }
        Commands::WinRates { view } => {
            cmd_win_rates(&config, &view).await?;
        }
        Commands::Bundle {
            address,
            chain_id,
            token_count,
            history_limit,
            scope,
            precision,
        } => {
            let request = AnalyzeRequest {
                address,
                chain_id,
                desired_token_count: token_count,
                history_limit,
                scope,
                precision,
            };
            cmd_bundle(&config, request).await?;
        }
        Commands::ImportPredictions { path } => {
            cmd_import_predictions(&config, &path).await?;
        }
        Commands::ImportArbitrage { path } => {
            cmd_import_arbitrage(&config, &path).await?;
        }
    }

    Ok(())
}

// ============================================================================
// Serve command — Axum web server
// ============================================================================

fn build_router(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(api_health))
        .route("/copy-trading", get(api_copy_trading))
        .route("/smart-wallets", get(api_smart_wallets))
        .route("/predictions", get(api_predictions))
        .route("/predictions/win-rates", get(api_win_rates))
        .route("/speech-probability", get(api_speech_probability))
        .route("/market-cap-ceiling", get(api_market_cap_ceiling))
        .route("/bundle-finder", post(api_bundle_finder))
        .route("/opinion/arbitrage", get(api_opinion_arbitrage))
        .route("/opinion/closing", get(api_opinion_closing))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
}

async fn cmd_serve(config: &AppConfig, host: &str, port: u16) -> anyhow::Result<()> {
    info!("Trade Dash v{} starting...", APP_VERSION);

    let db = open_database(&config.db_path).await?;
    info!("Database initialized: {}", config.db_path);

    let state = AppState {
        predictions: prediction_source(config, &db),
        opinion: Arc::new(OpinionStore::new(
            db.pool_clone(),
            &config.arbitrage_snapshot,
            &config.closing_snapshot,
        )),
        db: Arc::new(db),
        bundle: Arc::new(BundleFinderClient::new(config.bundle_url.clone())),
        handles: Arc::new(config.tracked_handles.clone()),
    };

    // Determine static files directory
    let exe_path = std::env::current_exe().unwrap_or_default();
    let exe_dir = exe_path.parent().unwrap_or(Path::new("."));
    let dist_dir = exe_dir.join("dist");
    let static_dir = if dist_dir.exists() {
        dist_dir
    } else {
        PathBuf::from("dist")
    };

    let app = build_router(state, &static_dir);

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== Trade Dash v{} ===", APP_VERSION);
    println!("Listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET  /api/health                  - Health check");
    println!("  GET  /api/copy-trading            - Copy-trading leaderboard");
    println!("  GET  /api/smart-wallets           - Smart wallets by profit");
    println!("  GET  /api/predictions             - Human vs AI predictions (?view=)");
    println!("  GET  /api/predictions/win-rates   - Forecaster win rates (?view=)");
    println!("  GET  /api/speech-probability      - Hourly speech probability (?category=)");
    println!("  GET  /api/market-cap-ceiling      - Launch market-cap scatter");
    println!("  POST /api/bundle-finder           - Bundle analysis (proxied)");
    println!("  GET  /api/opinion/arbitrage       - Opinion vs Polymarket spreads (?sort=&direction=)");
    println!("  GET  /api/opinion/closing         - Opinion markets near cutoff (?sort=&direction=)");
    println!("\n  Database: {}", config.db_path);
    println!("  Bundle finder: {}", config.bundle_url);
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// CLI commands (no web server)
// ============================================================================

async fn cmd_leaderboard(config: &AppConfig) -> anyhow::Result<()> {
    let db = open_database(&config.db_path).await?;
    let records = TradeRepository::new(db.pool()).get_all().await?;
    let traders = group_trades(trades_from_records(records));
    let summary = summarize(&traders);

    println!("\n=== Copy-Trading Leaderboard ===");
    println!(
        "{} traders | {} trades | invested {} | realized PnL {}\n",
        summary.traders, summary.total_trades, summary.total_invested, summary.total_realized_pnl
    );
    println!(
        "{:<4} {:<20} {:<44} {:>7} {:>14} {:>14}",
        "#", "Label", "Wallet", "Trades", "Invested", "PnL"
    );
    println!("{}", "-".repeat(108));
    for (i, t) in traders.iter().enumerate() {
        println!(
            "{:<4} {:<20} {:<44} {:>7} {:>14} {:>14}",
            i + 1,
            t.label,
            t.proxy_wallet,
            t.total_trades,
            t.total_invested.round_dp(2),
            t.total_realized_pnl.round_dp(2)
        );
    }

    Ok(())
}

async fn cmd_win_rates(config: &AppConfig, view: &str) -> anyhow::Result<()> {
    let view: PredictionView = view.parse().map_err(anyhow::Error::msg)?;
    let db = open_database(&config.db_path).await?;
    let predictions = prediction_source(config, &db).load().await?;

    println!("\n=== Win Rates ({:?}, {} markets) ===\n", view, predictions.len());
    for score in scoreboard(&predictions, view) {
        println!(
            "  {:<12} {:>6}%  ({}/{})",
            score.label, score.result.rate, score.result.correct, score.result.total
        );
    }

    Ok(())
}

async fn cmd_bundle(config: &AppConfig, request: AnalyzeRequest) -> anyhow::Result<()> {
    if request.address.trim().is_empty() {
        anyhow::bail!("Please enter a wallet address");
    }

    let client = BundleFinderClient::new(config.bundle_url.clone());
    let result = client.analyze(&request).await?;

    println!("\n=== Bundle Analysis: {} ===", request.address);
    for step in &result.steps {
        println!("  [{}] {}: {}", step.status, step.name, step.message);
    }
    println!(
        "\nBundle detected: {}{}",
        if result.has_bundle { "yes" } else { "no" },
        if result.from_cache == Some(true) { " (cached)" } else { "" }
    );
    for s in &result.suspects {
        println!(
            "  {}  score {:.2}  shared {}/{}",
            s.address, s.score, s.count, s.total_analyzed
        );
    }

    Ok(())
}

async fn cmd_import_predictions(config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let records = SnapshotFileSource::new(path).read_records().await?;
    if records.is_empty() {
        warn!("No predictions found in {}", path.display());
        return Ok(());
    }

    let db = open_database(&config.db_path).await?;
    let saved = PredictionRepository::new(db.pool()).save_all(&records).await?;
    info!(saved, path = %path.display(), "Predictions imported");
    println!("Imported {} predictions into {}", saved, config.db_path);

    Ok(())
}

async fn cmd_import_arbitrage(config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let events: Vec<serde_json::Value> = read_json_array(path).await?;
    if events.is_empty() {
        warn!("No arbitrage events found in {}", path.display());
        return Ok(());
    }

    let raw: Vec<String> = events.iter().map(|e| e.to_string()).collect();
    let db = open_database(&config.db_path).await?;
    let saved = OpinionArbitrageRepository::new(db.pool())
        .replace_all(&raw)
        .await?;
    info!(saved, path = %path.display(), "Arbitrage events imported");
    println!("Imported {} arbitrage events into {}", saved, config.db_path);

    Ok(())
}

// ============================================================================
// API Handlers — Health & Copy Trading
// ============================================================================

async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "trade-dash",
        "version": APP_VERSION,
    }))
}

fn fetch_failed(what: &str, e: impl std::fmt::Display) -> Json<serde_json::Value> {
    error!("Failed to fetch {}: {}", what, e);
    Json(serde_json::json!({
        "success": false,
        "error": format!("Failed to fetch {}: {}", what, e),
        "data": [],
    }))
}

/// GET /api/copy-trading — summary cards plus traders by realized PnL
async fn api_copy_trading(State(state): State<AppState>) -> Json<serde_json::Value> {
    match TradeRepository::new(state.db.pool()).get_all().await {
        Ok(records) => {
            let traders = group_trades(trades_from_records(records));
            Json(serde_json::json!({
                "success": true,
                "summary": summarize(&traders),
                "data": traders,
            }))
        }
        Err(e) => fetch_failed("trades", e),
    }
}

/// GET /api/smart-wallets
async fn api_smart_wallets(State(state): State<AppState>) -> Json<serde_json::Value> {
    match SmartWalletRepository::new(state.db.pool()).get_all().await {
        Ok(records) => {
            let wallets = rank_smart_wallets(records);
            Json(serde_json::json!({
                "success": true,
                "total": wallets.len(),
                "data": wallets,
            }))
        }
        Err(e) => fetch_failed("smart wallets", e),
    }
}

// ============================================================================
// API Handlers — Predictions
// ============================================================================

fn invalid_param(key: &str, e: impl Display) -> Json<serde_json::Value> {
    warn!("Rejected query parameter {}: {}", key, e);
    Json(serde_json::json!({
        "success": false,
        "error": format!("invalid {}: {}", key, e),
        "data": [],
    }))
}

/// Optional query value; blank counts as absent
fn parse_value<T>(key: &str, raw: Option<&str>) -> Result<Option<T>, Json<serde_json::Value>>
where
    T: FromStr,
    T::Err: Display,
{
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| raw.parse::<T>().map_err(|e| invalid_param(key, e)))
        .transpose()
}

fn parse_param<T>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, Json<serde_json::Value>>
where
    T: FromStr,
    T::Err: Display,
{
    parse_value(key, params.get(key).map(String::as_str))
}

fn parse_sort<S>(
    params: &HashMap<String, String>,
) -> Result<(Option<S>, Option<SortDirection>), Json<serde_json::Value>>
where
    S: FromStr,
    S::Err: Display,
{
    Ok((parse_param(params, "sort")?, parse_param(params, "direction")?))
}

fn parse_view(params: &HashMap<String, String>) -> Result<PredictionView, Json<serde_json::Value>> {
    Ok(parse_param(params, "view")?.unwrap_or_default())
}

/// GET /api/predictions?view=all|settled|exclusive
async fn api_predictions(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let view = match parse_view(&params) {
        Ok(view) => view,
        Err(resp) => return resp,
    };

    match state.predictions.load().await {
        Ok(predictions) => {
            let rows = build_rows(&predictions, view);
            Json(serde_json::json!({
                "success": true,
                "view": view,
                "total": rows.len(),
                "data": rows,
            }))
        }
        Err(e) => fetch_failed("predictions", e),
    }
}

/// GET /api/predictions/win-rates?view=
async fn api_win_rates(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let view = match parse_view(&params) {
        Ok(view) => view,
        Err(resp) => return resp,
    };

    match state.predictions.load().await {
        Ok(predictions) => Json(serde_json::json!({
            "success": true,
            "view": view,
            "data": scoreboard(&predictions, view),
        })),
        Err(e) => fetch_failed("predictions", e),
    }
}

// ============================================================================
// API Handlers — Charts
// ============================================================================

/// GET /api/speech-probability?category=all|post|retweet — today's profiles
/// on the Beijing clock
async fn api_speech_probability(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let category: ActivityCategory = match parse_param(&params, "category") {
        Ok(category) => category.unwrap_or_default(),
        Err(resp) => return resp,
    };
    let clock = beijing_clock(Utc::now());
    let repo = ActivityRepository::new(state.db.pool());

    match repo
        .get_profiles(&state.handles, clock.day_of_week, category.as_str())
        .await
    {
        Ok(rows) => Json(serde_json::json!({
            "success": true,
            "handles": state.handles.as_slice(),
            "data": speech_probability(&rows, &state.handles, category, clock),
        })),
        Err(e) => fetch_failed("activity profiles", e),
    }
}

/// Raw strings so malformed numbers get the JSON error shape
#[derive(Debug, Default, Deserialize)]
struct MarketCapParams {
    window_hours: Option<String>,
    y_max: Option<String>,
}

impl MarketCapParams {
    fn parse(&self) -> Result<(u32, Option<f64>), Json<serde_json::Value>> {
        let window_hours = parse_value::<u32>("window_hours", self.window_hours.as_deref())?
            .unwrap_or(DEFAULT_WINDOW_HOURS)
            .clamp(1, MAX_WINDOW_HOURS);
        let y_max = parse_value::<f64>("y_max", self.y_max.as_deref())?;
        Ok((window_hours, y_max))
    }
}

/// GET /api/market-cap-ceiling?window_hours=24&y_max=500
async fn api_market_cap_ceiling(
    State(state): State<AppState>,
    Query(params): Query<MarketCapParams>,
) -> Json<serde_json::Value> {
    let (window_hours, y_max) = match params.parse() {
        Ok(parsed) => parsed,
        Err(resp) => return resp,
    };
    let now_ms = Utc::now().timestamp_millis();
    let cutoff = now_ms - i64::from(window_hours) * HOUR_MS;

    match MarketCapRepository::new(state.db.pool())
        .get_eligible_since(cutoff)
        .await
    {
        Ok(rows) => Json(serde_json::json!({
            "success": true,
            "data": market_cap_view(&rows, now_ms, window_hours, y_max),
        })),
        Err(e) => fetch_failed("market cap data", e),
    }
}

// ============================================================================
// API Handlers — Bundle Finder
// ============================================================================

/// Request body; everything except the address falls back to the defaults
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BundleFinderBody {
    address: String,
    chain_id: Option<String>,
    desired_token_count: Option<u32>,
    history_limit: Option<u32>,
    scope: Option<String>,
    precision: Option<String>,
}

impl BundleFinderBody {
    fn into_request(self) -> AnalyzeRequest {
        let defaults = AnalyzeRequest::new(self.address.trim());
        AnalyzeRequest {
            chain_id: self.chain_id.unwrap_or(defaults.chain_id),
            desired_token_count: self.desired_token_count.unwrap_or(defaults.desired_token_count),
            history_limit: self.history_limit.unwrap_or(defaults.history_limit),
            scope: self.scope.unwrap_or(defaults.scope),
            precision: self.precision.unwrap_or(defaults.precision),
            address: defaults.address,
        }
    }
}

/// POST /api/bundle-finder — forward to the analysis server, no retries
async fn api_bundle_finder(
    State(state): State<AppState>,
    Json(body): Json<BundleFinderBody>,
) -> Json<serde_json::Value> {
    if body.address.trim().is_empty() {
        return Json(serde_json::json!({
            "success": false,
            "error": "Please enter a wallet address",
            "data": [],
        }));
    }

    let request = body.into_request();
    info!(address = %request.address, scope = %request.scope, "Bundle analysis requested");

    match state.bundle.analyze(&request).await {
        Ok(result) => Json(serde_json::json!({
            "success": true,
            "data": result,
        })),
        Err(e) => {
            error!("Bundle analysis failed: {}", e);
            Json(serde_json::json!({
                "success": false,
                "error": e.to_string(),
                "data": [],
            }))
        }
    }
}

// ============================================================================
// API Handlers — Opinion Arbitrage
// ============================================================================

/// GET /api/opinion/arbitrage?sort=opinion_volume|polymarket_volume|cutoff&direction=asc|desc
async fn api_opinion_arbitrage(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let (sort, direction) = match parse_sort::<EventSort>(&params) {
        Ok(parsed) => parsed,
        Err(resp) => return resp,
    };

    match state.opinion.arbitrage_events().await {
        Ok(events) => {
            let view = arbitrage_view(events, sort.unwrap_or_default(), direction);
            Json(serde_json::json!({
                "success": true,
                "total": view.events.len(),
                "data": view,
            }))
        }
        Err(e) => fetch_failed("arbitrage events", e),
    }
}

/// GET /api/opinion/closing?sort=cutoff|volume&direction=asc|desc
async fn api_opinion_closing(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let (sort, direction) = match parse_sort::<ClosingSort>(&params) {
        Ok(parsed) => parsed,
        Err(resp) => return resp,
    };

    match state.opinion.closing_markets().await {
        Ok(markets) => {
            let view = sort_closing_markets(markets, sort.unwrap_or_default(), direction);
            Json(serde_json::json!({
                "success": true,
                "total": view.markets.len(),
                "data": view,
            }))
        }
        Err(e) => fetch_failed("closing markets", e),
    }
}
