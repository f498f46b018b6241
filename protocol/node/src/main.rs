mod config;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use config::NodeConfig;
use serde::Serialize;
use state::MemStore;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use truedemocracy::{
    default_genesis, load_genesis_from_file, App, Coin, Event, InMemoryBank, Msg, MsgResponse,
    Query, QueryResponse,
};

#[derive(Clone)]
struct Node {
    app: Arc<Mutex<App<MemStore>>>,
    bank: InMemoryBank,
    chain_id: String,
}

#[derive(Debug, Serialize)]
struct TxResult {
    height: i64,
    response: MsgResponse,
    events: Vec<Event>,
}

#[derive(Debug, Serialize)]
struct Status {
    chain_id: String,
    height: i64,
    block_time: i64,
    app_hash: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

struct ApiError(truedemocracy::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            truedemocracy::Error::NotFound(_) | truedemocracy::Error::UnknownRequest(_) => {
                StatusCode::NOT_FOUND
            }
            truedemocracy::Error::Unauthorized(_) => StatusCode::FORBIDDEN,
            truedemocracy::Error::InvalidRequest(_)
            | truedemocracy::Error::InsufficientFunds(_) => StatusCode::BAD_REQUEST,
            truedemocracy::Error::Logic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            code: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::load()?;
    tracing_subscriber::fmt().with_env_filter(config.log_filter()).init();
    info!("starting truedemocracy node, chain {}", config.chain_id);

    let genesis = match &config.genesis {
        Some(path) => {
            info!("loading genesis from {}", path.display());
            load_genesis_from_file(path)?
        }
        None => default_genesis(),
    };

    let bank = InMemoryBank::new();
    for account in &config.accounts {
        bank.fund(&account.address, Coin::pnyx(account.amount)).await;
    }

    let mut app = App::new(MemStore::new()).with_bank(Arc::new(bank.clone()));
    let updates = app.init_genesis(&genesis, now_secs()).context("applying genesis")?;
    info!("genesis validator set has {} entries", updates.len());
    app.commit();

    let node = Node {
        app: Arc::new(Mutex::new(app)),
        bank,
        chain_id: config.chain_id.clone(),
    };

    let producer = spawn_block_production(node.clone(), config.block_time_ms);

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("rpc listening on {}", addr);
    axum::serve(listener, router(node)).await?;

    producer.abort();
    Ok(())
}

fn router(node: Node) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(status))
        .route("/tx", post(submit_tx))
        .route("/query", post(query))
        .route("/balance/:address", get(balance))
        .with_state(node)
}

/// Empty-evidence blocks on a fixed interval: begin, end, commit.
fn spawn_block_production(node: Node, block_time_ms: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(block_time_ms.max(1)));
        loop {
            interval.tick().await;
            produce_block(&node, now_secs()).await;
        }
    })
}

async fn produce_block(node: &Node, wall_clock: i64) {
    let mut app = node.app.lock().await;
    let height = app.block_height() + 1;
    // block time never runs backwards
    let time = wall_clock.max(app.block_time());
    if let Err(err) = app.begin_block(time, height, &[]) {
        warn!("begin_block at height {} failed: {}", height, err);
        return;
    }
    match app.end_block() {
        Ok((updates, events)) => {
            if !updates.is_empty() {
                info!("height {}: {} validator updates", height, updates.len());
            }
            debug!("height {}: {} end-block events", height, events.len());
        }
        Err(err) => warn!("end_block at height {} failed: {}", height, err),
    }
    app.commit();
}

async fn status(State(node): State<Node>) -> Json<Status> {
    let app = node.app.lock().await;
    Json(Status {
        chain_id: node.chain_id.clone(),
        height: app.block_height(),
        block_time: app.block_time(),
        app_hash: hex::encode(app.commit()),
    })
}

async fn submit_tx(
    State(node): State<Node>,
    Json(msg): Json<Msg>,
) -> Result<Json<TxResult>, ApiError> {
    let mut app = node.app.lock().await;
    let (response, events) = app.deliver(&msg).await.map_err(ApiError)?;
    Ok(Json(TxResult {
        height: app.block_height(),
        response,
        events,
    }))
}

async fn query(
    State(node): State<Node>,
    Json(query): Json<Query>,
) -> Result<Json<QueryResponse>, ApiError> {
    let app = node.app.lock().await;
    app.query(&query).map(Json).map_err(ApiError)
}

async fn balance(State(node): State<Node>, Path(address): Path<String>) -> Json<serde_json::Value> {
    let coins = node.bank.balance(&address).await;
    Json(serde_json::json!({ "address": address, "balance": coins }))
}
