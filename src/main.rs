use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use roster_server::config::Config;
use roster_server::dispatcher::Dispatcher;
use roster_server::roster::document::UserId;
use roster_server::roster::store::DocumentStore;

type WebSocketSender = mpsc::UnboundedSender<hyper_tungstenite::tungstenite::Message>;

// ============================================
// Transport Messages
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum TransportMessage {
    /// Free-text message from a sender on the channel.
    Inbound { sender_id: UserId, text: String },
    /// Reply addressed to the sender of an inbound message. `actions` is
    /// the admin menu when one accompanies the reply.
    Reply {
        sender_id: UserId,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actions: Option<Vec<String>>,
    },
    /// Error message from server
    Error { message: String },
}

/// One-shot transport request body (`POST /api/messages`).
#[derive(Debug, Clone, Deserialize)]
struct InboundRequest {
    sender_id: UserId,
    text: String,
}

// ============================================
// Gateway State
// ============================================

struct Gateway {
    dispatcher: Dispatcher,
    /// Shared transport credential; `None` disables the check.
    token: Option<String>,
}

type SharedGateway = Arc<Gateway>;

// ============================================
// WebSocket Connection Handler
// ============================================

async fn handle_connection(
    ws: hyper_tungstenite::WebSocketStream<hyper::upgrade::Upgraded>,
    state: SharedGateway,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    info!("Transport session {} established", conn_id);

    let (mut ws_sender, mut ws_receiver) = ws.split();

    // Create channel for sending messages to this WebSocket
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Spawn task to forward messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages
    loop {
        tokio::select! {
            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(hyper_tungstenite::tungstenite::Message::Text(text))) => {
                        match serde_json::from_str::<TransportMessage>(&text) {
                            Ok(msg) => handle_frame(msg, &state, &tx).await,
                            Err(e) => {
                                warn!("Failed to parse transport frame: {}", e);
                                send_error(&tx, format!("Invalid message format: {}", e));
                            }
                        }
                    }
                    Some(Ok(hyper_tungstenite::tungstenite::Message::Close(_))) => {
                        info!("Transport session {} closed by client", conn_id);
                        break;
                    }
                    Some(Ok(hyper_tungstenite::tungstenite::Message::Ping(data))) => {
                        let _ = tx.send(hyper_tungstenite::tungstenite::Message::Pong(data));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("WebSocket error on session {}: {}", conn_id, e);
                        break;
                    }
                    None => break,
                }
            }
            _ = &mut send_task => {
                break;
            }
        }
    }

    send_task.abort();
}

async fn handle_frame(msg: TransportMessage, state: &SharedGateway, sender: &WebSocketSender) {
    match msg {
        TransportMessage::Inbound { sender_id, text } => {
            let Some(reply) = state.dispatcher.handle_inbound(sender_id, &text).await else {
                // Silent-ignore outcome: nothing goes back on the wire.
                return;
            };
            let out = TransportMessage::Reply {
                sender_id,
                text: reply.text,
                actions: reply.actions,
            };
            if let Ok(json) = serde_json::to_string(&out) {
                let _ = sender.send(hyper_tungstenite::tungstenite::Message::Text(json));
            }
        }
        _ => send_error(sender, "Only Inbound messages are accepted".to_string()),
    }
}

fn send_error(sender: &WebSocketSender, message: String) {
    let msg = TransportMessage::Error { message };
    if let Ok(json) = serde_json::to_string(&msg) {
        let _ = sender.send(hyper_tungstenite::tungstenite::Message::Text(json));
    }
}

// ============================================
// HTTP REST API Handlers
// ============================================

async fn handle_api_request(
    req: Request<Body>,
    state: SharedGateway,
) -> Result<Response<Body>, hyper::Error> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    match (method, path.as_str()) {
        // POST /api/messages - one-shot transport: one inbound message, one optional reply
        (Method::POST, "/api/messages") => {
            let body_bytes = hyper::body::to_bytes(req.into_body()).await?;
            match serde_json::from_slice::<InboundRequest>(&body_bytes) {
                Ok(inbound) => {
                    match state
                        .dispatcher
                        .handle_inbound(inbound.sender_id, &inbound.text)
                        .await
                    {
                        Some(reply) => {
                            let json = serde_json::to_string(&reply).unwrap();
                            Ok(Response::builder()
                                .status(StatusCode::OK)
                                .header("Content-Type", "application/json")
                                .body(Body::from(json))
                                .unwrap())
                        }
                        // Ignored per the silent-ignore rules: no reply body.
                        None => Ok(Response::builder()
                            .status(StatusCode::NO_CONTENT)
                            .body(Body::empty())
                            .unwrap()),
                    }
                }
                Err(e) => {
                    warn!("Failed to parse inbound message: {}", e);
                    Ok(Response::builder()
                        .status(StatusCode::BAD_REQUEST)
                        .body(Body::from(format!("Invalid request body: {}", e)))
                        .unwrap())
                }
            }
        }
        // GET /api/roster - read-only view of the current document
        (Method::GET, "/api/roster") => {
            let doc = state.dispatcher.snapshot().await;
            let json = serde_json::to_string(&doc).unwrap();
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(Body::from(json))
                .unwrap())
        }
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("API endpoint not found"))
            .unwrap()),
    }
}

// ============================================
// Main Request Handler
// ============================================

fn authorized(req: &Request<Body>, token: &Option<String>) -> bool {
    let Some(expected) = token else {
        return true;
    };
    req.headers()
        .get("X-Auth-Token")
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str())
}

async fn handle_request(
    mut req: Request<Body>,
    state: SharedGateway,
) -> Result<Response<Body>, hyper::Error> {
    let path = req.uri().path();
    let method = req.method().clone();

    // CORS preflight
    if method == Method::OPTIONS {
        return Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type, X-Auth-Token")
            .header("Access-Control-Max-Age", "86400")
            .body(Body::empty())
            .unwrap());
    }

    // Health check endpoint
    if path == "/health" {
        return Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Access-Control-Allow-Origin", "*")
            .body(Body::from("ok"))
            .unwrap());
    }

    // Transport credential check (boundary only; the core has no auth paths)
    if !authorized(&req, &state.token) {
        return Ok(Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .body(Body::from("Missing or invalid transport token"))
            .unwrap());
    }

    // API endpoints (REST)
    if path.starts_with("/api/") {
        let mut resp = handle_api_request(req, state).await?;
        let headers = resp.headers_mut();
        headers.insert("Access-Control-Allow-Origin", "*".parse().unwrap());
        headers.insert(
            "Access-Control-Allow-Methods",
            "GET, POST, OPTIONS".parse().unwrap(),
        );
        headers.insert(
            "Access-Control-Allow-Headers",
            "Content-Type, X-Auth-Token".parse().unwrap(),
        );
        return Ok(resp);
    }

    // WebSocket upgrade
    if hyper_tungstenite::is_upgrade_request(&req) {
        match hyper_tungstenite::upgrade(&mut req, None) {
            Ok((response, websocket)) => {
                tokio::spawn(async move {
                    if let Ok(ws) = websocket.await {
                        handle_connection(ws, state).await;
                    }
                });
                return Ok(response);
            }
            Err(e) => {
                error!("WebSocket upgrade error: {}", e);
                return Ok(Response::builder()
                    .status(StatusCode::BAD_REQUEST)
                    .body(Body::from("Invalid WebSocket upgrade request"))
                    .unwrap());
            }
        }
    }

    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Body::from(
            "Not found. Use /health for health check, /api/* for REST API, or upgrade to WebSocket.",
        ))
        .unwrap())
}

// ============================================
// Main Entry Point
// ============================================

#[tokio::main]
async fn main() {
    // Healthcheck mode: exit 0 if server is running (port in use), exit 1 if not
    if std::env::args().any(|a| a == "--healthcheck") {
        let bind = Config::load_from_env()
            .map(|c| c.bind)
            .unwrap_or_else(|_| roster_server::config::DEFAULT_BIND.to_string());
        match std::net::TcpListener::bind(&bind) {
            Ok(_) => std::process::exit(1), // Port free = server NOT running
            Err(_) => std::process::exit(0), // Port in use = server IS running (healthy)
        }
    }

    env_logger::init();

    let config = match Config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let addr: SocketAddr = match config.bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address {}: {}", config.bind, e);
            std::process::exit(1);
        }
    };

    if config.admins.is_empty() {
        warn!("Admin allowlist is empty; every sender will be treated as a participant");
    }

    let store = DocumentStore::new(&config.data_file);
    let dispatcher = Dispatcher::new(store, config.admins.iter().copied());
    let state: SharedGateway = Arc::new(Gateway {
        dispatcher,
        token: config.token.clone(),
    });

    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        async move {
            Ok::<_, hyper::Error>(service_fn(move |req| {
                let state = state.clone();
                handle_request(req, state)
            }))
        }
    });

    let server = Server::bind(&addr).serve(make_svc);

    info!("Roster server listening on http://{}", addr);
    info!("WebSocket transport: ws://{}", addr);
    info!("One-shot transport: POST http://{}/api/messages", addr);
    info!("Roster document: {}", config.data_file);
    info!("Health check: http://{}/health", addr);

    if let Err(e) = server.await {
        error!("Server error: {}", e);
    }
}
