//! Realtime change feed
//!
//! Listens for `postgres_changes` on the report table over the backend's
//! Phoenix-channel WebSocket (`/realtime/v1/websocket`).
//!
//! ## Protocol
//!
//! 1. Connect with `apikey` and `vsn=1.0.0` query parameters
//! 2. `phx_join` on `realtime:{channel}` with a `postgres_changes` config
//! 3. Wait for the `phx_reply` to the join
//! 4. `heartbeat` on topic `phoenix` every few seconds
//! 5. Each `postgres_changes` message becomes one [`ChangeEvent`]
//! 6. `phx_leave` on unsubscribe
//!
//! The feed ends when the server closes the channel or the socket.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::rest::RestStoreConfig;
use super::{ChangeEvent, ChangeKind, StoreError, StoreResult, Subscription};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

const PHOENIX_TOPIC: &str = "phoenix";

/// Realtime connection settings
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Project base URL (http/https; converted to ws/wss)
    pub url: String,
    pub api_key: String,
    /// Channel name; the Phoenix topic is `realtime:{channel}`
    pub channel: String,
    pub schema: String,
    pub table: String,
    pub heartbeat: Duration,
    /// Bound on the socket connect and on the wait for the join reply
    pub join_timeout: Duration,
}

impl RealtimeConfig {
    /// Derive realtime settings from the REST settings of the same project
    pub fn from_rest(rest: &RestStoreConfig, channel: impl Into<String>) -> Self {
        Self {
            url: rest.url.clone(),
            api_key: rest.api_key.clone(),
            channel: channel.into(),
            schema: "public".to_string(),
            table: rest.table.clone(),
            heartbeat: Duration::from_secs(25),
            join_timeout: Duration::from_secs(10),
        }
    }

    /// WebSocket endpoint URL including credentials
    pub fn socket_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };

        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            base,
            urlencoding::encode(&self.api_key)
        )
    }

    pub fn topic(&self) -> String {
        format!("realtime:{}", self.channel)
    }
}

/// Phoenix channel frame (JSON serializer v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PhoenixMessage {
    topic: String,
    event: String,
    #[serde(default)]
    payload: Value,
    #[serde(rename = "ref", default)]
    msg_ref: Option<String>,
}

/// What an inbound frame means for the listener
#[derive(Debug, PartialEq)]
enum Inbound {
    Change(ChangeEvent),
    JoinOk,
    JoinError(String),
    Closed(String),
    Ignore,
}

/// Opens change feeds against the realtime endpoint
pub struct RealtimeListener {
    config: RealtimeConfig,
}

impl RealtimeListener {
    pub fn new(config: RealtimeConfig) -> Self {
        Self { config }
    }

    /// Connect, join the channel and hand back a running subscription
    pub async fn connect(self) -> StoreResult<Subscription> {
        let url = self.config.socket_url();
        let (stream, _) = tokio::time::timeout(self.config.join_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| StoreError::Subscription("timed out connecting to realtime endpoint".to_string()))??;
        let (mut writer, mut reader) = stream.split();

        let topic = self.config.topic();
        let mut refs = RefCounter::default();
        let join_ref = refs.next();

        send_frame(&mut writer, &self.join_frame(&join_ref)).await?;

        tokio::time::timeout(
            self.config.join_timeout,
            await_join(&mut reader, &topic, &join_ref, &self.config.table),
        )
        .await
        .map_err(|_| StoreError::Subscription("timed out joining realtime channel".to_string()))??;

        tracing::info!(topic = %topic, table = %self.config.table, "Realtime channel joined");

        let (tx, rx) = mpsc::channel(64);
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run_channel(
            self.config,
            writer,
            reader,
            tx,
            stop_rx,
            refs,
            join_ref,
        ));

        Ok(Subscription::new(rx, stop_tx, task))
    }

    fn join_frame(&self, join_ref: &str) -> PhoenixMessage {
        PhoenixMessage {
            topic: self.config.topic(),
            event: "phx_join".to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": [{
                        "event": "*",
                        "schema": self.config.schema,
                        "table": self.config.table,
                    }],
                },
                "access_token": self.config.api_key,
            }),
            msg_ref: Some(join_ref.to_string()),
        }
    }
}

#[derive(Default)]
struct RefCounter(u64);

impl RefCounter {
    fn next(&mut self) -> String {
        self.0 += 1;
        self.0.to_string()
    }
}

async fn send_frame(writer: &mut WsWriter, frame: &PhoenixMessage) -> StoreResult<()> {
    let text = serde_json::to_string(frame)?;
    writer.send(Message::Text(text)).await?;
    Ok(())
}

async fn await_join(reader: &mut WsReader, topic: &str, join_ref: &str, table: &str) -> StoreResult<()> {
    while let Some(msg) = reader.next().await {
        let Message::Text(text) = msg? else {
            continue;
        };
        let Ok(frame) = serde_json::from_str::<PhoenixMessage>(&text) else {
            continue;
        };
        match interpret(&frame, topic, join_ref, table) {
            Inbound::JoinOk => return Ok(()),
            Inbound::JoinError(reason) | Inbound::Closed(reason) => {
                return Err(StoreError::Subscription(reason));
            }
            Inbound::Change(_) | Inbound::Ignore => {}
        }
    }
    Err(StoreError::Subscription(
        "socket closed before join completed".to_string(),
    ))
}

/// Listener loop. Exits on stop, handle drop, consumer drop, or channel close.
async fn run_channel(
    config: RealtimeConfig,
    mut writer: WsWriter,
    mut reader: WsReader,
    tx: mpsc::Sender<ChangeEvent>,
    mut stop_rx: oneshot::Receiver<()>,
    mut refs: RefCounter,
    join_ref: String,
) {
    let topic = config.topic();
    let mut heartbeat = tokio::time::interval(config.heartbeat);
    heartbeat.tick().await;

    let leave = loop {
        tokio::select! {
            _ = &mut stop_rx => break true,
            _ = heartbeat.tick() => {
                let frame = PhoenixMessage {
                    topic: PHOENIX_TOPIC.to_string(),
                    event: "heartbeat".to_string(),
                    payload: json!({}),
                    msg_ref: Some(refs.next()),
                };
                if let Err(e) = send_frame(&mut writer, &frame).await {
                    tracing::warn!(error = %e, "Realtime heartbeat failed");
                    break false;
                }
            }
            msg = reader.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let frame = match serde_json::from_str::<PhoenixMessage>(&text) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::debug!(error = %e, "Ignoring malformed realtime frame");
                            continue;
                        }
                    };
                    match interpret(&frame, &topic, &join_ref, &config.table) {
                        Inbound::Change(event) => {
                            tracing::debug!(kind = ?event.kind, table = %event.table, "Realtime change");
                            if tx.send(event).await.is_err() {
                                break true;
                            }
                        }
                        Inbound::Closed(reason) | Inbound::JoinError(reason) => {
                            tracing::warn!(topic = %topic, reason = %reason, "Realtime channel closed by server");
                            break false;
                        }
                        Inbound::JoinOk | Inbound::Ignore => {}
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::warn!(topic = %topic, "Realtime socket closed");
                    break false;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(topic = %topic, error = %e, "Realtime socket error");
                    break false;
                }
            },
        }
    };

    if leave {
        let frame = PhoenixMessage {
            topic: topic.clone(),
            event: "phx_leave".to_string(),
            payload: json!({}),
            msg_ref: Some(refs.next()),
        };
        if let Err(e) = send_frame(&mut writer, &frame).await {
            tracing::debug!(error = %e, "Failed to send phx_leave");
        }
    }
    let _ = writer.close().await;
    tracing::info!(topic = %topic, "Realtime listener stopped");
}

fn interpret(frame: &PhoenixMessage, topic: &str, join_ref: &str, table: &str) -> Inbound {
    if frame.topic != topic {
        return Inbound::Ignore;
    }

    match frame.event.as_str() {
        "phx_reply" if frame.msg_ref.as_deref() == Some(join_ref) => {
            match frame.payload.get("status").and_then(Value::as_str) {
                Some("ok") => Inbound::JoinOk,
                _ => Inbound::JoinError(reply_reason(&frame.payload)),
            }
        }
        "postgres_changes" => {
            let data = frame.payload.get("data");
            let kind = data
                .and_then(|d| d.get("type"))
                .and_then(Value::as_str)
                .map(ChangeKind::from_wire)
                .unwrap_or(ChangeKind::Unknown);
            let table = data
                .and_then(|d| d.get("table"))
                .and_then(Value::as_str)
                .unwrap_or(table);
            Inbound::Change(ChangeEvent::new(kind, table))
        }
        "phx_close" => Inbound::Closed("channel closed".to_string()),
        "phx_error" => Inbound::Closed(reply_reason(&frame.payload)),
        _ => Inbound::Ignore,
    }
}

fn reply_reason(payload: &Value) -> String {
    payload
        .get("response")
        .and_then(|r| r.get("reason"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| payload.to_string())
}
