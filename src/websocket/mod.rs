//! WebSocket Push
//!
//! Pushes dashboard changes to open browser tabs so they can refresh
//! without polling.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Manages all active connections and subscriptions
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! ## Topics
//!
//! - `reports` - report set re-fetched or a report resolved
//! - `clock` - the "last updated" clock moved
//! - `system` - fetch and update errors
//! - `*` - everything
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8080/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['reports', 'clock']}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'reports_changed') location.reload();
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, HubConfig, HubError, WILDCARD_TOPIC};
pub use messages::{
    ClientMessage, ServerMessage, WsEvent, TOPIC_CLOCK, TOPIC_REPORTS, TOPIC_SYSTEM,
};
