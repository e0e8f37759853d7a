//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! browsers viewing the dashboard and the Leakwatch server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::Statistics;

/// Topic for report-set changes
pub const TOPIC_REPORTS: &str = "reports";
/// Topic for the "last updated" clock
pub const TOPIC_CLOCK: &str = "clock";
/// Topic for errors and lifecycle notices
pub const TOPIC_SYSTEM: &str = "system";

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics for real-time updates
    Subscribe {
        /// List of topics to subscribe to (e.g., "reports", "clock")
        topics: Vec<String>,
    },
    /// Unsubscribe from topics
    Unsubscribe {
        /// List of topics to unsubscribe from
        topics: Vec<String>,
    },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The report set was re-fetched or a report was resolved
    ReportsChanged {
        /// Number of reports held by the server
        count: usize,
        /// Statistics over the full set
        statistics: Statistics,
        last_updated: Option<DateTime<Utc>>,
    },
    /// Periodic clock refresh
    Clock { last_updated: DateTime<Utc> },
    /// Subscription confirmed
    Subscribed {
        /// Topics successfully subscribed to
        topics: Vec<String>,
    },
    /// Unsubscription confirmed
    Unsubscribed {
        /// Topics successfully unsubscribed from
        topics: Vec<String>,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
    /// Connection established
    Connected {
        /// Unique connection identifier
        connection_id: String,
    },
}

/// Internal event for broadcasting through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    /// Topic this event belongs to (e.g., "reports")
    pub topic: String,
    /// The message to send to subscribers
    pub message: ServerMessage,
}

impl WsEvent {
    /// The report set changed
    pub fn reports_changed(
        count: usize,
        statistics: Statistics,
        last_updated: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            topic: TOPIC_REPORTS.to_string(),
            message: ServerMessage::ReportsChanged {
                count,
                statistics,
                last_updated,
            },
        }
    }

    /// The dashboard clock moved
    pub fn clock(last_updated: DateTime<Utc>) -> Self {
        Self {
            topic: TOPIC_CLOCK.to_string(),
            message: ServerMessage::Clock { last_updated },
        }
    }

    /// A fetch or update failed
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            topic: TOPIC_SYSTEM.to_string(),
            message: ServerMessage::Error {
                message: message.into(),
            },
        }
    }
}
