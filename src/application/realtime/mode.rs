//! Connection modes and the status reported to listeners.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Where the client is in its delivery lifecycle.
///
/// ```text
/// Disconnected ─► Connecting ─► Connected
///       │             │  ▲          │
///       │             ▼  │          ▼
///       │         Reconnecting ◄────┘
///       │             │
///       └──────────► Polling
///
/// any state ─► Stopped ─► Connecting | Polling
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Polling,
    Stopped,
}

impl ConnectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionMode::Disconnected => "disconnected",
            ConnectionMode::Connecting => "connecting",
            ConnectionMode::Connected => "connected",
            ConnectionMode::Reconnecting => "reconnecting",
            ConnectionMode::Polling => "polling",
            ConnectionMode::Stopped => "stopped",
        }
    }

    /// Whether the push stream is the active or intended transport.
    pub fn is_streaming(&self) -> bool {
        matches!(
            self,
            ConnectionMode::Connecting | ConnectionMode::Connected | ConnectionMode::Reconnecting
        )
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for ConnectionMode {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionMode::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Disconnected, Polling)
                | (Connecting, Connected)
                | (Connecting, Reconnecting)
                | (Connecting, Polling)
                | (Connected, Reconnecting)
                | (Connected, Polling)
                | (Reconnecting, Connecting)
                | (Reconnecting, Polling)
                | (Stopped, Connecting)
                | (Stopped, Polling)
                | (Disconnected, Stopped)
                | (Connecting, Stopped)
                | (Connected, Stopped)
                | (Reconnecting, Stopped)
                | (Polling, Stopped)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionMode::*;
        match self {
            Disconnected => vec![Connecting, Polling, Stopped],
            Connecting => vec![Connected, Reconnecting, Polling, Stopped],
            Connected => vec![Reconnecting, Polling, Stopped],
            Reconnecting => vec![Connecting, Polling, Stopped],
            Polling => vec![Stopped],
            Stopped => vec![Connecting, Polling],
        }
    }
}

/// Indicator state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Reconnecting,
    Error,
    Stopped,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Error => "error",
            ConnectionStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
