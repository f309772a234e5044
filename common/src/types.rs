use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectivityState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectivityState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
        }
    }
}

/// Display brightness as commanded over the broker. The router stores the
/// routed digit 0-9 verbatim; hardware adapters clamp to their own range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brightness {
    Off,
    Level(u8),
}

