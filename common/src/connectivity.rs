use crate::{telemetry::MacAddr, types::ConnectivityState};

/// Transport-facing side of the network seam. A hardware build backs this
/// with the wireless driver; the host build reports the OS link.
pub trait NetworkLink {
    fn is_up(&mut self) -> bool;
    fn begin_connect(&mut self);
    /// Hardware address backing the published device identifier.
    fn mac(&self) -> MacAddr;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCommand {
    BeginConnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Connect,
    Subscribe,
}

/// Link lifecycle as a non-blocking state machine. One `step` per control
/// tick replaces the original firmware's connect-and-poll-forever loop; the
/// caller owns pacing and diagnostics. Recovery is unbounded: there is no
/// attempt limit and no error path out of this type.
#[derive(Debug)]
pub struct LinkSupervisor {
    state: ConnectivityState,
    poll_delay_ms: u64,
    last_poll_ms: Option<u64>,
}

impl LinkSupervisor {
    pub fn new(poll_delay_ms: u64) -> Self {
        Self {
            state: ConnectivityState::Disconnected,
            poll_delay_ms,
            last_poll_ms: None,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Reports whether this step crossed a poll boundary while connecting,
    /// which is when the caller should emit link progress diagnostics.
    pub fn poll_due(&self, now_ms: u64) -> bool {
        self.state == ConnectivityState::Connecting
            && self
                .last_poll_ms
                .map(|last| now_ms.saturating_sub(last) >= self.poll_delay_ms)
                .unwrap_or(true)
    }

    pub fn step(&mut self, link_up: bool, now_ms: u64) -> Vec<LinkCommand> {
        if link_up {
            self.state = ConnectivityState::Connected;
            self.last_poll_ms = None;
            return Vec::new();
        }

        match self.state {
            ConnectivityState::Connected | ConnectivityState::Disconnected => {
                // Initiate exactly one attempt, then poll status until the
                // link comes back.
                self.state = ConnectivityState::Connecting;
                self.last_poll_ms = Some(now_ms);
                vec![LinkCommand::BeginConnect]
            }
            ConnectivityState::Connecting => {
                if self.poll_due(now_ms) {
                    self.last_poll_ms = Some(now_ms);
                }
                Vec::new()
            }
        }
    }
}

/// Broker session lifecycle. Connect attempts are re-issued at a fixed delay
/// without bound; the subscribe set is re-issued once per (re)connection.
/// Invariant: while the network link is not connected the session is forced
/// to `Disconnected` and no broker operation is emitted.
#[derive(Debug)]
pub struct SessionSupervisor {
    state: ConnectivityState,
    retry_delay_ms: u64,
    last_attempt_ms: Option<u64>,
}

impl SessionSupervisor {
    pub fn new(retry_delay_ms: u64) -> Self {
        Self {
            state: ConnectivityState::Disconnected,
            retry_delay_ms,
            last_attempt_ms: None,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectivityState::Connected
    }

    pub fn step(
        &mut self,
        network: ConnectivityState,
        session_up: bool,
        now_ms: u64,
    ) -> Vec<SessionCommand> {
        if network != ConnectivityState::Connected {
            self.state = ConnectivityState::Disconnected;
            self.last_attempt_ms = None;
            return Vec::new();
        }

        if session_up {
            let was_connected = self.state == ConnectivityState::Connected;
            self.state = ConnectivityState::Connected;
            self.last_attempt_ms = None;
            if was_connected {
                Vec::new()
            } else {
                vec![SessionCommand::Subscribe]
            }
        } else {
            if self.state == ConnectivityState::Connected {
                self.state = ConnectivityState::Disconnected;
            }

            let retry_due = self
                .last_attempt_ms
                .map(|last| now_ms.saturating_sub(last) >= self.retry_delay_ms)
                .unwrap_or(true);
            if !retry_due {
                return Vec::new();
            }

            self.state = ConnectivityState::Connecting;
            self.last_attempt_ms = Some(now_ms);
            vec![SessionCommand::Connect]
        }
    }
}
