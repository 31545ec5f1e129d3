//! Client-side push-channel connection state machine.
//!
//! Transport is not handled here: the caller reports socket events and the
//! clock, and performs the returned [`Action`]. At most one connection
//! attempt is outstanding at any time.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::LiveConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// Open the transport now.
    Connect,
    /// Close the transport.
    Close,
    /// A reconnect is scheduled after the delay.
    ScheduleReconnect(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
    /// Connection counts as dead when silent for this long.
    pub stale_after: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            multiplier: 2,
            max_delay: Duration::from_secs(30),
            stale_after: Duration::from_millis(3000),
        }
    }
}

impl ReconnectPolicy {
    /// Staleness after three missed heartbeats.
    pub fn from_live(cfg: &LiveConfig) -> Self {
        Self {
            stale_after: Duration::from_millis(cfg.heartbeat_interval_ms.saturating_mul(3)),
            ..Self::default()
        }
    }

    /// `initial * multiplier^attempt`, capped at `max_delay`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let mut delay = self.initial_delay;
        for _ in 0..attempt {
            delay = delay.saturating_mul(self.multiplier);
            if delay >= self.max_delay {
                return self.max_delay;
            }
        }
        delay.min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionManager {
    policy: ReconnectPolicy,
    state: ConnectionState,
    attempts: u32,
    intentional_close: bool,
    retry_at: Option<Instant>,
    last_seen: Option<Instant>,
}

impl ConnectionManager {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Disconnected,
            attempts: 0,
            intentional_close: false,
            retry_at: None,
            last_seen: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn retry_at(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Explicit connect request; clears a previous intentional close.
    pub fn connect(&mut self) -> Action {
        self.intentional_close = false;
        match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => Action::None,
            ConnectionState::Disconnected => {
                self.retry_at = None;
                self.state = ConnectionState::Connecting;
                Action::Connect
            }
        }
    }

    pub fn on_open(&mut self, now: Instant) -> Action {
        if self.intentional_close {
            return Action::Close;
        }
        self.state = ConnectionState::Connected;
        self.attempts = 0;
        self.last_seen = Some(now);
        Action::None
    }

    /// Any message, heartbeats included, proves the connection alive.
    pub fn on_message(&mut self, now: Instant) {
        if self.state == ConnectionState::Connected {
            self.last_seen = Some(now);
        }
    }

    /// Transport closed or failed to open.
    pub fn on_close(&mut self, now: Instant) -> Action {
        self.state = ConnectionState::Disconnected;
        self.last_seen = None;
        if self.intentional_close || self.retry_at.is_some() {
            return Action::None;
        }
        self.schedule(now)
    }

    /// Drives timers: fires due reconnects and detects stale connections.
    pub fn tick(&mut self, now: Instant) -> Action {
        match self.state {
            ConnectionState::Disconnected => match self.retry_at {
                Some(at) if !self.intentional_close && now >= at => {
                    self.retry_at = None;
                    self.state = ConnectionState::Connecting;
                    Action::Connect
                }
                _ => Action::None,
            },
            ConnectionState::Connected => match self.last_seen {
                Some(seen) if now.saturating_duration_since(seen) > self.policy.stale_after => {
                    debug!("connection stale");
                    self.state = ConnectionState::Disconnected;
                    self.last_seen = None;
                    self.schedule(now);
                    Action::Close
                }
                _ => Action::None,
            },
            ConnectionState::Connecting => Action::None,
        }
    }

    /// User-initiated close; suppresses every reconnect.
    pub fn close(&mut self) -> Action {
        self.intentional_close = true;
        self.retry_at = None;
        let was = self.state;
        self.state = ConnectionState::Disconnected;
        match was {
            ConnectionState::Disconnected => Action::None,
            _ => Action::Close,
        }
    }

    fn schedule(&mut self, now: Instant) -> Action {
        let delay = self.policy.delay(self.attempts);
        self.attempts = self.attempts.saturating_add(1);
        self.retry_at = Some(now + delay);
        debug!(attempt = self.attempts, delay_ms = delay.as_millis() as u64, "reconnect scheduled");
        Action::ScheduleReconnect(delay)
    }
}
