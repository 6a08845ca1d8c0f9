use std::fmt;

/// Lifecycle of the link to the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Linking,
    Online,
    LinkLost,
}

impl SessionState {
    /// A new attempt may only start when no link exists and none is being set up.
    pub fn can_link(self) -> bool {
        matches!(self, SessionState::Disconnected | SessionState::LinkLost)
    }
}

/// The status line shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Linking,
    Online,
    Offline,
    LinkLost,
    CommandFailed,
}

impl LinkStatus {
    pub fn text(self) -> &'static str {
        match self {
            LinkStatus::Linking => "LINKING...",
            LinkStatus::Online => "SYSTEM ONLINE",
            LinkStatus::Offline => "OFFLINE",
            LinkStatus::LinkLost => "LINK LOST - RECONNECTING...",
            LinkStatus::CommandFailed => "COMMAND FAILED",
        }
    }
}

impl Default for LinkStatus {
    fn default() -> Self {
        LinkStatus::Offline
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}
