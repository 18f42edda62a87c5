use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a property's reservation window, as broadcast to clients.
///
/// `active_visitors` mirrors the presence registry's count for the
/// property; the command layer refreshes it on every presence change so it
/// is current before the next broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAvailability {
    pub property_id: String,
    pub property_name: String,
    pub is_available: bool,
    pub expiry_time: Option<DateTime<Utc>>,
    pub active_visitors: u32,
    pub total_slots: u32,
    pub available_slots: u32,
}

/// Lifecycle phase of a stored window. A property with no stored window is
/// open (the implicit default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    /// Countdown running, a pending expiry timer exists.
    Countdown,
    /// Terminal until a new countdown is explicitly started.
    Closed,
}

/// Stored window state: the broadcastable snapshot plus the machine's
/// internal bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct WindowRecord {
    pub snapshot: PropertyAvailability,
    pub phase: WindowPhase,
    /// Bumped on every countdown start; a timer only applies if the
    /// record still carries its generation (stale-timer guard).
    pub generation: u64,
}
