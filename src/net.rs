//! Wire messages for remote play.
//!
//! A remote client sends its whole turn as one [`TurnSubmission`], shaped like
//! the local `TURN_SUBMITTED` notification. The receiver replays it through
//! the same [`GameState::set_order`] entry point a local player uses, then
//! submits, so remote and local turns are validated identically.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OrderError;
use crate::game::{GameState, Notification, OrderEntry, SubmitOutcome, TeamId};

/// One team's complete turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSubmission {
    /// Submitting team.
    pub team: TeamId,
    /// Order slot of every piece the team wants to set.
    pub orders: Vec<OrderEntry>,
}

/// Error raised while decoding or applying a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// The message was not valid JSON of the expected shape.
    Json(String),
    /// The simulation refused one of the orders.
    Order {
        /// Offending slot.
        entry: OrderEntry,
        /// Why it was refused.
        error: OrderError,
    },
    /// The simulation refused the submission itself.
    Submit(OrderError),
}

impl std::fmt::Display for NetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(e) => write!(f, "malformed message: {e}"),
            Self::Order { entry, error } => write!(f, "order for {} refused: {error}", entry.coord()),
            Self::Submit(error) => write!(f, "submission refused: {error}"),
        }
    }
}

impl std::error::Error for NetError {}

impl TurnSubmission {
    /// Capture `team`'s current orders.
    #[must_use]
    pub fn from_state(state: &GameState, team: TeamId) -> Self {
        Self {
            team,
            orders: state.team_orders(team),
        }
    }

    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, NetError> {
        serde_json::to_string(self).map_err(|e| NetError::Json(e.to_string()))
    }

    /// Decode from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid submission.
    pub fn from_json(json: &str) -> Result<Self, NetError> {
        serde_json::from_str(json).map_err(|e| NetError::Json(e.to_string()))
    }
}

/// Encode a notification for broadcast.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_notification(notification: &Notification) -> Result<String, NetError> {
    serde_json::to_string(notification).map_err(|e| NetError::Json(e.to_string()))
}

/// Replay a remote submission into `state` and submit the team's turn.
///
/// Slots with an order are set, slots without one are cleared. The first
/// refused order aborts the replay; slots before it stay applied and the team
/// stays unsubmitted, so the client can send a corrected turn.
///
/// # Errors
///
/// Returns the first refused order, or why the submission was refused.
pub fn apply_submission(state: &mut GameState, submission: &TurnSubmission) -> Result<SubmitOutcome, NetError> {
    let team = submission.team;
    for entry in &submission.orders {
        let result = match entry.order {
            Some(order) => state.set_order(team, entry.coord(), order),
            None => state.clear_order(team, entry.coord()),
        };
        result.map_err(|error| NetError::Order { entry: *entry, error })?;
    }
    debug!(%team, orders = submission.orders.len(), "remote turn applied");
    state.submit_turn(team).map_err(NetError::Submit)
}
