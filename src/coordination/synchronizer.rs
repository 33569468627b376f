//! Drives one swap step from "recommended" to "confirmed"
//!
//! A step is an action the swap node recommends (`fund`, `redeem`, ...). The
//! synchronizer waits for it to be offered, executes it once, and then waits
//! until the swap's event log shows the ledger effect of that step.

use super::poll::{poll_until, PollSchedule};
use crate::error::OrchestratorResult;
use crate::swap::{ActionKind, Swap};

use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Stages of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    WaitingForAction,
    ActionFound,
    Executing,
    WaitingForEvent,
    Confirmed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::WaitingForAction => "waiting-for-action",
            SyncState::ActionFound => "action-found",
            SyncState::Executing => "executing",
            SyncState::WaitingForEvent => "waiting-for-event",
            SyncState::Confirmed => "confirmed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub action: PollSchedule,
    pub event: PollSchedule,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            action: PollSchedule::bounded(Duration::from_millis(1000), Duration::from_secs(20)),
            event: PollSchedule::bounded(Duration::from_millis(500), Duration::from_secs(30)),
        }
    }
}

pub struct Synchronizer {
    config: SyncConfig,
}

impl Synchronizer {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    fn transition(&self, swap: &Swap, action: ActionKind, state: SyncState) {
        debug!("[{}] {} on {}: {}", swap.role(), action, swap.href(), state);
    }

    /// Wait for `action` to be recommended, execute it and wait for the
    /// event confirming it.
    pub async fn wait_for_action_and_confirm(
        &self,
        swap: &Swap,
        action: ActionKind,
    ) -> OrchestratorResult<()> {
        self.transition(swap, action, SyncState::WaitingForAction);

        let expected = action.as_str();
        let found = poll_until(
            &format!("action '{}'", expected),
            self.config.action,
            move || async move {
                let next = swap.next_action().await?;
                Ok(next.filter(|a| a.name == expected))
            },
        )
        .await?;
        self.transition(swap, action, SyncState::ActionFound);

        self.transition(swap, action, SyncState::Executing);
        match swap.execute(&found).await? {
            Some(id) => info!("[{}] {} executed on {}: {}", swap.role(), action, swap.href(), id),
            None => info!("[{}] {} executed on {}", swap.role(), action, swap.href()),
        }

        self.wait_for_event(swap, action).await
    }

    /// Wait until the event confirming `action` shows up in the swap's log
    pub async fn wait_for_event(&self, swap: &Swap, action: ActionKind) -> OrchestratorResult<()> {
        // The node's view of the role decides which leg this step touches
        let properties = swap.fetch().await?.properties;
        let event = match properties.expected_event(action) {
            Some(event) => event,
            None => {
                self.transition(swap, action, SyncState::Confirmed);
                return Ok(());
            }
        };

        self.transition(swap, action, SyncState::WaitingForEvent);
        poll_until(
            &format!("event '{}'", event),
            self.config.event,
            move || async move {
                let properties = swap.fetch().await?.properties;
                Ok(properties.has_event(&event).then_some(()))
            },
        )
        .await?;

        self.transition(swap, action, SyncState::Confirmed);
        info!("[{}] {} confirmed by {}", swap.role(), action, event);
        Ok(())
    }
}
