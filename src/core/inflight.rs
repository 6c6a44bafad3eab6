//! In-flight guards - one outstanding call per action type
//!
//! Each action has its own `OpState` token. Starting an action that is already
//! `InFlight` fails instead of queuing; the returned guard flips the token to
//! `Settled` when dropped, including when the caller's future is dropped.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::{PanelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action { Withdraw, ExecuteExit, TimelockExit, BroadcastExit, DownloadExit }

impl Action {
    pub fn all() -> [Action; 5] {
        [Action::Withdraw, Action::ExecuteExit, Action::TimelockExit, Action::BroadcastExit, Action::DownloadExit]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Withdraw => "withdraw",
            Action::ExecuteExit => "execute_exit",
            Action::TimelockExit => "timelock_exit",
            Action::BroadcastExit => "broadcast_exit",
            Action::DownloadExit => "download_exit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpState { #[default] Idle, InFlight, Settled }

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    states: Arc<Mutex<HashMap<Action, OpState>>>,
}

impl InFlight {
    pub fn new() -> Self { Self::default() }

    pub fn state(&self, action: Action) -> OpState {
        let states = self.states.lock().unwrap_or_else(|p| p.into_inner());
        states.get(&action).copied().unwrap_or_default()
    }

    pub fn snapshot(&self) -> Vec<(Action, OpState)> {
        Action::all().into_iter().map(|a| (a, self.state(a))).collect()
    }

    /// Mark `action` in flight, or fail with `Busy` if it already is.
    pub fn begin(&self, action: Action) -> Result<InFlightGuard> {
        let mut states = self.states.lock().unwrap_or_else(|p| p.into_inner());
        let state = states.entry(action).or_default();
        if *state == OpState::InFlight {
            return Err(PanelError::Busy(action));
        }
        *state = OpState::InFlight;
        Ok(InFlightGuard { states: self.states.clone(), action })
    }
}

#[must_use = "the action settles as soon as the guard is dropped"]
pub struct InFlightGuard {
    states: Arc<Mutex<HashMap<Action, OpState>>>,
    action: Action,
}

impl InFlightGuard {
    pub fn action(&self) -> Action { self.action }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut states = self.states.lock().unwrap_or_else(|p| p.into_inner());
        states.insert(self.action, OpState::Settled);
    }
}
