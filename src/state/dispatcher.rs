//! State dispatcher for pub-sub pattern

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::state::app_state::AppState;
use crate::state::events::{Action, Effect};
use crate::state::reducer::reduce;

/// Trait for components that subscribe to state changes
pub trait StateSubscriber {
    /// Called with the new snapshot after every dispatched action
    fn on_state_change(&mut self, action: &Action, state: &AppState);

    /// Get subscriber name for debugging
    fn name(&self) -> &str;
}

/// Owns the current snapshot, runs the reducer and notifies subscribers
pub struct StateDispatcher {
    state: AppState,

    subscribers: Vec<Box<dyn StateSubscriber>>,

    /// Action history for debugging
    history: VecDeque<Action>,

    max_history: usize,
}

impl StateDispatcher {
    pub fn new(initial: AppState) -> Self {
        Self {
            state: initial,
            subscribers: Vec::new(),
            history: VecDeque::new(),
            max_history: 100,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Add a subscriber
    pub fn subscribe(&mut self, subscriber: Box<dyn StateSubscriber>) {
        info!("StateDispatcher: Adding subscriber: {}", subscriber.name());
        self.subscribers.push(subscriber);
    }

    /// Reduce `action`, swap in the new snapshot, notify subscribers and
    /// hand back the effects for the caller to run
    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        let transition = reduce(&self.state, action.clone());
        self.state = transition.state;

        for subscriber in &mut self.subscribers {
            debug!(
                "StateDispatcher: Notifying subscriber: {}",
                subscriber.name()
            );
            subscriber.on_state_change(&action, &self.state);
        }

        self.history.push_back(action);
        if self.history.len() > self.max_history {
            self.history.pop_front();
        }

        transition.effects
    }

    /// Get action history for debugging
    pub fn history(&self) -> impl Iterator<Item = &Action> {
        self.history.iter()
    }
}
