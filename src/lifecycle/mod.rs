//! Lifecycle management for Seeker components

use crate::error::CoreError;

/// Trait for components that follow a lifecycle pattern
pub trait LifecycleNode: Send + Sync {
    /// Get the node name
    fn name(&self) -> &str;

    /// Get the current state
    fn state(&self) -> State;

    /// Configure the node
    fn on_configure(&mut self) -> Result<(), CoreError>;

    /// Activate the node
    fn on_activate(&mut self) -> Result<(), CoreError>;

    /// Deactivate the node
    fn on_deactivate(&mut self) -> Result<(), CoreError>;

    /// Clean up the node
    fn on_cleanup(&mut self) -> Result<(), CoreError>;

    /// Finalize the node; it cannot be configured again
    fn on_shutdown(&mut self) -> Result<(), CoreError>;

    fn is_active(&self) -> bool {
        self.state() == State::Active
    }
}

/// Base implementation for lifecycle nodes
#[derive(Debug)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

impl LifecycleNodeBase {
    /// Create a new lifecycle node base
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    /// Get the current state
    pub fn get_state(&self) -> State {
        self.state
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn transition(&mut self, next: State) -> Result<(), CoreError> {
        let allowed = matches!(
            (self.state, next),
            (State::Unconfigured, State::Inactive)
                | (State::Inactive, State::Active)
                | (State::Active, State::Inactive)
                | (State::Inactive, State::Unconfigured)
                | (State::Unconfigured, State::Finalized)
                | (State::Inactive, State::Finalized)
        );
        if !allowed {
            return Err(CoreError::Lifecycle {
                node: self.name.clone(),
                reason: format!("cannot go from {:?} to {:?}", self.state, next),
            });
        }
        log::debug!("{}: {:?} -> {:?}", self.name, self.state, next);
        self.state = next;
        Ok(())
    }
}
