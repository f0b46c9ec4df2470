//! Control surface for external actors (mission control, UI, operator)

use crate::common::types::Point2D;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Requests applied at the start of the next tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    SetGoal(Point2D),
    Pause,
    Resume,
}

/// Cloneable sender side of the command channel
#[derive(Debug, Clone)]
pub struct CommandHandle {
    sender: UnboundedSender<ControlCommand>,
}

impl CommandHandle {
    /// Queue a command. Returns false once the core has been dropped.
    pub fn send(&self, command: ControlCommand) -> bool {
        self.sender.send(command).is_ok()
    }

    pub fn set_goal(&self, x: f64, y: f64) -> bool {
        self.send(ControlCommand::SetGoal(Point2D::new(x, y)))
    }

    pub fn pause(&self) -> bool {
        self.send(ControlCommand::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(ControlCommand::Resume)
    }
}

/// Receiver side, owned by the core
#[derive(Debug)]
pub struct CommandQueue {
    receiver: UnboundedReceiver<ControlCommand>,
    handle: CommandHandle,
}

impl CommandQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        CommandQueue {
            receiver,
            handle: CommandHandle { sender },
        }
    }

    pub fn handle(&self) -> CommandHandle {
        self.handle.clone()
    }

    /// Everything queued so far, in send order
    pub fn drain(&mut self) -> Vec<ControlCommand> {
        let mut commands = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(command) => commands.push(command),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        commands
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
