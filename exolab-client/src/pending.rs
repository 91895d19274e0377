use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{api::CommentId, CommentPatch, Error};

/// Lifecycle of one write action: `Idle -> Submitting -> {Committed | RolledBack}`
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ActionState {
    Idle,
    Submitting,
    Committed,
    RolledBack,
}

/// What a write action is about. At most one action per key can be submitting at a
/// time.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ActionKey {
    /// A new top-level comment
    NewThread,

    /// A new reply to this comment
    Reply(CommentId),

    /// An edit, deletion or vote on this comment
    Comment(CommentId),
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKey::NewThread => write!(f, "new comment"),
            ActionKey::Reply(id) => write!(f, "reply to comment {id}"),
            ActionKey::Comment(id) => write!(f, "change to comment {id}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ActionKind {
    Add,
    Edit,
    Delete,
    Vote,
}

/// Handed out when an action starts submitting, and given back with the server's
/// answer
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Ticket {
    id: u64,
    epoch: u64,
}

impl Ticket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

// Epochs are unique across the process, so that a ticket never matches a section
// other than the one that issued it
static NEXT_EPOCH: AtomicU64 = AtomicU64::new(0);

pub(crate) fn new_epoch() -> u64 {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

/// How to revert the optimistic part of an action on its target
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Undo {
    /// Drop the provisional comment
    Remove,

    /// Put these fields back
    Restore(CommentPatch),

    /// Nothing was changed locally
    Nothing,
}

#[derive(Debug)]
pub(crate) struct Pending {
    pub key: ActionKey,
    pub kind: ActionKind,

    /// Comment the action is about; the provisional one for an add
    pub target: CommentId,
    pub undo: Undo,
}

#[derive(Debug, Default)]
pub(crate) struct PendingActions {
    next_id: u64,
    submitting: HashMap<u64, Pending>,
    finished: HashMap<ActionKey, ActionState>,
}

impl PendingActions {
    pub fn state(&self, key: &ActionKey) -> ActionState {
        if self.submitting.values().any(|p| p.key == *key) {
            return ActionState::Submitting;
        }
        self.finished.get(key).copied().unwrap_or(ActionState::Idle)
    }

    pub fn ensure_idle(&self, key: &ActionKey) -> Result<(), Error> {
        match self.state(key) {
            ActionState::Submitting => Err(Error::Busy(key.clone())),
            _ => Ok(()),
        }
    }

    pub fn begin(&mut self, epoch: u64, pending: Pending) -> Result<Ticket, Error> {
        self.ensure_idle(&pending.key)?;
        let id = self.next_id;
        self.next_id += 1;
        self.finished.remove(&pending.key);
        self.submitting.insert(id, pending);
        Ok(Ticket { id, epoch })
    }

    /// Takes the action `ticket` refers to out of the submitting set
    pub fn take(&mut self, ticket: Ticket, kind: ActionKind) -> Result<Pending, Error> {
        match self.submitting.get(&ticket.id) {
            Some(p) if p.kind == kind => (),
            _ => return Err(Error::UnknownTicket),
        }
        self.submitting
            .remove(&ticket.id)
            .ok_or(Error::UnknownTicket)
    }

    pub fn finish(&mut self, key: ActionKey, state: ActionState) {
        self.finished.insert(key, state);
    }

    pub fn is_empty(&self) -> bool {
        self.submitting.is_empty()
    }

    pub fn clear(&mut self) {
        self.submitting.clear();
        self.finished.clear();
    }
}
