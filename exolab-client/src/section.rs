use crate::{
    api::{self, Author, CommentId, CommentOrder, ExerciseId, Vote},
    is_provisional, load_order,
    pending::{new_epoch, Pending, PendingActions, Undo},
    save_order, ActionKey, ActionKind, ActionState, CommentApi, CommentNode, CommentPatch, Error,
    Forest, KvStore, Participant, Ticket, ViewEntry,
};

/// The comments of one exercise, as seen by one user.
///
/// Writes come in two phases. `begin_*` applies the optimistic change and hands out a
/// `Ticket`; `complete_*` takes the ticket back along with the server's answer, then
/// either commits or reverts the change. The `add_comment`, `edit_comment`... helpers
/// do both around a `CommentApi` call.
#[derive(Debug)]
pub struct CommentSection<S> {
    exercise: ExerciseId,
    viewer: Author,
    forest: Forest,
    order: CommentOrder,
    store: S,
    pending: PendingActions,
    epoch: u64,
}

impl<S: KvStore> CommentSection<S> {
    /// Empty section, with the order last saved in `store`
    pub fn new(exercise: ExerciseId, viewer: Author, store: S) -> CommentSection<S> {
        let order = load_order(&store);
        CommentSection {
            exercise,
            viewer,
            forest: Forest::new(),
            order,
            store,
            pending: PendingActions::default(),
            epoch: new_epoch(),
        }
    }

    pub fn exercise(&self) -> &ExerciseId {
        &self.exercise
    }

    pub fn viewer(&self) -> &Author {
        &self.viewer
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn order(&self) -> CommentOrder {
        self.order
    }

    /// Changes the order and saves it for the next sections. The new order is used
    /// even if it could not be saved.
    pub fn set_order(&mut self, order: CommentOrder) -> Result<(), Error> {
        self.order = order;
        save_order(&mut self.store, order)
    }

    pub fn view(&self) -> Vec<ViewEntry> {
        self.forest.view(self.order)
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.forest.participants()
    }

    pub fn state(&self, key: &ActionKey) -> ActionState {
        self.pending.state(key)
    }

    /// Whether no action is waiting for the server
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Swaps in a freshly fetched forest. Answers to actions begun before are ignored.
    pub fn reload(&mut self, forest: Forest) {
        self.invalidate();
        self.forest = forest;
    }

    /// Drops the forest when it is no longer displayed. Answers to actions begun
    /// before are ignored.
    pub fn unmount(&mut self) {
        self.invalidate();
        self.forest = Forest::new();
    }

    fn invalidate(&mut self) {
        if !self.pending.is_empty() {
            tracing::info!(exercise = %self.exercise, "abandoning in-flight comment actions");
        }
        self.pending.clear();
        self.epoch = new_epoch();
    }

    /// Comment `id`, that the server already knows about
    fn acknowledged(&self, id: &CommentId) -> Result<&CommentNode, Error> {
        let node = self
            .forest
            .get(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        if node.is_provisional() {
            return Err(Error::Busy(ActionKey::Comment(id.clone())));
        }
        Ok(node)
    }

    pub fn begin_add(&mut self, text: &str, parent: Option<&CommentId>) -> Result<Ticket, Error> {
        let key = match parent {
            None => ActionKey::NewThread,
            Some(p) => ActionKey::Reply(p.clone()),
        };
        self.pending.ensure_idle(&key)?;
        if let Some(p) = parent {
            if is_provisional(p) {
                return Err(Error::Busy(ActionKey::Comment(p.clone())));
            }
        }
        let node = CommentNode::provisional(self.viewer.clone(), String::from(text));
        let target = node.id.clone();
        let forest = self.forest.insert(node, parent)?;
        let ticket = self.pending.begin(
            self.epoch,
            Pending {
                key,
                kind: ActionKind::Add,
                target,
                undo: Undo::Remove,
            },
        )?;
        self.forest = forest;
        Ok(ticket)
    }

    /// Swaps the provisional comment for the server's one, or drops it
    pub fn complete_add(
        &mut self,
        ticket: Ticket,
        res: Result<api::Comment, Error>,
    ) -> Result<ActionState, Error> {
        self.complete(ticket, ActionKind::Add, res, |forest, p, c| {
            forest.replace(&p.target, CommentNode::from_api(&c))
        })
    }

    pub fn begin_edit(&mut self, id: &CommentId, text: &str) -> Result<Ticket, Error> {
        let key = ActionKey::Comment(id.clone());
        self.pending.ensure_idle(&key)?;
        let undo = CommentPatch::content(self.acknowledged(id)?.content.clone());
        let forest = self.forest.update(id, &CommentPatch::content(text))?;
        let ticket = self.pending.begin(
            self.epoch,
            Pending {
                key,
                kind: ActionKind::Edit,
                target: id.clone(),
                undo: Undo::Restore(undo),
            },
        )?;
        self.forest = forest;
        Ok(ticket)
    }

    pub fn complete_edit(
        &mut self,
        ticket: Ticket,
        res: Result<api::Comment, Error>,
    ) -> Result<ActionState, Error> {
        self.complete(ticket, ActionKind::Edit, res, |forest, p, c| {
            forest.update(&p.target, &CommentPatch::from_api(&c))
        })
    }

    /// Sets the viewer's vote on `id` to `vote`, patching the count by the difference
    /// until the server answers with the real one
    pub fn begin_vote(&mut self, id: &CommentId, vote: Vote) -> Result<Ticket, Error> {
        let key = ActionKey::Comment(id.clone());
        self.pending.ensure_idle(&key)?;
        let node = self.acknowledged(id)?;
        let undo = CommentPatch::vote(node.vote_count, node.user_vote);
        let patch = CommentPatch::vote(
            node.vote_count + Vote::delta(node.user_vote, vote),
            vote,
        );
        let forest = self.forest.update(id, &patch)?;
        let ticket = self.pending.begin(
            self.epoch,
            Pending {
                key,
                kind: ActionKind::Vote,
                target: id.clone(),
                undo: Undo::Restore(undo),
            },
        )?;
        self.forest = forest;
        Ok(ticket)
    }

    /// The vote `id` ends up with if the viewer presses `pressed`
    pub fn toggled_vote(&self, id: &CommentId, pressed: Vote) -> Result<Vote, Error> {
        let node = self
            .forest
            .get(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        Ok(node.user_vote.toggle(pressed))
    }

    pub fn complete_vote(
        &mut self,
        ticket: Ticket,
        res: Result<api::Comment, Error>,
    ) -> Result<ActionState, Error> {
        self.complete(ticket, ActionKind::Vote, res, |forest, p, c| {
            forest.update(&p.target, &CommentPatch::from_api(&c))
        })
    }

    /// Deletion is not optimistic: the comment stays until the server confirms
    pub fn begin_delete(&mut self, id: &CommentId) -> Result<Ticket, Error> {
        let key = ActionKey::Comment(id.clone());
        self.pending.ensure_idle(&key)?;
        self.acknowledged(id)?;
        self.pending.begin(
            self.epoch,
            Pending {
                key,
                kind: ActionKind::Delete,
                target: id.clone(),
                undo: Undo::Nothing,
            },
        )
    }

    pub fn complete_delete(
        &mut self,
        ticket: Ticket,
        res: Result<(), Error>,
    ) -> Result<ActionState, Error> {
        self.complete(ticket, ActionKind::Delete, res, |forest, p, ()| {
            match forest.remove(&p.target) {
                // already gone with a deleted ancestor
                Err(Error::NotFound(_)) => Ok(forest.clone()),
                res => res,
            }
        })
    }

    fn complete<T>(
        &mut self,
        ticket: Ticket,
        kind: ActionKind,
        res: Result<T, Error>,
        commit: impl FnOnce(&Forest, &Pending, T) -> Result<Forest, Error>,
    ) -> Result<ActionState, Error> {
        if ticket.epoch() != self.epoch {
            tracing::info!(?ticket, ?kind, "discarding answer for a previous load of the comments");
            return Ok(ActionState::Idle);
        }
        let pending = self.pending.take(ticket, kind)?;
        match res.and_then(|v| commit(&self.forest, &pending, v)) {
            Ok(forest) => {
                tracing::debug!(key = %pending.key, ?kind, "comment action committed");
                self.forest = forest;
                self.pending.finish(pending.key, ActionState::Committed);
                Ok(ActionState::Committed)
            }
            Err(err) => {
                tracing::warn!(key = %pending.key, ?kind, %err, "rolling back comment action");
                self.rollback(&pending.target, pending.undo);
                self.pending.finish(pending.key, ActionState::RolledBack);
                Err(err)
            }
        }
    }

    fn rollback(&mut self, target: &CommentId, undo: Undo) {
        let res = match undo {
            Undo::Nothing => return,
            Undo::Remove => self.forest.remove(target),
            Undo::Restore(patch) => self.forest.update(target, &patch),
        };
        match res {
            Ok(forest) => self.forest = forest,
            Err(err) => tracing::warn!(comment = %target, %err, "nothing to roll back"),
        }
    }

    /// Replaces the forest with the server's current one
    pub async fn refresh<A: CommentApi + ?Sized>(&mut self, api: &A) -> Result<(), Error> {
        let comments = api.fetch_comments(&self.exercise).await?;
        let forest = Forest::from_api(comments)?;
        tracing::debug!(exercise = %self.exercise, comments = forest.len(), "comments loaded");
        self.reload(forest);
        Ok(())
    }

    pub async fn add_comment<A: CommentApi + ?Sized>(
        &mut self,
        api: &A,
        text: &str,
        parent: Option<&CommentId>,
    ) -> Result<ActionState, Error> {
        let ticket = self.begin_add(text, parent)?;
        let res = api.add_comment(&self.exercise, text, parent).await;
        self.complete_add(ticket, res)
    }

    pub async fn edit_comment<A: CommentApi + ?Sized>(
        &mut self,
        api: &A,
        id: &CommentId,
        text: &str,
    ) -> Result<ActionState, Error> {
        let ticket = self.begin_edit(id, text)?;
        let res = api.edit_comment(id, text).await;
        self.complete_edit(ticket, res)
    }

    pub async fn delete_comment<A: CommentApi + ?Sized>(
        &mut self,
        api: &A,
        id: &CommentId,
    ) -> Result<ActionState, Error> {
        let ticket = self.begin_delete(id)?;
        let res = api.delete_comment(id).await;
        self.complete_delete(ticket, res)
    }

    pub async fn vote<A: CommentApi + ?Sized>(
        &mut self,
        api: &A,
        id: &CommentId,
        vote: Vote,
    ) -> Result<ActionState, Error> {
        let ticket = self.begin_vote(id, vote)?;
        let res = api.vote_comment(id, vote).await;
        self.complete_vote(ticket, res)
    }

    /// What a vote button does: pressing the vote already held clears it
    pub async fn toggle_vote<A: CommentApi + ?Sized>(
        &mut self,
        api: &A,
        id: &CommentId,
        pressed: Vote,
    ) -> Result<ActionState, Error> {
        let vote = self.toggled_vote(id, pressed)?;
        self.vote(api, id, vote).await
    }
}
