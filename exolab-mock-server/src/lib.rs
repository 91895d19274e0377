use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use exolab_client::{
    api::{self, Author, Comment, CommentId, ExerciseId, Time, UserId, Vote},
    classify, CommentApi, Error,
};
use parking_lot::Mutex;

mod fuzz;

/// In-memory stand-in for the comment endpoints. Clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct MockServer(Arc<Mutex<State>>);

#[derive(Debug, Default)]
struct State {
    exercises: HashMap<ExerciseId, Vec<CommentId>>,
    comments: HashMap<CommentId, DbComment>,
    next_id: u64,
    failure: Option<Error>,
}

#[derive(Debug)]
struct DbComment {
    exercise: ExerciseId,
    author: Author,
    content: String,
    created_at: Time,
    parent: Option<CommentId>,
    replies: Vec<CommentId>,
    votes: HashMap<UserId, Vote>,
}

impl State {
    fn check_failure(&mut self) -> Result<(), Error> {
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn comment(&self, id: &CommentId) -> Result<&DbComment, api::Error> {
        self.comments
            .get(id)
            .ok_or_else(|| api::Error::CommentNotFound(id.clone()))
    }

    fn own_comment(&mut self, id: &CommentId, user: &UserId) -> Result<&mut DbComment, api::Error> {
        let c = self
            .comments
            .get_mut(id)
            .ok_or_else(|| api::Error::CommentNotFound(id.clone()))?;
        if c.author.id != *user {
            return Err(api::Error::PermissionDenied);
        }
        Ok(c)
    }

    fn add(
        &mut self,
        exercise: &ExerciseId,
        author: Author,
        content: &str,
        parent: Option<&CommentId>,
        created_at: Time,
    ) -> Result<CommentId, api::Error> {
        api::validate_content(content)?;
        if !self.exercises.contains_key(exercise) {
            return Err(api::Error::ExerciseNotFound(exercise.clone()));
        }
        if let Some(p) = parent {
            if self.comment(p)?.exercise != *exercise {
                return Err(api::Error::ForeignParent(p.clone()));
            }
        }
        self.next_id += 1;
        let id = CommentId(self.next_id.to_string());
        let siblings = match parent {
            None => self.exercises.get_mut(exercise),
            Some(p) => self.comments.get_mut(p).map(|c| &mut c.replies),
        };
        siblings
            .ok_or_else(|| api::Error::Unknown(format!("lost track of the parent of {id}")))?
            .push(id.clone());
        self.comments.insert(
            id.clone(),
            DbComment {
                exercise: exercise.clone(),
                author,
                content: String::from(content),
                created_at,
                parent: parent.cloned(),
                replies: Vec::new(),
                votes: HashMap::new(),
            },
        );
        Ok(id)
    }

    /// The comment as `viewer` would receive it
    fn render(&self, id: &CommentId, viewer: &UserId) -> Result<Comment, api::Error> {
        let c = self.comment(id)?;
        Ok(Comment {
            id: id.clone(),
            content: c.content.clone(),
            author: c.author.clone(),
            created_at: c.created_at,
            vote_count: c.votes.values().map(|v| v.value()).sum(),
            user_vote: c.votes.get(viewer).copied().unwrap_or_default(),
            parent: c.parent.clone(),
            replies: c
                .replies
                .iter()
                .map(|r| self.render(r, viewer))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Every comment of the exercise in creation order, each with its replies nested
    fn render_all(
        &self,
        exercise: &ExerciseId,
        viewer: &UserId,
    ) -> Result<Vec<Comment>, api::Error> {
        if !self.exercises.contains_key(exercise) {
            return Err(api::Error::ExerciseNotFound(exercise.clone()));
        }
        let mut ids = self
            .comments
            .iter()
            .filter(|(_, c)| c.exercise == *exercise)
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        ids.sort_by_key(|id| id.0.parse::<u64>().ok());
        ids.into_iter().map(|id| self.render(id, viewer)).collect()
    }

    fn remove(&mut self, id: &CommentId) {
        let Some(c) = self.comments.remove(id) else {
            return;
        };
        let siblings = match &c.parent {
            None => self.exercises.get_mut(&c.exercise),
            Some(p) => self.comments.get_mut(p).map(|p| &mut p.replies),
        };
        if let Some(siblings) = siblings {
            siblings.retain(|s| s != id);
        }
        let mut stack = c.replies;
        while let Some(r) = stack.pop() {
            if let Some(gone) = self.comments.remove(&r) {
                stack.extend(gone.replies);
            }
        }
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer::default()
    }

    pub fn admin_create_exercise(&self, id: ExerciseId) {
        self.0.lock().exercises.entry(id).or_default();
    }

    /// Adds a comment with a chosen creation date, bypassing sessions
    pub fn admin_add_comment(
        &self,
        exercise: &ExerciseId,
        author: Author,
        content: &str,
        parent: Option<&CommentId>,
        created_at: Time,
    ) -> Result<CommentId, api::Error> {
        self.0
            .lock()
            .add(exercise, author, content, parent, created_at)
    }

    /// Connection as `user`
    pub fn session(&self, user: Author) -> MockSession {
        MockSession {
            server: self.clone(),
            user,
        }
    }

    /// Makes the next call, whichever it is, fail with `err` without touching the data
    pub fn fail_next(&self, err: Error) {
        self.0.lock().failure = Some(err);
    }

    /// Return the current number of comments, all exercises together
    pub fn test_num_comments(&self) -> usize {
        self.0.lock().comments.len()
    }
}

/// Sends `err` the way a server would and reads it back as a client
fn over_wire(err: api::Error) -> Error {
    classify(err.status_code(), &err.contents())
}

/// One user's view of a `MockServer`
#[derive(Clone, Debug)]
pub struct MockSession {
    server: MockServer,
    user: Author,
}

impl MockSession {
    pub fn user(&self) -> &Author {
        &self.user
    }
}

#[async_trait(?Send)]
impl CommentApi for MockSession {
    async fn fetch_comments(&self, exercise: &ExerciseId) -> Result<Vec<Comment>, Error> {
        let mut state = self.server.0.lock();
        state.check_failure()?;
        state
            .render_all(exercise, &self.user.id)
            .map_err(over_wire)
    }

    async fn add_comment(
        &self,
        exercise: &ExerciseId,
        text: &str,
        parent: Option<&CommentId>,
    ) -> Result<Comment, Error> {
        let mut state = self.server.0.lock();
        state.check_failure()?;
        let id = state
            .add(exercise, self.user.clone(), text, parent, Utc::now())
            .map_err(over_wire)?;
        state.render(&id, &self.user.id).map_err(over_wire)
    }

    async fn edit_comment(&self, id: &CommentId, text: &str) -> Result<Comment, Error> {
        let mut state = self.server.0.lock();
        state.check_failure()?;
        api::validate_content(text).map_err(over_wire)?;
        state
            .own_comment(id, &self.user.id)
            .map_err(over_wire)?
            .content = String::from(text);
        state.render(id, &self.user.id).map_err(over_wire)
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<(), Error> {
        let mut state = self.server.0.lock();
        state.check_failure()?;
        state.own_comment(id, &self.user.id).map_err(over_wire)?;
        state.remove(id);
        Ok(())
    }

    async fn vote_comment(&self, id: &CommentId, vote: Vote) -> Result<Comment, Error> {
        let mut state = self.server.0.lock();
        state.check_failure()?;
        let c = state
            .comments
            .get_mut(id)
            .ok_or_else(|| over_wire(api::Error::CommentNotFound(id.clone())))?;
        let held = c.votes.get(&self.user.id).copied().unwrap_or_default();
        match held.toggle(vote) {
            Vote::None => c.votes.remove(&self.user.id),
            v => c.votes.insert(self.user.id.clone(), v),
        };
        state.render(id, &self.user.id).map_err(over_wire)
    }
}
