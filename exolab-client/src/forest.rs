use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    api::{self, CommentId, CommentOrder},
    CommentNode, CommentPatch, Error, OrderExt, Participant,
};

/// The comments of one exercise, as an arena of nodes indexed by id.
///
/// Every operation returns a new `Forest` and leaves `self` untouched. Both the arena
/// and the list of top-level ids live behind `Arc`s, so a new version only copies the
/// nodes it actually changed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Forest {
    nodes: Arc<HashMap<CommentId, Arc<CommentNode>>>,
    roots: Arc<Vec<CommentId>>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ViewEntry {
    /// 0 for top-level comments
    pub depth: usize,
    pub node: Arc<CommentNode>,
}

impl Forest {
    pub fn new() -> Forest {
        Forest::default()
    }

    /// Builds a forest out of the nested form the server sends.
    ///
    /// The server lists every comment of the exercise at top level, replies included,
    /// on top of nesting them under their parent. Top-level entries that also show up
    /// nested somewhere are dropped.
    pub fn from_api(comments: Vec<api::Comment>) -> Result<Forest, Error> {
        let mut nested = HashSet::new();
        let mut todo = comments.iter().flat_map(|c| c.replies.iter()).collect::<Vec<_>>();
        while let Some(c) = todo.pop() {
            nested.insert(c.id.clone());
            todo.extend(c.replies.iter());
        }

        let mut res = Forest::new();
        let mut stack = comments
            .into_iter()
            .rev()
            .filter(|c| !nested.contains(&c.id))
            .map(|c| (None, c))
            .collect::<Vec<(Option<CommentId>, api::Comment)>>();
        while let Some((parent, mut c)) = stack.pop() {
            let replies = std::mem::take(&mut c.replies);
            let id = c.id.clone();
            res.attach(CommentNode::from_api(&c), parent.as_ref())?;
            stack.extend(replies.into_iter().rev().map(|r| (Some(id.clone()), r)));
        }
        Ok(res)
    }

    /// Rebuilds the nested form, top level in the current order
    pub fn to_api(&self) -> Vec<api::Comment> {
        self.roots.iter().filter_map(|id| self.to_api_rec(id)).collect()
    }

    fn to_api_rec(&self, id: &CommentId) -> Option<api::Comment> {
        let n = self.nodes.get(id)?;
        Some(api::Comment {
            id: n.id.clone(),
            content: n.content.clone(),
            author: n.author.clone(),
            created_at: n.created_at,
            vote_count: n.vote_count,
            user_vote: n.user_vote,
            parent: n.parent_id.clone(),
            replies: n
                .children
                .iter()
                .filter_map(|c| self.to_api_rec(c))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &CommentId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &CommentId) -> Option<&CommentNode> {
        self.nodes.get(id).map(|n| &**n)
    }

    pub fn roots(&self) -> &[CommentId] {
        &self.roots
    }

    /// Number of comments strictly below `id`
    pub fn descendants(&self, id: &CommentId) -> Result<usize, Error> {
        if !self.contains(id) {
            return Err(Error::NotFound(id.clone()));
        }
        Ok(self.subtree(id).len() - 1)
    }

    /// Adds `node` without any check on its contents. `node.children` is reset, its
    /// replies are attached separately.
    fn attach(&mut self, mut node: CommentNode, parent: Option<&CommentId>) -> Result<(), Error> {
        if self.nodes.contains_key(&node.id) {
            return Err(Error::AlreadyExists(node.id));
        }
        let nodes = Arc::make_mut(&mut self.nodes);
        match parent {
            None => Arc::make_mut(&mut self.roots).push(node.id.clone()),
            Some(p) => {
                let parent = nodes.get_mut(p).ok_or_else(|| Error::NotFound(p.clone()))?;
                Arc::make_mut(parent).children.push(node.id.clone());
            }
        }
        node.parent_id = parent.cloned();
        node.children = Vec::new();
        nodes.insert(node.id.clone(), Arc::new(node));
        Ok(())
    }

    /// Appends `node` to the top level, or to the replies of `parent`
    pub fn insert(&self, node: CommentNode, parent: Option<&CommentId>) -> Result<Forest, Error> {
        api::validate_content(&node.content)?;
        if !node.children.is_empty() {
            return Err(Error::Validation(format!(
                "comment {} cannot be inserted with replies attached",
                node.id
            )));
        }
        let mut res = self.clone();
        res.attach(node, parent)?;
        Ok(res)
    }

    pub fn update(&self, id: &CommentId, patch: &CommentPatch) -> Result<Forest, Error> {
        if let Some(content) = &patch.content {
            api::validate_content(content)?;
        }
        if !self.contains(id) {
            return Err(Error::NotFound(id.clone()));
        }
        let mut res = self.clone();
        let node = Arc::make_mut(&mut res.nodes)
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        patch.apply(Arc::make_mut(node));
        Ok(res)
    }

    /// Removes `id` along with all its replies
    pub fn remove(&self, id: &CommentId) -> Result<Forest, Error> {
        let node = self.nodes.get(id).ok_or_else(|| Error::NotFound(id.clone()))?;
        let mut res = self.clone();
        let nodes = Arc::make_mut(&mut res.nodes);
        match &node.parent_id {
            None => Arc::make_mut(&mut res.roots).retain(|r| r != id),
            Some(p) => {
                if let Some(parent) = nodes.get_mut(p) {
                    Arc::make_mut(parent).children.retain(|c| c != id);
                }
            }
        }
        for gone in self.subtree(id) {
            nodes.remove(&gone);
        }
        Ok(res)
    }

    /// Puts `node` in place of `old`: same position, same parent, same replies. Used
    /// to swap a provisional comment for the one the server created.
    pub fn replace(&self, old: &CommentId, mut node: CommentNode) -> Result<Forest, Error> {
        let prev = self.nodes.get(old).ok_or_else(|| Error::NotFound(old.clone()))?;
        if node.id != *old && self.contains(&node.id) {
            return Err(Error::AlreadyExists(node.id));
        }
        node.parent_id = prev.parent_id.clone();
        node.children = prev.children.clone();
        let mut res = self.clone();
        let nodes = Arc::make_mut(&mut res.nodes);
        nodes.remove(old);
        if node.id != *old {
            let rename = |ids: &mut Vec<CommentId>| {
                for i in ids.iter_mut().filter(|i| *i == old) {
                    *i = node.id.clone();
                }
            };
            match &node.parent_id {
                None => rename(Arc::make_mut(&mut res.roots)),
                Some(p) => {
                    if let Some(parent) = nodes.get_mut(p) {
                        rename(&mut Arc::make_mut(parent).children);
                    }
                }
            }
            for c in node.children.iter() {
                if let Some(child) = nodes.get_mut(c) {
                    Arc::make_mut(child).parent_id = Some(node.id.clone());
                }
            }
        }
        nodes.insert(node.id.clone(), Arc::new(node));
        Ok(res)
    }

    /// Reorders the top level only, replies keep their insertion order
    pub fn sort(&self, order: CommentOrder) -> Forest {
        let mut roots = self
            .roots
            .iter()
            .filter_map(|id| self.nodes.get(id).cloned())
            .collect::<Vec<_>>();
        order.sort(&mut roots);
        Forest {
            nodes: self.nodes.clone(),
            roots: Arc::new(roots.into_iter().map(|n| n.id.clone()).collect()),
        }
    }

    /// Depth-first walk, parents before their replies, top level in current order
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            forest: self,
            stack: self.roots.iter().rev().map(|id| (0, id)).collect(),
        }
    }

    /// What a presentation layer displays: the whole tree, flattened, with the top
    /// level sorted according to `order`
    pub fn view(&self, order: CommentOrder) -> Vec<ViewEntry> {
        self.sort(order)
            .walk()
            .map(|(depth, node)| ViewEntry {
                depth,
                node: node.clone(),
            })
            .collect()
    }

    /// Every author, once, in order of first appearance in a walk
    pub fn participants(&self) -> Vec<Participant> {
        let mut seen = HashSet::new();
        self.walk()
            .filter(|&(_, n)| seen.insert(&n.author.id))
            .map(|(_, n)| Participant {
                id: n.author.id.clone(),
                name: n.author.username.clone(),
            })
            .collect()
    }

    /// `id` and everything below it, parents first
    fn subtree(&self, id: &CommentId) -> Vec<CommentId> {
        let mut res = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(n) = self.nodes.get(id) {
                res.push(id.clone());
                stack.extend(n.children.iter().rev());
            }
        }
        res
    }
}

pub struct Walk<'a> {
    forest: &'a Forest,
    stack: Vec<(usize, &'a CommentId)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Arc<CommentNode>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let forest = self.forest;
            let (depth, id) = self.stack.pop()?;
            if let Some(node) = forest.nodes.get(id) {
                self.stack
                    .extend(node.children.iter().rev().map(|c| (depth + 1, c)));
                return Some((depth, node));
            }
        }
    }
}
