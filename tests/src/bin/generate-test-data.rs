use anyhow::Context;
use chrono::{Duration, Utc};
use exolab_api::{Author, Comment, CommentId, Exercise, ExerciseId, Vote};
use rand::{seq::SliceRandom, Rng};

const NUM_USERS: usize = 8;

const NUM_THREADS: usize = 20;
const MAX_REPLIES: usize = 4;
const MAX_DEPTH: usize = 4;
const COMMENT_WORD_COUNT: usize = 25;

const MAX_AGE_MINUTES: i64 = 60 * 24 * 30;

fn gen_users() -> Vec<Author> {
    (0..NUM_USERS)
        .map(|i| {
            let name = lipsum::lipsum_words(1)
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            Author::new((i + 1).to_string(), name)
        })
        .collect()
}

struct Generator<'a, R> {
    rng: R,
    users: &'a [Author],
    next_id: u64,
}

impl<'a, R: Rng> Generator<'a, R> {
    fn gen_comment(&mut self, parent: Option<(&CommentId, &Author)>, depth: usize) -> Comment {
        self.next_id += 1;
        let id = CommentId(self.next_id.to_string());
        let author = self
            .users
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| Author::new("0", "anonymous"));
        // replies mention the one they answer about half of the time
        let mut content = lipsum::lipsum_words(self.rng.gen_range(1..COMMENT_WORD_COUNT));
        if let Some((_, answered)) = parent {
            if self.rng.gen_bool(0.5) {
                content = format!("@{} {content}", answered.username);
            }
        }
        let num_replies = match depth < MAX_DEPTH {
            true => self.rng.gen_range(0..=MAX_REPLIES / (depth + 1)),
            false => 0,
        };
        let replies = (0..num_replies)
            .map(|_| self.gen_comment(Some((&id, &author)), depth + 1))
            .collect();
        Comment {
            id: id.clone(),
            content,
            author,
            created_at: Utc::now()
                - Duration::minutes(self.rng.gen_range(0..MAX_AGE_MINUTES)),
            vote_count: self.rng.gen_range(-3..20),
            user_vote: *[Vote::Up, Vote::Down, Vote::None]
                .choose(&mut self.rng)
                .unwrap_or(&Vote::None),
            parent: parent.map(|(p, _)| p.clone()),
            replies,
        }
    }
}

/// The list the server sends: every comment, replies also left nested under their parent
fn server_listing(roots: Vec<Comment>) -> Vec<Comment> {
    let mut res = Vec::new();
    let mut todo = roots;
    while let Some(c) = todo.pop() {
        todo.extend(c.replies.iter().cloned());
        res.push(c);
    }
    res.sort_by_key(|c| c.id.0.parse::<u64>().ok());
    res
}

fn main() -> anyhow::Result<()> {
    let users = gen_users();
    let mut generator = Generator {
        rng: rand::thread_rng(),
        users: &users,
        next_id: 0,
    };
    let comments = (0..NUM_THREADS)
        .map(|_| generator.gen_comment(None, 0))
        .collect::<Vec<_>>();
    let exercise = Exercise {
        id: ExerciseId::from("1"),
        title: lipsum::lipsum_title(),
        comments: server_listing(comments),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&exercise).context("serializing test data")?
    );
    Ok(())
}
