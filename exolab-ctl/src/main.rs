use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use exolab_client::{
    api::{Author, CommentId, CommentOrder, ExerciseId, Vote},
    mention, CommentSection, HttpApi, ViewEntry,
};

mod store;
use store::FileStore;

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long, env = "EXOLAB_HOST")]
    host: String,

    /// Exercise whose comments to work on
    #[structopt(short, long, parse(from_str))]
    exercise: ExerciseId,

    /// Name shown on comments until the server confirms them
    #[structopt(short, long, env = "EXOLAB_USER", default_value = "me")]
    user: String,

    /// Where to keep local preferences
    #[structopt(long, default_value = ".exolab-state.json", parse(from_os_str))]
    state: PathBuf,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Print the comment tree
    Show {
        /// mostUpvoted, recent or oldest; defaults to the saved preference
        #[structopt(long)]
        order: Option<CommentOrder>,
    },

    /// Post a comment
    Comment {
        text: String,

        /// Comment to reply to
        #[structopt(long, parse(from_str))]
        parent: Option<CommentId>,
    },

    /// Replace the text of a comment
    Edit {
        #[structopt(parse(from_str))]
        id: CommentId,
        text: String,
    },

    /// Delete a comment and all its replies
    Delete {
        #[structopt(parse(from_str))]
        id: CommentId,
    },

    /// Vote on a comment
    Vote {
        #[structopt(parse(from_str))]
        id: CommentId,

        /// up, down or none; voting again for the vote already held clears it
        vote: Vote,
    },

    /// List the people taking part in the discussion
    Participants {
        /// Only those whose name contains this
        filter: Option<String>,
    },

    /// Save the default order for `show`
    SetOrder { order: CommentOrder },
}

fn token() -> Option<String> {
    std::env::var("EXOLAB_TOKEN").ok()
}

fn print_entry(e: &ViewEntry) {
    let n = &e.node;
    let mine = match n.user_vote {
        Vote::None => "",
        Vote::Up => " [voted up]",
        Vote::Down => " [voted down]",
    };
    println!(
        "{:indent$}[{}] {} ({:+}, {}){}: {}",
        "",
        n.id,
        n.author.username,
        n.vote_count,
        n.age(Utc::now()),
        mine,
        n.content,
        indent = 2 * e.depth,
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt::init();
    }

    let opt = <Opt as structopt::StructOpt>::from_args();

    let store = FileStore::open(&opt.state)?;
    let viewer = Author::new(opt.user.clone(), opt.user);
    let mut section = CommentSection::new(opt.exercise, viewer, store);

    let api = HttpApi::new(opt.host, token());
    if !matches!(opt.cmd, Command::SetOrder { .. }) {
        section
            .refresh(&api)
            .await
            .context("fetching comments")?;
    }

    match opt.cmd {
        Command::Show { order } => {
            let order = order.unwrap_or_else(|| section.order());
            for e in section.forest().view(order) {
                print_entry(&e);
            }
        }
        Command::Comment { text, parent } => {
            section
                .add_comment(&api, &text, parent.as_ref())
                .await
                .context("posting comment")?;
        }
        Command::Edit { id, text } => {
            section
                .edit_comment(&api, &id, &text)
                .await
                .with_context(|| format!("editing comment {id}"))?;
        }
        Command::Delete { id } => {
            let replies = section.forest().descendants(&id)?;
            section
                .delete_comment(&api, &id)
                .await
                .with_context(|| format!("deleting comment {id}"))?;
            println!("Deleted comment {id} and {replies} replies");
        }
        Command::Vote { id, vote } => {
            section
                .vote(&api, &id, vote)
                .await
                .with_context(|| format!("voting on comment {id}"))?;
            if let Some(n) = section.forest().get(&id) {
                println!("Comment {id} now has {:+} votes", n.vote_count);
            }
        }
        Command::Participants { filter } => {
            let people = section.participants();
            for p in mention::filter_participants(&people, filter.as_deref().unwrap_or("")) {
                println!("{}", p.name);
            }
        }
        Command::SetOrder { order } => {
            section.set_order(order).context("saving order preference")?;
        }
    }

    Ok(())
}
