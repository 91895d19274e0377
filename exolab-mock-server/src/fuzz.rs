#![cfg(test)]

use std::{cmp, ops::RangeTo, panic::AssertUnwindSafe};

use bolero_generator::TypeGenerator;

use exolab_client::{
    api::{Author, CommentId, ExerciseId, Vote},
    CommentApi, CommentSection, Error, Forest, MemoryStore,
};

use crate::{MockServer, MockSession};

const TEXTS: [&str; 4] = ["hello", "@sara see above", "  ", "edited"];

#[derive(Clone, Debug, bolero_generator::TypeGenerator)]
enum FuzzOp {
    Add {
        parent: Option<usize>,
        text: usize,
        fail: bool,
    },
    Edit {
        target: usize,
        text: usize,
        fail: bool,
    },
    Delete {
        target: usize,
        fail: bool,
    },
    Vote {
        target: usize,
        up: bool,
        fail: bool,
    },
    Refresh,
}

fn resize_int(fuzz_id: usize, RangeTo { end }: RangeTo<usize>) -> Option<usize> {
    if end == 0 {
        return None;
    }
    let bucket_size = cmp::max(1, usize::MAX / end);
    let id = fuzz_id / bucket_size;
    Some(cmp::min(id, end - 1))
}

fn text(i: usize) -> &'static str {
    TEXTS[i % TEXTS.len()]
}

struct ComparativeFuzzer {
    exercise: ExerciseId,
    server: MockServer,
    api: MockSession,
    section: CommentSection<MemoryStore>,
}

impl ComparativeFuzzer {
    async fn new() -> ComparativeFuzzer {
        let exercise = ExerciseId::from("1");
        let server = MockServer::new();
        server.admin_create_exercise(exercise.clone());
        let user = Author::new("1", "sara");
        let api = server.session(user.clone());
        let mut section = CommentSection::new(exercise.clone(), user, MemoryStore::new());
        section.refresh(&api).await.expect("loading empty exercise");
        ComparativeFuzzer {
            exercise,
            server,
            api,
            section,
        }
    }

    /// Some comment of the local tree, if there is any
    fn pick(&self, fuzz_id: usize) -> Option<CommentId> {
        let ids = self
            .section
            .forest()
            .walk()
            .map(|(_, n)| n.id.clone())
            .collect::<Vec<_>>();
        resize_int(fuzz_id, ..ids.len()).map(|i| ids[i].clone())
    }

    fn arm_failure(&self, fail: bool) {
        if fail {
            self.server
                .fail_next(Error::Network(String::from("injected failure")));
        }
    }

    async fn execute_fuzz_op(&mut self, op: FuzzOp) {
        let op_str = format!("{op:?}");
        let res = match op {
            FuzzOp::Add {
                parent,
                text: t,
                fail,
            } => {
                let parent = match parent.map(|p| self.pick(p)) {
                    Some(None) => return,
                    Some(Some(p)) => Some(p),
                    None => None,
                };
                self.arm_failure(fail);
                self.section
                    .add_comment(&self.api, text(t), parent.as_ref())
                    .await
                    .map(|_| ())
            }
            FuzzOp::Edit {
                target,
                text: t,
                fail,
            } => {
                let Some(target) = self.pick(target) else {
                    return;
                };
                self.arm_failure(fail);
                self.section
                    .edit_comment(&self.api, &target, text(t))
                    .await
                    .map(|_| ())
            }
            FuzzOp::Delete { target, fail } => {
                let Some(target) = self.pick(target) else {
                    return;
                };
                self.arm_failure(fail);
                self.section
                    .delete_comment(&self.api, &target)
                    .await
                    .map(|_| ())
            }
            FuzzOp::Vote { target, up, fail } => {
                let Some(target) = self.pick(target) else {
                    return;
                };
                let pressed = if up { Vote::Up } else { Vote::Down };
                self.arm_failure(fail);
                self.section
                    .toggle_vote(&self.api, &target, pressed)
                    .await
                    .map(|_| ())
            }
            FuzzOp::Refresh => self.section.refresh(&self.api).await,
        };
        // a failure armed for a call that was refused locally must not leak into the
        // next operation
        self.server.0.lock().failure = None;

        assert!(
            matches!(res, Ok(()) | Err(Error::Network(_)) | Err(Error::Validation(_))),
            "unexpected result for {op_str}: {res:?}"
        );
        assert!(self.section.is_settled());
        let remote = self
            .api
            .fetch_comments(&self.exercise)
            .await
            .expect("fetching comments");
        let remote = Forest::from_api(remote).expect("rebuilding server forest");
        assert_eq!(
            self.section.forest(),
            &remote,
            "local and server trees diverged after {op_str}"
        );
    }
}

#[test]
fn section_matches_server() {
    let runtime = AssertUnwindSafe(
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed initializing tokio runtime"),
    );
    bolero::check!()
        .with_generator(bolero::generator::gen_with::<Vec<FuzzOp>>().len(1..50usize))
        .cloned()
        .for_each(move |ops| {
            runtime.block_on(async move {
                let mut fuzzer = ComparativeFuzzer::new().await;
                for op in ops {
                    fuzzer.execute_fuzz_op(op).await;
                }
            })
        })
}
