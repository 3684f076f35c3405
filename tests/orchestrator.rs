//! Commit orchestrator tests against the in-memory repository.
//!
//! These cover the all-or-nothing behaviour of a run: what is written,
//! in which order, and that the branch only moves on full success.

use chrono::{DateTime, Utc};

use treesmith::batch::{FnUpdater, ItemUpdater, Substitution, UpdateError};
use treesmith::core::types::{Author, BranchName};
use treesmith::engine::{CommitOrchestrator, CommitOutcome, CommitRequest};
use treesmith::gitdata::mock::{FailOn, MockOperation, MockRepository};
use treesmith::gitdata::{GitData, GitDataError, ObjectKind, TreeItem};

fn main_branch() -> BranchName {
    BranchName::new("main").unwrap()
}

fn author() -> Author {
    Author::new("Release Bot", "bot@example.com", DateTime::<Utc>::default())
}

fn request(message: &str) -> CommitRequest {
    CommitRequest::new(main_branch(), author(), message)
}

fn uppercase(path: &'static str) -> impl ItemUpdater {
    FnUpdater::new(
        move |item: &TreeItem| item.path == path,
        |_: &TreeItem, content: &str| Ok::<_, UpdateError>(content.to_uppercase()),
    )
}

fn seeded() -> MockRepository {
    let repo = MockRepository::new();
    repo.seed_branch(
        &main_branch(),
        &[("a.txt", b"hello".as_slice()), ("b.txt", b"world".as_slice())],
    );
    repo.clear_operations();
    repo
}

// =============================================================================
// Success
// =============================================================================

mod success {
    use super::*;

    #[tokio::test]
    async fn uppercases_one_file_and_moves_branch() {
        let repo = seeded();
        let c1 = repo.head(&main_branch()).unwrap();
        let t1 = repo.commit(&c1).unwrap().tree_sha;

        let outcome = CommitOrchestrator::new(&repo)
            .run(&request("Shout"), &uppercase("a.txt"))
            .await
            .unwrap();

        let CommitOutcome::Committed {
            commit,
            tree,
            parent,
            updated_paths,
        } = outcome
        else {
            panic!("expected a commit");
        };
        assert_eq!(parent, c1);
        assert_eq!(updated_paths, vec!["a.txt".to_string()]);
        assert_eq!(repo.head(&main_branch()), Some(commit.clone()));

        let created = repo.commit(&commit).unwrap();
        assert_eq!(created.parent_shas, vec![c1.clone()]);
        assert_eq!(created.tree_sha, tree);
        assert_eq!(created.author, author());
        assert_eq!(created.committer, author());
        assert_eq!(created.message, "Shout");

        assert_eq!(repo.file(&main_branch(), "a.txt").unwrap(), b"HELLO");
        assert_eq!(repo.file(&main_branch(), "b.txt").unwrap(), b"world");

        // the tree was written as a delta against the original tree
        let new_blob = repo.create_blob(b"HELLO").await.unwrap();
        let tree_write = repo
            .writes()
            .into_iter()
            .find(|op| matches!(op, MockOperation::CreateTree { .. }))
            .unwrap();
        assert_eq!(
            tree_write,
            MockOperation::CreateTree {
                base: t1,
                items: vec![TreeItem::new("a.txt", "100644", ObjectKind::Blob, new_blob)],
            }
        );
    }

    #[tokio::test]
    async fn k_selected_files_give_k_replacements() {
        let repo = MockRepository::new();
        let files: Vec<(String, Vec<u8>)> = (0..12)
            .map(|i| (format!("dir{}/file{i}.txt", i % 3), format!("line {i}").into_bytes()))
            .collect();
        let borrowed: Vec<(&str, &[u8])> = files
            .iter()
            .map(|(p, c)| (p.as_str(), c.as_slice()))
            .collect();
        repo.seed_branch(&main_branch(), &borrowed);

        let updater = Substitution::new("dir1/*.txt", "line", "LINE").unwrap();
        let outcome = CommitOrchestrator::new(&repo)
            .with_concurrency(3)
            .run(&request("Shout dir1"), &updater)
            .await
            .unwrap();

        let CommitOutcome::Committed { updated_paths, .. } = outcome else {
            panic!("expected a commit");
        };
        assert_eq!(
            updated_paths,
            vec![
                "dir1/file1.txt",
                "dir1/file10.txt",
                "dir1/file4.txt",
                "dir1/file7.txt"
            ]
        );
        assert_eq!(
            repo.file(&main_branch(), "dir1/file4.txt").unwrap(),
            b"LINE 4"
        );
        assert_eq!(
            repo.file(&main_branch(), "dir0/file3.txt").unwrap(),
            b"line 3"
        );
    }

    #[tokio::test]
    async fn nested_paths_keep_sibling_directories() {
        let repo = MockRepository::new();
        repo.seed_branch(
            &main_branch(),
            &[
                ("docs/guide.md", b"see http://a".as_slice()),
                ("docs/api/index.md", b"see http://b".as_slice()),
                ("src/lib.rs", b"// http://c".as_slice()),
            ],
        );

        let updater = Substitution::new("docs/**/*.md", "http://", "https://").unwrap();
        CommitOrchestrator::new(&repo)
            .run(&request("Use https"), &updater)
            .await
            .unwrap();

        assert_eq!(
            repo.file(&main_branch(), "docs/api/index.md").unwrap(),
            b"see https://b"
        );
        assert_eq!(
            repo.file(&main_branch(), "src/lib.rs").unwrap(),
            b"// http://c"
        );
    }
}

// =============================================================================
// Nothing to commit
// =============================================================================

mod unchanged {
    use super::*;

    #[tokio::test]
    async fn empty_selection_writes_nothing() {
        let repo = seeded();
        let head = repo.head(&main_branch()).unwrap();

        let outcome = CommitOrchestrator::new(&repo)
            .run(&request("Nothing"), &uppercase("missing.txt"))
            .await
            .unwrap();

        assert_eq!(outcome, CommitOutcome::Unchanged { head: head.clone() });
        assert!(repo.writes().is_empty());
        assert_eq!(repo.head(&main_branch()), Some(head));
    }

}

// =============================================================================
// Identical content
// =============================================================================

mod identical {
    use super::*;

    #[tokio::test]
    async fn substitution_without_matches_commits_the_same_tree() {
        let repo = seeded();
        let c1 = repo.head(&main_branch()).unwrap();
        let t1 = repo.commit(&c1).unwrap().tree_sha;

        let updater = Substitution::new("*.txt", "absent", "x").unwrap();
        let outcome = CommitOrchestrator::new(&repo)
            .run(&request("Touch"), &updater)
            .await
            .unwrap();

        let CommitOutcome::Committed {
            commit,
            tree,
            parent,
            updated_paths,
        } = outcome
        else {
            panic!("expected a commit");
        };
        assert_eq!(parent, c1);
        assert_eq!(tree, t1);
        assert_eq!(updated_paths, vec!["a.txt", "b.txt"]);
        assert_eq!(repo.head(&main_branch()), Some(commit));
        assert_eq!(repo.file(&main_branch(), "a.txt").unwrap(), b"hello");
        assert_eq!(repo.file(&main_branch(), "b.txt").unwrap(), b"world");
    }

    #[tokio::test]
    async fn identity_transform_rewrites_every_selected_blob() {
        let repo = seeded();
        let updater = FnUpdater::new(
            |item: &TreeItem| item.is_blob(),
            |_: &TreeItem, content: &str| Ok::<_, UpdateError>(content.to_string()),
        );

        CommitOrchestrator::new(&repo)
            .run(&request("Identity"), &updater)
            .await
            .unwrap();

        let blobs = repo
            .writes()
            .iter()
            .filter(|op| matches!(op, MockOperation::CreateBlob { .. }))
            .count();
        assert_eq!(blobs, 2);
    }
}

// =============================================================================
// Failures
// =============================================================================

mod failures {
    use super::*;

    #[tokio::test]
    async fn missing_branch_fails_before_any_request_beyond_lookup() {
        let repo = seeded();
        let request = CommitRequest::new(BranchName::new("ghost").unwrap(), author(), "x");

        let err = CommitOrchestrator::new(&repo)
            .run(&request, &uppercase("a.txt"))
            .await
            .unwrap_err();

        assert_eq!(err, GitDataError::InvalidBranch("ghost".into()));
        assert_eq!(
            repo.operations(),
            vec![MockOperation::ResolveBranch {
                branch: BranchName::new("ghost").unwrap()
            }]
        );
    }

    #[tokio::test]
    async fn transform_failure_writes_nothing() {
        let repo = seeded();
        let head = repo.head(&main_branch()).unwrap();
        let updater = FnUpdater::new(
            |_: &TreeItem| true,
            |item: &TreeItem, content: &str| {
                if item.path == "b.txt" {
                    Err(UpdateError::new("unexpected token"))
                } else {
                    Ok(content.to_uppercase())
                }
            },
        );

        let err = CommitOrchestrator::new(&repo)
            .run(&request("Shout"), &updater)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GitDataError::Transform {
                path: "b.txt".into(),
                message: "unexpected token".into()
            }
        );
        assert!(repo.writes().is_empty());
        assert_eq!(repo.head(&main_branch()), Some(head));
    }

    #[tokio::test]
    async fn each_write_failure_leaves_branch_untouched() {
        let failures = [
            FailOn::CreateBlob(GitDataError::UnexpectedStatus {
                status: 500,
                body: "boom".into(),
            }),
            FailOn::CreateTree(GitDataError::Network("reset".into())),
            FailOn::CreateCommit(GitDataError::UnexpectedStatus {
                status: 422,
                body: "bad".into(),
            }),
            FailOn::UpdateRef(GitDataError::Network("timeout".into())),
        ];

        for fail_on in failures {
            let repo = seeded().fail_on(fail_on.clone());
            let head = repo.head(&main_branch()).unwrap();

            let result = CommitOrchestrator::new(&repo)
                .run(&request("Shout"), &uppercase("a.txt"))
                .await;

            assert!(result.is_err(), "{fail_on:?}");
            assert_eq!(repo.head(&main_branch()), Some(head), "{fail_on:?}");
            assert_eq!(repo.file(&main_branch(), "a.txt").unwrap(), b"hello");
        }
    }

    #[tokio::test]
    async fn read_failures_are_surfaced_unchanged() {
        let error = GitDataError::UnexpectedStatus {
            status: 502,
            body: "bad gateway".into(),
        };
        for fail_on in [
            FailOn::ResolveBranch(error.clone()),
            FailOn::GetCommit(error.clone()),
            FailOn::GetTree(error.clone()),
            FailOn::GetBlob(error.clone()),
        ] {
            let repo = seeded().fail_on(fail_on);
            let err = CommitOrchestrator::new(&repo)
                .run(&request("Shout"), &uppercase("a.txt"))
                .await
                .unwrap_err();
            assert_eq!(err, error);
            assert!(repo.writes().is_empty());
        }
    }

    #[tokio::test]
    async fn concurrent_writer_causes_conflict_and_orphans_the_new_commit() {
        let repo = seeded();
        let orchestrator = CommitOrchestrator::new(&repo);
        let request = request("Shout");
        let updater = uppercase("a.txt");

        // run up to the commit point, then let another writer move the branch
        let mut state = treesmith::engine::CommitState::Start;
        while !matches!(state, treesmith::engine::CommitState::CommitCreated { .. }) {
            state = orchestrator.advance(state, &request, &updater).await.unwrap();
        }
        let moved = repo
            .move_branch(&main_branch(), &[("c.txt", b"!".as_slice())], "Concurrent")
            .unwrap();

        let err = orchestrator
            .advance(state, &request, &updater)
            .await
            .unwrap_err();

        assert_eq!(err, GitDataError::RefUpdateConflict("main".into()));
        assert_eq!(repo.head(&main_branch()), Some(moved));
        assert_eq!(repo.file(&main_branch(), "a.txt").unwrap(), b"hello");
        assert_eq!(repo.file(&main_branch(), "c.txt").unwrap(), b"!");
    }

    #[tokio::test]
    async fn conflict_is_not_retried() {
        let repo = seeded().fail_on(FailOn::UpdateRef(GitDataError::RefUpdateConflict(
            "main".into(),
        )));

        let err = CommitOrchestrator::new(&repo)
            .run(&request("Shout"), &uppercase("a.txt"))
            .await
            .unwrap_err();

        assert_eq!(err, GitDataError::RefUpdateConflict("main".into()));
        let ref_updates = repo
            .operations()
            .into_iter()
            .filter(|op| matches!(op, MockOperation::UpdateRef { .. }))
            .count();
        assert_eq!(ref_updates, 1);
    }
}
