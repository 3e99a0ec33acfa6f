//! Integration tests for tag listing, creation and deletion.

mod common;

use chrono::DateTime;

use common::{writer, TestRepo, REPO_UID};

use refkeep::git::{CancelToken, SortOrder};
use refkeep::service::{
    CommitTag, CreateCommitTagParams, DeleteTagParams, ErrorKind, Identity,
    ListCommitTagsParams, ReadParams,
};

fn list() -> ListCommitTagsParams {
    ListCommitTagsParams {
        read: ReadParams::new(REPO_UID),
        ..Default::default()
    }
}

fn names(tags: &[CommitTag]) -> Vec<&str> {
    tags.iter().map(|t| t.name.as_str()).collect()
}

async fn list_tags(repo: &TestRepo, params: &ListCommitTagsParams) -> Vec<CommitTag> {
    repo.service()
        .list_commit_tags(params, &CancelToken::new())
        .await
        .unwrap()
}

/// Lightweight `v1` on C1 and annotated `v2` ("release") on C2.
fn tagged() -> TestRepo {
    let repo = TestRepo::new();
    repo.git(&["tag", "v1"]);
    repo.commit_file("CHANGELOG.md", "2.0\n", "Second commit");
    repo.git(&["tag", "-a", "v2", "-m", "release"]);
    repo.push(&["main", "--tags"]);
    repo
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn lightweight_and_annotated() {
        let repo = tagged();
        let c1 = repo.work_rev("main~1");
        let c2 = repo.work_rev("main");

        let tags = list_tags(&repo, &list()).await;

        assert_eq!(names(&tags), ["v1", "v2"]);
        assert!(!tags[0].is_annotated);
        assert_eq!(tags[0].sha, c1);
        assert!(tags[0].tagger.is_none());

        assert!(tags[1].is_annotated);
        assert_eq!(tags[1].sha, c2);
        assert_eq!(tags[1].title, "release");
        assert_eq!(tags[1].message, "release");
        let tagger = tags[1].tagger.as_ref().unwrap();
        assert_eq!(tagger.identity, Identity::new("Test User", "test@example.com"));
    }

    #[tokio::test]
    async fn commits_are_attached() {
        let repo = tagged();
        let params = ListCommitTagsParams {
            include_commit: true,
            ..list()
        };

        let tags = list_tags(&repo, &params).await;

        let titles: Vec<_> = tags
            .iter()
            .map(|t| t.commit.as_ref().unwrap().title.as_str())
            .collect();
        assert_eq!(titles, ["Initial commit", "Second commit"]);
        assert_eq!(tags[1].commit.as_ref().unwrap().parent_shas, [tags[0].sha.clone()]);
    }

    #[tokio::test]
    async fn non_commit_tags_are_excluded() {
        let repo = tagged();
        repo.git(&["tag", "-a", "a-tree", "-m", "tree", "HEAD^{tree}"]);
        let blob = repo.git(&["rev-parse", "HEAD:README.md"]);
        repo.git(&["tag", "blob-light", blob.trim()]);
        repo.push(&["--tags"]);

        let tags = list_tags(&repo, &list()).await;
        assert_eq!(names(&tags), ["v1", "v2"]);

        // excluded tags take no page slot either
        let first = list_tags(
            &repo,
            &ListCommitTagsParams {
                page: 1,
                page_size: 1,
                ..list()
            },
        )
        .await;
        assert_eq!(names(&first), ["v1"]);
    }

    #[tokio::test]
    async fn pages_partition_the_listing() {
        let repo = tagged();
        for name in ["v3", "v4", "v5"] {
            repo.git(&["tag", name]);
        }
        repo.push(&["--tags"]);

        let mut seen = Vec::new();
        for page in 1..=3 {
            let tags = list_tags(
                &repo,
                &ListCommitTagsParams {
                    page,
                    page_size: 2,
                    ..list()
                },
            )
            .await;
            assert!(tags.len() <= 2);
            seen.extend(tags.into_iter().map(|t| t.name));
        }
        assert_eq!(seen, ["v1", "v2", "v3", "v4", "v5"]);
    }

    #[tokio::test]
    async fn query_and_order() {
        let repo = tagged();
        repo.git(&["tag", "release-1"]);
        repo.push(&["--tags"]);

        let tags = list_tags(
            &repo,
            &ListCommitTagsParams {
                query: "^v".into(),
                order: SortOrder::Desc,
                ..list()
            },
        )
        .await;
        assert_eq!(names(&tags), ["v2", "v1"]);

        let tags = list_tags(
            &repo,
            &ListCommitTagsParams {
                query: "1$".into(),
                ..list()
            },
        )
        .await;
        assert_eq!(names(&tags), ["release-1", "v1"]);
    }

    #[tokio::test]
    async fn empty_repository_has_no_tags() {
        let repo = TestRepo::empty();
        assert!(list_tags(&repo, &list()).await.is_empty());
    }

    #[tokio::test]
    async fn overflowing_page_is_invalid() {
        let repo = tagged();
        let err = repo
            .service()
            .list_commit_tags(
                &ListCommitTagsParams {
                    page: i32::MAX,
                    page_size: 10,
                    ..list()
                },
                &CancelToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}

mod create_and_delete {
    use super::*;

    fn create(name: &str, target: &str, message: &str) -> CreateCommitTagParams {
        CreateCommitTagParams {
            write: writer(),
            name: name.into(),
            target: target.into(),
            message: message.into(),
            tagger: None,
            tagger_date: None,
        }
    }

    #[tokio::test]
    async fn lightweight_from_branch() {
        let repo = TestRepo::new();
        let head = repo.work_rev("main");

        let tag = repo
            .service()
            .create_commit_tag(&create("v1", "main", ""), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(tag.name, "v1");
        assert!(!tag.is_annotated);
        assert_eq!(tag.sha, head);
        assert_eq!(tag.commit.unwrap().title, "Initial commit");
        assert_eq!(repo.bare_rev("refs/tags/v1"), Some(head));
        assert_eq!(repo.tmp_entries(), 0);
    }

    #[tokio::test]
    async fn annotated_from_sha() {
        let repo = TestRepo::new();
        let head = repo.work_rev("main");
        let when = DateTime::parse_from_rfc3339("2024-05-01T12:00:00+02:00").unwrap();
        let params = CreateCommitTagParams {
            tagger_date: Some(when),
            ..create("v2", head.as_str(), "release\n\nnotes")
        };

        let tag = repo
            .service()
            .create_commit_tag(&params, &CancelToken::new())
            .await
            .unwrap();

        assert!(tag.is_annotated);
        assert_eq!(tag.sha, head);
        assert_eq!(tag.title, "release");
        assert_eq!(tag.message, "release\n\nnotes");
        let tagger = tag.tagger.unwrap();
        assert_eq!(tagger.identity, Identity::new("Ada", "ada@example.com"));
        assert_eq!(tagger.when, when);
        assert_eq!(tagger.when.offset().local_minus_utc(), 2 * 3600);

        let listed = list_tags(&repo, &list()).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].sha, head);
        assert_eq!(listed[0].message, "release\n\nnotes");
    }

    #[tokio::test]
    async fn duplicate_conflicts() {
        let repo = tagged();
        let err = repo
            .service()
            .create_commit_tag(&create("v1", "main", ""), &CancelToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(repo.tmp_entries(), 0);
    }

    #[tokio::test]
    async fn missing_target() {
        let repo = TestRepo::new();
        let err = repo
            .service()
            .create_commit_tag(&create("v1", "does-not-exist", ""), &CancelToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(repo.bare_rev("refs/tags/v1"), None);
    }

    #[tokio::test]
    async fn delete() {
        let repo = tagged();
        let params = DeleteTagParams {
            write: writer(),
            name: "v2".into(),
        };
        let service = repo.service();

        service.delete_tag(&params, &CancelToken::new()).await.unwrap();
        assert_eq!(repo.bare_rev("refs/tags/v2"), None);
        assert_eq!(names(&list_tags(&repo, &list()).await), ["v1"]);

        let err = service
            .delete_tag(&params, &CancelToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
