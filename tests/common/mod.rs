//! Shared fixture for integration tests.
//!
//! A fixture is a temp directory laid out the way the service expects it:
//!
//! ```text
//! <root>/repos/<uid>.git   bare repository the service operates on
//! <root>/tmp/              working copies
//! <root>/work/             non-bare clone used to stage commits and tags
//! ```

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use refkeep::core::config::Config;
use refkeep::core::types::Oid;
use refkeep::service::{Identity, Service, WriteParams};

pub const REPO_UID: &str = "acme";

/// Test fixture backed by real git repositories.
pub struct TestRepo {
    root: TempDir,
}

impl TestRepo {
    /// A repository whose `main` branch holds one commit.
    pub fn new() -> Self {
        let repo = Self::empty();
        repo.commit_file("README.md", "# Test Repo\n", "Initial commit");
        repo.push(&["main"]);
        repo
    }

    /// A repository without any commits.
    pub fn empty() -> Self {
        let root = TempDir::new().expect("failed to create temp dir");
        let repo = Self { root };

        std::fs::create_dir_all(repo.bare_path()).unwrap();
        run_git(&repo.bare_path(), &["init", "--bare", "--initial-branch=main"]);

        std::fs::create_dir_all(repo.work_path()).unwrap();
        let work = repo.work_path();
        run_git(&work, &["init", "--initial-branch=main"]);
        run_git(&work, &["config", "user.email", "test@example.com"]);
        run_git(&work, &["config", "user.name", "Test User"]);
        run_git(&work, &["config", "commit.gpgsign", "false"]);
        run_git(&work, &["config", "tag.gpgsign", "false"]);
        let bare = repo.bare_path();
        run_git(&work, &["remote", "add", "origin", bare.to_str().unwrap()]);

        repo
    }

    pub fn bare_path(&self) -> PathBuf {
        self.root.path().join("repos").join(format!("{REPO_UID}.git"))
    }

    pub fn work_path(&self) -> PathBuf {
        self.root.path().join("work")
    }

    pub fn tmp_path(&self) -> PathBuf {
        self.root.path().join("tmp")
    }

    pub fn config(&self) -> Config {
        Config::with_dirs(self.root.path().join("repos"), self.tmp_path())
    }

    pub fn service(&self) -> Service {
        Service::from_config(&self.config())
    }

    /// Write, stage and commit a file in the work tree; returns the commit.
    pub fn commit_file(&self, path: &str, content: &str, message: &str) -> Oid {
        std::fs::write(self.work_path().join(path), content).unwrap();
        run_git(&self.work_path(), &["add", path]);
        run_git(&self.work_path(), &["commit", "-m", message]);
        self.work_rev("HEAD")
    }

    /// Run git in the work tree.
    pub fn git(&self, args: &[&str]) -> String {
        run_git(&self.work_path(), args)
    }

    /// Push refs from the work tree to the bare repository.
    pub fn push(&self, refs: &[&str]) {
        let mut args = vec!["push", "--quiet", "origin"];
        args.extend_from_slice(refs);
        run_git(&self.work_path(), &args);
    }

    pub fn work_rev(&self, rev: &str) -> Oid {
        Oid::new(run_git(&self.work_path(), &["rev-parse", rev]).trim()).unwrap()
    }

    /// Resolve a revision in the bare repository, if it exists.
    pub fn bare_rev(&self, rev: &str) -> Option<Oid> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", rev])
            .current_dir(self.bare_path())
            .output()
            .expect("git rev-parse failed");
        if !output.status.success() {
            return None;
        }
        Some(Oid::new(String::from_utf8(output.stdout).unwrap().trim()).unwrap())
    }

    /// Number of entries left in the working copy directory.
    pub fn tmp_entries(&self) -> usize {
        match std::fs::read_dir(self.tmp_path()) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

pub fn writer() -> WriteParams {
    WriteParams::new(REPO_UID, Identity::new("Ada", "ada@example.com"))
}

/// Run a git command in the given directory and return its stdout.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8(output.stdout).unwrap()
}
