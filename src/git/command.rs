//! git::command
//!
//! Runner for the `git` executable.
//!
//! # Invariants
//!
//! - Every child runs with `kill_on_drop`, no stdin and no terminal prompts.
//! - A cancelled operation kills and reaps its child before returning
//!   [`GitError::Cancelled`].
//! - Reference walks are streamed: entries reach the instructor as git
//!   prints them, and a `Stop` kills git instead of draining its output.

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

use super::backend::WalkHandler;
use super::cancel::CancelToken;
use super::interface::GitError;
use super::types::{
    PushOptions, ReferenceField, SortOrder, WalkEntry, WalkInstruction, WalkOptions, WalkSort,
};
use crate::walk::WalkInstructor;

/// Invokes the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCommand {
    executable: String,
}

enum WalkEnd {
    Exhausted,
    Stopped,
}

impl GitCommand {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    fn spawn(&self, dir: &Path, args: &[String], env: &[(String, String)]) -> Result<Child, GitError> {
        Command::new(&self.executable)
            .args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GitError::io(format!("failed to spawn {} {}", self.executable, subcommand(args)), e))
    }

    /// Run git to completion and return its stdout.
    pub async fn run(
        &self,
        dir: &Path,
        args: &[String],
        env: &[(String, String)],
        cancel: &CancelToken,
    ) -> Result<Vec<u8>, GitError> {
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled);
        }

        let mut child = self.spawn(dir, args, env)?;
        let mut stdout = take_pipe(child.stdout.take())?;
        let mut stderr = take_pipe(child.stderr.take())?;
        let mut out = Vec::new();
        let mut err = Vec::new();

        let outcome = {
            let finished = async {
                tokio::try_join!(
                    child.wait(),
                    stdout.read_to_end(&mut out),
                    stderr.read_to_end(&mut err)
                )
            };
            tokio::select! {
                result = finished => Some(result),
                _ = cancel.cancelled() => None,
            }
        };

        let Some(result) = outcome else {
            kill(&mut child).await;
            return Err(GitError::Cancelled);
        };
        let (status, _, _) =
            result.map_err(|e| GitError::io(format!("git {} failed", subcommand(args)), e))?;
        check_status(args, status, &err)?;
        Ok(out)
    }

    /// Stream `for-each-ref` output through `instructor` into `handler`.
    pub async fn for_each_ref(
        &self,
        dir: &Path,
        options: &WalkOptions,
        instructor: &mut dyn WalkInstructor,
        handler: &mut WalkHandler<'_>,
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        if options.fields.is_empty() {
            return Err(GitError::Internal {
                message: "reference walk requires at least one field".to_string(),
            });
        }
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled);
        }

        let args = for_each_ref_args(options);
        debug!(dir = %dir.display(), patterns = ?options.patterns, "walking references");

        let mut child = self.spawn(dir, &args, &[])?;
        let stdout = take_pipe(child.stdout.take())?;
        let stderr = tokio::spawn(drain(take_pipe(child.stderr.take())?));
        let mut reader = BufReader::new(stdout);

        match read_entries(&mut reader, &options.fields, instructor, handler, cancel).await {
            Ok(WalkEnd::Exhausted) => {
                let status = child
                    .wait()
                    .await
                    .map_err(|e| GitError::io("git for-each-ref failed", e))?;
                let stderr = stderr.await.unwrap_or_default();
                check_status(&args, status, &stderr)
            }
            Ok(WalkEnd::Stopped) => {
                kill(&mut child).await;
                Ok(())
            }
            Err(e) => {
                kill(&mut child).await;
                Err(e)
            }
        }
    }

    /// Bare clone of `origin` into `dest`, borrowing the origin's objects.
    pub async fn clone_shared(
        &self,
        origin: &Path,
        dest: &Path,
        branch: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        let origin = std::fs::canonicalize(origin)
            .map_err(|e| GitError::io(format!("failed to resolve {}", origin.display()), e))?;
        let dest = std::fs::canonicalize(dest)
            .map_err(|e| GitError::io(format!("failed to resolve {}", dest.display()), e))?;

        let mut args: Vec<String> = ["clone", "--bare", "--shared", "--quiet"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let Some(branch) = branch {
            args.extend(["--branch".to_string(), branch.to_string(), "--single-branch".to_string()]);
        }
        args.push("--".to_string());
        args.push(origin.display().to_string());
        args.push(dest.display().to_string());

        debug!(origin = %origin.display(), dest = %dest.display(), ?branch, "cloning working copy");
        self.run(&dest, &args, &[], cancel).await.map(|_| ())
    }

    /// Push as described by `options`, classifying rejections.
    pub async fn push(
        &self,
        dir: &Path,
        options: &PushOptions,
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        let args = push_args(options);
        debug!(
            refspec = %options.refspec,
            force = options.force,
            lease = ?options.force_with_lease,
            "pushing"
        );

        match self.run(dir, &args, &options.env, cancel).await {
            Ok(_) => Ok(()),
            Err(GitError::CommandFailed { stderr, .. }) => Err(classify_push_failure(
                &stderr,
                options.force_with_lease.is_some(),
            )),
            Err(e) => Err(e),
        }
    }

    /// Stream a unified diff into `sink`.
    pub async fn diff(
        &self,
        dir: &Path,
        base: &str,
        head: &str,
        merge_base: bool,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        cancel: &CancelToken,
    ) -> Result<(), GitError> {
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled);
        }

        let args = diff_args(base, head, merge_base);
        debug!(base, head, merge_base, "streaming raw diff");

        let mut child = self.spawn(dir, &args, &[])?;
        let mut stdout = take_pipe(child.stdout.take())?;
        let stderr = tokio::spawn(drain(take_pipe(child.stderr.take())?));

        let copied = tokio::select! {
            copied = tokio::io::copy(&mut stdout, &mut *sink) => Some(copied),
            _ = cancel.cancelled() => None,
        };

        match copied {
            None => {
                kill(&mut child).await;
                Err(GitError::Cancelled)
            }
            Some(Err(e)) => {
                kill(&mut child).await;
                Err(GitError::io("failed to stream diff", e))
            }
            Some(Ok(_)) => {
                sink.flush()
                    .await
                    .map_err(|e| GitError::io("failed to flush diff sink", e))?;
                let status = child
                    .wait()
                    .await
                    .map_err(|e| GitError::io("git diff failed", e))?;
                let stderr = stderr.await.unwrap_or_default();
                check_status(&args, status, &stderr).map_err(classify_revision_failure)
            }
        }
    }
}

fn subcommand(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or_default()
}

fn take_pipe<T>(pipe: Option<T>) -> Result<T, GitError> {
    pipe.ok_or_else(|| GitError::Internal {
        message: "child process pipe was not captured".to_string(),
    })
}

async fn drain<R: AsyncRead + Unpin>(mut pipe: R) -> Vec<u8> {
    let mut buf = Vec::new();
    // whatever was read before a failure is still useful for diagnostics
    let _ = pipe.read_to_end(&mut buf).await;
    buf
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!(error = %e, "failed to kill git child process");
    }
}

fn check_status(args: &[String], status: ExitStatus, stderr: &[u8]) -> Result<(), GitError> {
    if status.success() {
        return Ok(());
    }
    Err(GitError::CommandFailed {
        command: subcommand(args).to_string(),
        status: status.to_string(),
        stderr: String::from_utf8_lossy(stderr).trim().to_string(),
    })
}

async fn read_entries<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    fields: &[ReferenceField],
    instructor: &mut dyn WalkInstructor,
    handler: &mut WalkHandler<'_>,
    cancel: &CancelToken,
) -> Result<WalkEnd, GitError> {
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = tokio::select! {
            read = reader.read_until(b'\n', &mut line) => read,
            _ = cancel.cancelled() => return Err(GitError::Cancelled),
        };
        if read.map_err(|e| GitError::io("failed to read reference walk output", e))? == 0 {
            return Ok(WalkEnd::Exhausted);
        }

        let entry = parse_entry(&line, fields)?;
        match instructor.instruct(&entry)? {
            WalkInstruction::Handle => handler(entry)?,
            WalkInstruction::Skip => {}
            WalkInstruction::Stop => return Ok(WalkEnd::Stopped),
        }
    }
}

fn parse_entry(line: &[u8], fields: &[ReferenceField]) -> Result<WalkEntry, GitError> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let text = String::from_utf8_lossy(line);
    let values: Vec<&str> = text.split('\0').collect();
    if values.len() != fields.len() {
        return Err(GitError::Internal {
            message: format!(
                "reference walk produced {} values for {} fields: {:?}",
                values.len(),
                fields.len(),
                text
            ),
        });
    }
    Ok(fields
        .iter()
        .copied()
        .zip(values.into_iter().map(str::to_string))
        .collect())
}

fn for_each_ref_args(options: &WalkOptions) -> Vec<String> {
    let format = options
        .fields
        .iter()
        .map(ReferenceField::format_atom)
        .collect::<Vec<_>>()
        .join("%00");
    let mut args = vec!["for-each-ref".to_string(), format!("--format={format}")];

    let key = match options.sort {
        WalkSort::Default => None,
        WalkSort::RefName => Some("refname"),
        WalkSort::CreatorDate => Some("creatordate"),
    };
    match (key, options.order) {
        (Some(key), SortOrder::Desc) => args.push(format!("--sort=-{key}")),
        (Some(key), _) => args.push(format!("--sort={key}")),
        (None, SortOrder::Desc) => args.push("--sort=-refname".to_string()),
        (None, _) => {}
    }

    if options.max_walk_distance > 0 {
        args.push(format!("--count={}", options.max_walk_distance));
    }
    if !options.patterns.is_empty() {
        args.push("--".to_string());
        args.extend(options.patterns.iter().cloned());
    }
    args
}

fn push_args(options: &PushOptions) -> Vec<String> {
    let mut args = vec!["push".to_string()];
    if let Some(lease) = &options.force_with_lease {
        args.push(format!("--force-with-lease={lease}"));
    } else if options.force {
        args.push("--force".to_string());
    }
    args.push(options.remote.clone());
    args.push(options.refspec.clone());
    args
}

fn diff_args(base: &str, head: &str, merge_base: bool) -> Vec<String> {
    let mut args: Vec<String> = [
        "diff",
        "-M",
        "--full-index",
        "--no-color",
        "--no-ext-diff",
        "--src-prefix=a/",
        "--dst-prefix=b/",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    if merge_base {
        args.push(format!("{base}...{head}"));
    } else {
        args.push(base.to_string());
        args.push(head.to_string());
    }
    args.push("--".to_string());
    args
}

/// Map the stderr of a failed push to a typed rejection.
pub(crate) fn classify_push_failure(stderr: &str, leased: bool) -> GitError {
    let message = stderr.trim().to_string();
    if stderr.contains("stale info") {
        return GitError::StaleLease { message };
    }
    // a racing writer moved the ref between our lease check and the remote update
    if leased
        && (stderr.contains("failed to update ref")
            || stderr.contains("cannot lock ref")
            || stderr.contains("incorrect old value"))
    {
        return GitError::StaleLease { message };
    }
    if stderr.contains("already exists") {
        return GitError::AlreadyExists { name: message };
    }
    if stderr.contains("remote ref does not exist") {
        return GitError::RefNotFound { refname: message };
    }
    if stderr.contains("[rejected]") || stderr.contains("[remote rejected]") {
        return GitError::Rejected { message };
    }
    GitError::CommandFailed {
        command: "push".to_string(),
        status: "rejected".to_string(),
        stderr: message,
    }
}

fn classify_revision_failure(err: GitError) -> GitError {
    match err {
        GitError::CommandFailed { stderr, .. }
            if stderr.contains("bad revision")
                || stderr.contains("unknown revision")
                || stderr.contains("ambiguous argument") =>
        {
            GitError::RefNotFound { refname: stderr }
        }
        other => other,
    }
}
