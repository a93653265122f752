// src/report/hook.rs
//
// Optional step after the state file is saved, e.g. commit it to the repo
// the job runs in as an audit trail. Callers log and swallow every error.

use std::{
    path::Path,
    process::{Command, Output},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("cannot run {program}: {source}")]
    Spawn { program: String, source: std::io::Error },

    #[error("{program} {step} exited with {code:?}: {stderr}")]
    Failed { program: String, step: String, code: Option<i32>, stderr: String },
}

/// What was just saved, for commit messages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub date: String,
    pub lines: Vec<String>,
}

impl SaveSummary {
    pub fn commit_message(&self) -> String {
        let mut msg = format!("Daily XP update {}", self.date);
        if !self.lines.is_empty() {
            msg.push_str("\n\n");
            msg.push_str(&self.lines.join("\n"));
        }
        msg
    }
}

pub trait PostSaveHook {
    fn after_save(&self, path: &Path, summary: &SaveSummary) -> Result<(), HookError>;
}

/// `git add <state>`, `git commit`, optionally `git push`.
/// "Nothing to commit" counts as success.
#[derive(Clone, Debug, Default)]
pub struct GitCommitHook {
    pub push: bool,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    /// Working tree to run in; the state file's directory when `None`.
    pub repo_dir: Option<std::path::PathBuf>,
}

impl GitCommitHook {
    fn git(&self, cwd: &Path, args: &[&str]) -> Result<Output, HookError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(cwd);
        if let Some(name) = &self.user_name {
            cmd.arg("-c").arg(format!("user.name={name}"));
        }
        if let Some(email) = &self.user_email {
            cmd.arg("-c").arg(format!("user.email={email}"));
        }
        cmd.args(args);
        logd!("git {}", args.join(" "));
        cmd.output().map_err(|source| HookError::Spawn { program: s!("git"), source })
    }

    fn check(step: &str, out: Output) -> Result<Output, HookError> {
        if out.status.success() {
            return Ok(out);
        }
        Err(HookError::Failed {
            program: s!("git"),
            step: step.to_string(),
            code: out.status.code(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        })
    }
}

impl PostSaveHook for GitCommitHook {
    fn after_save(&self, path: &Path, summary: &SaveSummary) -> Result<(), HookError> {
        let cwd = match (&self.repo_dir, path.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(p)) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        let file = path.file_name().map(|f| f.to_string_lossy().into_owned()).unwrap_or_default();
        let target = if self.repo_dir.is_some() { path.to_string_lossy().into_owned() } else { file };

        Self::check("add", self.git(&cwd, &["add", "--", &target])?)?;

        let msg = summary.commit_message();
        let out = self.git(&cwd, &["commit", "-m", &msg])?;
        if !out.status.success() {
            let stdout = String::from_utf8_lossy(&out.stdout);
            if stdout.contains("nothing to commit") || stdout.contains("no changes added") {
                logf!("git: nothing to commit");
                return Ok(());
            }
            Self::check("commit", out)?;
        }

        if self.push {
            Self::check("push", self.git(&cwd, &["push"])?)?;
            logf!("git: pushed state update");
        } else {
            logf!("git: committed state update");
        }
        Ok(())
    }
}

/// Runs `program <state path>`; a non-zero exit is an error.
#[derive(Clone, Debug)]
pub struct CommandHook {
    pub program: String,
}

impl PostSaveHook for CommandHook {
    fn after_save(&self, path: &Path, _summary: &SaveSummary) -> Result<(), HookError> {
        let out = Command::new(&self.program)
            .arg(path)
            .output()
            .map_err(|source| HookError::Spawn { program: self.program.clone(), source })?;
        if out.status.success() {
            return Ok(());
        }
        Err(HookError::Failed {
            program: self.program.clone(),
            step: s!("run"),
            code: out.status.code(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        })
    }
}
