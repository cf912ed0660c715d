//! Writes squashed commits with git2, without touching HEAD or the work tree.

use anyhow::{Context, Result};
use git2::{Commit, ErrorCode, Oid, Signature, Time};
use tracing::debug;

use crate::git::GitRepository;
use crate::squash::{ChangeSet, HistoryWriter};

/// Committer used when the repository has no `user.name`/`user.email`.
const FALLBACK_COMMITTER: (&str, &str) = ("git-squash", "git-squash@localhost");

impl GitRepository {
    fn find_commit_by_hash(&self, hash: &str) -> Result<Commit<'_>> {
        let oid = Oid::from_str(hash).with_context(|| format!("Invalid commit hash: {hash}"))?;
        self.repository()
            .find_commit(oid)
            .with_context(|| format!("Commit {hash} not found"))
    }

    fn branch_tip(&self, refname: &str) -> Result<Option<Commit<'_>>> {
        match self.repository().find_reference(refname) {
            Ok(reference) => Ok(Some(
                reference
                    .peel_to_commit()
                    .with_context(|| format!("{refname} does not point at a commit"))?,
            )),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {refname}")),
        }
    }
}

impl HistoryWriter for GitRepository {
    fn create_backup_ref(&mut self, name: &str, target: &str) -> Result<String> {
        let name = self.unique_branch_name(name)?;
        let commit = self.find_commit_by_hash(target)?;
        let branch = self
            .repository()
            .branch(&name, &commit, false)
            .with_context(|| format!("Failed to create backup branch {name}"))?;
        let full = branch
            .get()
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("refs/heads/{name}"));
        debug!(backup = %full, target, "Recorded backup branch");
        Ok(full)
    }

    fn create_branch(&mut self, name: &str, base: Option<&str>) -> Result<()> {
        if self.branch_exists(name)? {
            anyhow::bail!("Branch {name} already exists");
        }
        match base {
            Some(hash) => {
                let commit = self.find_commit_by_hash(hash)?;
                self.repository()
                    .branch(name, &commit, false)
                    .with_context(|| format!("Failed to create branch {name}"))?;
            }
            // Unborn: the first commit creates the ref.
            None => debug!(branch = name, "Plan starts at a root commit"),
        }
        Ok(())
    }

    fn commit(&mut self, branch: &str, message: &str, changes: &ChangeSet) -> Result<String> {
        let refname = format!("refs/heads/{branch}");
        let last = self.find_commit_by_hash(&changes.last)?;
        let tree = last.tree().context("Failed to get commit tree")?;
        let parent = self.branch_tip(&refname)?;

        let when = Time::new(
            changes.author_date.timestamp(),
            changes.author_date.offset().local_minus_utc() / 60,
        );
        let author = Signature::new(&changes.author_name, &changes.author_email, &when)
            .context("Invalid author signature")?;
        let repo = self.repository();
        let committer = match repo.signature() {
            Ok(sig) => sig,
            Err(_) => Signature::now(FALLBACK_COMMITTER.0, FALLBACK_COMMITTER.1)
                .context("Failed to build committer signature")?,
        };

        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        let oid = repo
            .commit(Some(&refname), &author, &committer, message, &tree, &parents)
            .with_context(|| format!("Failed to commit {}..{} onto {branch}", changes.first, changes.last))?;
        Ok(oid.to_string())
    }
}
