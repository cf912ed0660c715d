use anyhow::Result;
use chrono::NaiveDate;
use git2::{Oid, Repository, Signature, Time};
use git_squash::config::{DateTimezone, SquashConfig};
use git_squash::git::GitRepository;
use git_squash::squash::{
    analyze, derive_branch_name, plan, select_commits, DeterministicSummarizer, ExecutionStatus,
    RewriteExecutor, SquashError,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test setup that creates a temporary git repository with dated commits
struct TestRepo {
    _temp_dir: TempDir,
    repo_path: PathBuf,
    repo: Repository,
    commits: Vec<Oid>,
}

impl TestRepo {
    fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let repo_path = temp_dir.path().to_path_buf();
        let repo = Repository::init(&repo_path)?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        Ok(TestRepo {
            _temp_dir: temp_dir,
            repo_path,
            repo,
            commits: Vec::new(),
        })
    }

    /// Commits `content` to `file` with an author time of `rfc3339` (UTC).
    fn add_commit(&mut self, file: &str, content: &str, message: &str, rfc3339: &str) -> Result<Oid> {
        let path = self.repo_path.join(file);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, content)?;

        let mut index = self.repo.index()?;
        index.add_path(Path::new(file))?;
        index.write()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let seconds = chrono::DateTime::parse_from_rfc3339(rfc3339)?.timestamp();
        let signature = Signature::new("Test User", "test@example.com", &Time::new(seconds, 0))?;

        let parent = match self.commits.last() {
            Some(id) => Some(self.repo.find_commit(*id)?),
            None => None,
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let commit_id = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        self.commits.push(commit_id);
        Ok(commit_id)
    }

    /// Two days of small commits: three on the 20th, two on the 21st.
    fn with_two_days() -> Result<Self> {
        let mut repo = Self::new()?;
        repo.add_commit("src/lib.rs", "pub fn a() {}\n", "Add parser skeleton", "2025-06-20T08:00:00Z")?;
        repo.add_commit("src/lib.rs", "pub fn a() { }\n", "Fix crash in parser", "2025-06-20T09:00:00Z")?;
        repo.add_commit("README.md", "# demo\n", "Document usage", "2025-06-20T10:00:00Z")?;
        repo.add_commit("tests/parser.rs", "#[test]\nfn t() {}\n", "Cover parser", "2025-06-21T08:00:00Z")?;
        repo.add_commit("src/lib.rs", "pub fn a() { 1; }\n", "Fix off by one", "2025-06-21T09:00:00Z")?;
        Ok(repo)
    }

    fn head(&self) -> Result<Oid> {
        Ok(self.repo.head()?.peel_to_commit()?.id())
    }

    fn open(&self) -> Result<GitRepository> {
        GitRepository::open_at(&self.repo_path)
    }
}

fn utc_config() -> SquashConfig {
    SquashConfig {
        timezone: DateTimezone::Utc,
        test_mode: true,
        ..SquashConfig::default()
    }
}

/// Counts commits on `branch` by following first parents.
fn branch_length(repo: &Repository, branch: &str) -> Result<usize> {
    let mut commit = repo
        .find_reference(&format!("refs/heads/{branch}"))?
        .peel_to_commit()?;
    let mut count = 1;
    while commit.parent_count() > 0 {
        commit = commit.parent(0)?;
        count += 1;
    }
    Ok(count)
}

#[tokio::test]
async fn squashes_full_history_into_one_commit_per_day() -> Result<()> {
    let test_repo = TestRepo::with_two_days()?;
    let head_before = test_repo.head()?;
    let mut git = test_repo.open()?;
    let config = utc_config();

    let history = git.read_history("HEAD")?;
    assert_eq!(history.len(), 5);
    let groups = analyze(select_commits(&history, &config)?, &config);
    assert_eq!(groups.len(), 2);

    let plan = plan(groups, &DeterministicSummarizer, &config).await;
    assert_eq!(plan.total_original_commits(), 5);
    assert_eq!(plan.fallback_count(), 0);
    assert!(plan.base().is_none());

    let branch = derive_branch_name(&plan, &DeterministicSummarizer, &config).await;
    assert_eq!(branch, "squash/fix-2025-06-20-to-2025-06-21");

    let report = RewriteExecutor::new(&mut git, &config).execute(&plan, &branch, false);
    assert_eq!(report.status, ExecutionStatus::Completed, "{:?}", report.failure);
    assert_eq!(report.created_commits.len(), 2);

    let repo = &test_repo.repo;
    let tip = repo.find_reference(&format!("refs/heads/{branch}"))?.peel_to_commit()?;
    assert_eq!(tip.tree_id(), repo.find_commit(head_before)?.tree_id());
    assert_eq!(branch_length(repo, &branch)?, 2);
    assert_eq!(test_repo.head()?, head_before);

    let message = tip.message().unwrap_or_default().to_string();
    assert!(message.starts_with("fix: bug fixes (2025-06-21)"), "{message}");
    assert!(message.contains("- test: Cover parser"));
    assert!(message.contains("[fix] squashed 2 commits"));

    let backup = report.backup_ref.unwrap_or_default();
    assert!(backup.starts_with("refs/heads/backup/pre-squash-"));
    assert_eq!(repo.find_reference(&backup)?.peel_to_commit()?.id(), head_before);
    Ok(())
}

#[tokio::test]
async fn start_date_keeps_earlier_commits_as_base() -> Result<()> {
    let test_repo = TestRepo::with_two_days()?;
    let mut git = test_repo.open()?;
    let config = SquashConfig {
        start_date: NaiveDate::from_ymd_opt(2025, 6, 21),
        ..utc_config()
    };

    let history = git.read_history("HEAD")?;
    let selected = select_commits(&history, &config)?;
    assert_eq!(selected.len(), 2);

    let plan = plan(analyze(selected, &config), &DeterministicSummarizer, &config).await;
    assert_eq!(plan.base(), Some(test_repo.commits[2].to_string().as_str()));

    let report = RewriteExecutor::new(&mut git, &config).execute(&plan, "squash/recent", false);
    assert!(report.is_completed());

    let repo = &test_repo.repo;
    let tip = repo.find_reference("refs/heads/squash/recent")?.peel_to_commit()?;
    assert_eq!(tip.parent_id(0)?, test_repo.commits[2]);
    assert_eq!(tip.tree_id(), repo.find_commit(test_repo.head()?)?.tree_id());
    assert_eq!(branch_length(repo, "squash/recent")?, 4);
    Ok(())
}

/// Commits a blob to `refs/heads/{branch}` on top of `parent`, leaving HEAD alone.
fn commit_to_branch(
    repo: &Repository,
    branch: &str,
    parent: Oid,
    file: &str,
    content: &str,
    message: &str,
    rfc3339: &str,
) -> Result<Oid> {
    let parent = repo.find_commit(parent)?;
    let blob = repo.blob(content.as_bytes())?;
    let mut builder = repo.treebuilder(Some(&parent.tree()?))?;
    builder.insert(file, blob, 0o100_644)?;
    let tree = repo.find_tree(builder.write()?)?;

    let seconds = chrono::DateTime::parse_from_rfc3339(rfc3339)?.timestamp();
    let signature = Signature::new("Test User", "test@example.com", &Time::new(seconds, 0))?;
    Ok(repo.commit(
        Some(&format!("refs/heads/{branch}")),
        &signature,
        &signature,
        message,
        &tree,
        &[&parent],
    )?)
}

#[tokio::test]
async fn range_ending_off_head_backs_up_its_own_tip() -> Result<()> {
    let test_repo = TestRepo::with_two_days()?;
    let repo = &test_repo.repo;
    let head_before = test_repo.head()?;

    let side = commit_to_branch(
        repo,
        "feature",
        head_before,
        "feature.txt",
        "one\n",
        "Add feature flag",
        "2025-06-22T08:00:00Z",
    )?;
    let feature_tip = commit_to_branch(
        repo,
        "feature",
        side,
        "feature.txt",
        "one\ntwo\n",
        "Fix feature flag default",
        "2025-06-22T09:00:00Z",
    )?;

    let mut git = test_repo.open()?;
    let config = utc_config();
    let history = git.read_history(&format!("{head_before}..feature"))?;
    assert_eq!(history.len(), 2);

    let plan = plan(analyze(&history, &config), &DeterministicSummarizer, &config).await;
    assert_eq!(plan.base(), Some(head_before.to_string().as_str()));

    let report = RewriteExecutor::new(&mut git, &config).execute(&plan, "squash/feature", false);
    assert!(report.is_completed(), "{:?}", report.failure);

    let backup = report.backup_ref.unwrap_or_default();
    assert_eq!(repo.find_reference(&backup)?.peel_to_commit()?.id(), feature_tip);
    assert_eq!(test_repo.head()?, head_before);

    let squashed = repo
        .find_reference("refs/heads/squash/feature")?
        .peel_to_commit()?;
    assert_eq!(squashed.parent_id(0)?, head_before);
    assert_eq!(squashed.tree_id(), repo.find_commit(feature_tip)?.tree_id());
    Ok(())
}

#[tokio::test]
async fn end_date_leaves_later_commits_off_the_new_branch() -> Result<()> {
    let test_repo = TestRepo::with_two_days()?;
    let mut git = test_repo.open()?;
    let config = SquashConfig {
        end_date: NaiveDate::from_ymd_opt(2025, 6, 20),
        ..utc_config()
    };

    let history = git.read_history("HEAD")?;
    let selected = select_commits(&history, &config)?;
    assert_eq!(selected.len(), 3);

    let plan = plan(analyze(selected, &config), &DeterministicSummarizer, &config).await;
    assert_eq!(plan.len(), 1);
    let report = RewriteExecutor::new(&mut git, &config).execute(&plan, "squash/first-day", false);
    assert!(report.is_completed());

    let repo = &test_repo.repo;
    let tip = repo
        .find_reference("refs/heads/squash/first-day")?
        .peel_to_commit()?;
    assert_eq!(tip.tree_id(), repo.find_commit(test_repo.commits[2])?.tree_id());
    assert_eq!(tip.parent_count(), 0);

    let backup = report.backup_ref.unwrap_or_default();
    assert_eq!(
        repo.find_reference(&backup)?.peel_to_commit()?.id(),
        test_repo.commits[2]
    );
    Ok(())
}

#[tokio::test]
async fn dry_run_writes_nothing() -> Result<()> {
    let test_repo = TestRepo::with_two_days()?;
    let mut git = test_repo.open()?;
    let config = utc_config();

    let history = git.read_history("HEAD")?;
    let plan = plan(analyze(&history, &config), &DeterministicSummarizer, &config).await;
    let report = RewriteExecutor::new(&mut git, &config).execute(&plan, "squash/preview", true);

    assert_eq!(report.status, ExecutionStatus::NotAttempted);
    assert!(report.preview.contains("5 commits -> 2 squashed commits"));
    let branches = test_repo.repo.branches(None)?.count();
    assert_eq!(branches, 1);
    Ok(())
}

#[test]
fn merge_commits_are_rejected() -> Result<()> {
    let test_repo = TestRepo::with_two_days()?;
    let repo = &test_repo.repo;
    let signature = Signature::now("Test User", "test@example.com")?;
    let first = repo.find_commit(test_repo.commits[0])?;
    let side_id = repo.commit(None, &signature, &signature, "Side", &first.tree()?, &[&first])?;
    let side = repo.find_commit(side_id)?;
    let head = repo.head()?.peel_to_commit()?;
    let merge = repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        "Merge side",
        &head.tree()?,
        &[&head, &side],
    )?;

    let err = test_repo.open()?.read_history("HEAD").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SquashError>(),
        Some(SquashError::NonLinearHistory(hash)) if *hash == merge.to_string()
    ));
    Ok(())
}

#[test]
fn missing_repository_is_reported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let err = GitRepository::open_at(dir.path().join("absent")).err();
    assert!(matches!(
        err.as_ref().and_then(|e| e.downcast_ref::<SquashError>()),
        Some(SquashError::RepositoryNotFound(_))
    ));
    Ok(())
}
