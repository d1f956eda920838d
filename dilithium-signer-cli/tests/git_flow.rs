use std::fs;
use std::path::Path;
use std::process::Command;

use dilithium_signer_cli::commands::App;
use dilithium_signer_cli::git::GitCli;
use dilithium_signer_core::{
    Backend, SecurityLevel, SignerError, SignerPaths, Verification, VersionControl,
};
use pretty_assertions::assert_eq;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn git(repo: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .status()
        .expect("spawn git");
    assert!(status.success(), "git {args:?} failed");
}

fn init_repo(repo: &Path) {
    fs::create_dir_all(repo).unwrap();
    git(repo, &["init", "-q"]);
    git(repo, &["config", "user.email", "alice@example.com"]);
    git(repo, &["config", "user.name", "Alice"]);
    git(repo, &["config", "commit.gpgsign", "false"]);
    fs::write(repo.join("test.txt"), "hello\n").unwrap();
    git(repo, &["add", "test.txt"]);
    git(repo, &["commit", "-q", "-m", "Add test file"]);
}

fn app(root: &Path, home: &str, repo: &Path) -> App {
    App::new(
        SignerPaths::from_root(root.join(home)),
        Backend::PqClean,
        GitCli::new(repo, "signatures"),
    )
}

#[test]
fn sign_and_verify_head_through_git_notes() {
    if !git_available() {
        eprintln!("git not found; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    init_repo(&repo);

    let alice = app(dir.path(), "alice", &repo);
    alice
        .keygen(SecurityLevel::Level2, "alice@example.com", false)
        .unwrap();
    assert_eq!(alice.verify("HEAD").unwrap(), Verification::Unsigned);

    let signed = alice.sign("HEAD").unwrap();
    let git_cli = GitCli::new(&repo, "signatures");
    assert_eq!(signed.commit, git_cli.resolve("HEAD").unwrap());
    assert_eq!(
        git_cli.canonical_message(&signed.commit).unwrap(),
        b"Add test file".to_vec()
    );
    assert_eq!(
        alice.verify("HEAD").unwrap(),
        Verification::Valid {
            identity: "alice@example.com".into(),
            level: SecurityLevel::Level2,
        }
    );

    // A teammate without Alice's key cannot vouch for the commit until they import it.
    let bob = app(dir.path(), "bob", &repo);
    assert_eq!(
        bob.verify("HEAD").unwrap(),
        Verification::UnknownSigner {
            identity: "alice@example.com".into()
        }
    );
    let exported = dir.path().join("alice.pub.json");
    alice.export_key(&exported).unwrap();
    bob.import_key(&exported).unwrap();
    assert!(bob.verify("HEAD").unwrap().is_valid());
}

#[test]
fn rewording_a_signed_message_invalidates_the_note() {
    if !git_available() {
        eprintln!("git not found; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    init_repo(&repo);

    let alice = app(dir.path(), "alice", &repo);
    alice
        .keygen(SecurityLevel::Level3, "alice@example.com", false)
        .unwrap();
    let signed = alice.sign("HEAD").unwrap();

    // Move the note onto a commit with a different message.
    git(&repo, &["commit", "-q", "--allow-empty", "-m", "Something else"]);
    git(
        &repo,
        &["notes", "--ref=signatures", "copy", &signed.commit, "HEAD"],
    );
    assert_eq!(
        alice.verify("HEAD").unwrap(),
        Verification::Invalid {
            identity: "alice@example.com".into(),
            level: SecurityLevel::Level3,
        }
    );
}

#[test]
fn git_failures_carry_stderr() {
    if !git_available() {
        eprintln!("git not found; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    init_repo(&repo);

    let err = GitCli::new(&repo, "signatures")
        .resolve("no-such-branch")
        .unwrap_err();
    match err {
        SignerError::Collaborator(message) => {
            assert!(message.starts_with("git rev-parse --verify no-such-branch^{commit} failed"))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn setup_hook_writes_into_repository_hooks() {
    if !git_available() {
        eprintln!("git not found; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    init_repo(&repo);

    let path = app(dir.path(), "alice", &repo).setup_hook().unwrap();
    assert_eq!(
        fs::canonicalize(&path).unwrap(),
        fs::canonicalize(repo.join(".git/hooks/post-commit")).unwrap()
    );
    assert!(fs::read_to_string(&path)
        .unwrap()
        .contains("dilithium-signer sign HEAD"));
}
