use std::fs;
use std::path::{Path, PathBuf};

use dilithium_signer_core::{Result, SignerError};

pub const HOOK_NAME: &str = "post-commit";

/// Script that signs every new commit.
pub const POST_COMMIT_HOOK: &str = "#!/bin/sh\n\
# Installed by dilithium-signer: sign each new commit with the local key.\n\
dilithium-signer sign HEAD\n";

/// Write the post-commit hook into `hooks_dir`, replacing any existing one.
pub fn install_post_commit(hooks_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(hooks_dir).map_err(|err| io_failure(hooks_dir, err))?;
    let path = hooks_dir.join(HOOK_NAME);
    fs::write(&path, POST_COMMIT_HOOK).map_err(|err| io_failure(&path, err))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .map_err(|err| io_failure(&path, err))?;
    }
    tracing::info!(path = %path.display(), "installed post-commit hook");
    Ok(path)
}

fn io_failure(path: &Path, source: std::io::Error) -> SignerError {
    SignerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_executable_hook() {
        let dir = tempfile::tempdir().unwrap();
        let hooks = dir.path().join(".git").join("hooks");
        let path = install_post_commit(&hooks).unwrap();
        assert_eq!(path, hooks.join("post-commit"));

        let script = fs::read_to_string(&path).unwrap();
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("dilithium-signer sign HEAD"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn reinstall_replaces_existing_hook() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(HOOK_NAME), "#!/bin/sh\nexit 1\n").unwrap();
        install_post_commit(dir.path()).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join(HOOK_NAME)).unwrap(),
            POST_COMMIT_HOOK
        );
    }
}
