//! Atomic writer for rendered artifacts and the sitemap.
//!
//! ## Write protocol
//!
//! 1. Normalise CRLF to LF.
//! 2. SHA-256 hash the content.
//! 3. Compare with the stored hash (artifacts) or the file on disk (sitemap);
//!    skip if identical.
//! 4. Write to `<path>.prerender.tmp`.
//! 5. Rename to the final path (atomic on POSIX).
//! 6. Record the new hash (caller saves the store).

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use prerender_core::Slug;

use crate::error::{io_err, SyncError};
use crate::hash_store::HashStore;

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// Content matches what is already on disk.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }
}

pub fn sha256_hex(content: &str) -> String {
    let mut h = Sha256::new();
    h.update(content.as_bytes());
    hex::encode(h.finalize())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.prerender.tmp", path.display()))
}

/// `<artifacts_dir>/<slug>.html`
pub fn artifact_path(artifacts_dir: &Path, slug: &Slug) -> PathBuf {
    artifacts_dir.join(slug.artifact_file_name())
}

/// Write one rendered page, gated on the hash store.
///
/// A stored hash only counts when the artifact is still on disk.
pub fn write_artifact(
    artifacts_dir: &Path,
    slug: &Slug,
    html: &str,
    hashes: &mut HashStore,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    let path = artifact_path(artifacts_dir, slug);
    let content = html.replace("\r\n", "\n");
    let digest = sha256_hex(&content);

    if hashes.get(slug.as_str()) == Some(&digest) && path.exists() {
        debug!(slug = %slug, "unchanged: {}", path.display());
        return Ok(WriteResult::Unchanged { path });
    }

    if dry_run {
        info!(slug = %slug, "[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite { path });
    }

    atomic_write_with_tmp(&path, &content, &tmp_path_for(&path))?;
    hashes.insert(slug.as_str().to_string(), digest);

    info!(slug = %slug, "wrote: {}", path.display());
    Ok(WriteResult::Written { path })
}

/// Replace the sitemap file; a previous file survives any failure.
pub fn write_sitemap(path: &Path, xml: &str, dry_run: bool) -> Result<WriteResult, SyncError> {
    let content = xml.replace("\r\n", "\n");

    if let Ok(existing) = std::fs::read_to_string(path) {
        if sha256_hex(&existing) == sha256_hex(&content) {
            debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
    }

    if dry_run {
        info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    atomic_write_with_tmp(path, &content, &tmp_path_for(path))?;
    info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

fn atomic_write_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }

    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::TempDir;

    fn slug(s: &str) -> Slug {
        Slug::parse(s).unwrap()
    }

    #[test]
    fn first_write_returns_written() {
        let tmp = TempDir::new().unwrap();
        let mut hashes = HashStore::new();
        let result = write_artifact(tmp.path(), &slug("a"), "<html/>", &mut hashes, false).unwrap();
        assert_eq!(
            result,
            WriteResult::Written {
                path: tmp.path().join("a.html")
            }
        );
        assert_eq!(fs::read_to_string(tmp.path().join("a.html")).unwrap(), "<html/>");
        assert_eq!(hashes.get("a"), Some(&sha256_hex("<html/>")));
    }

    #[test]
    fn second_write_same_content_keeps_mtime() {
        let tmp = TempDir::new().unwrap();
        let mut hashes = HashStore::new();
        write_artifact(tmp.path(), &slug("a"), "same", &mut hashes, false).unwrap();
        let path = tmp.path().join("a.html");
        let mtime_1 = fs::metadata(&path).unwrap().modified().unwrap();

        sleep(Duration::from_millis(1100));
        let result = write_artifact(tmp.path(), &slug("a"), "same", &mut hashes, false).unwrap();
        assert!(matches!(result, WriteResult::Unchanged { .. }));
        let mtime_2 = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(mtime_1, mtime_2, "mtime changed; file was rewritten");
    }

    #[test]
    fn changed_content_returns_written() {
        let tmp = TempDir::new().unwrap();
        let mut hashes = HashStore::new();
        write_artifact(tmp.path(), &slug("a"), "v1", &mut hashes, false).unwrap();
        let result = write_artifact(tmp.path(), &slug("a"), "v2", &mut hashes, false).unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::read_to_string(result.path()).unwrap(), "v2");
    }

    #[test]
    fn deleted_artifact_is_rewritten_despite_stored_hash() {
        let tmp = TempDir::new().unwrap();
        let mut hashes = HashStore::new();
        let first = write_artifact(tmp.path(), &slug("a"), "v1", &mut hashes, false).unwrap();
        fs::remove_file(first.path()).unwrap();

        let again = write_artifact(tmp.path(), &slug("a"), "v1", &mut hashes, false).unwrap();
        assert!(matches!(again, WriteResult::Written { .. }));
        assert!(again.path().exists());
    }

    #[test]
    fn dry_run_does_not_write_file() {
        let tmp = TempDir::new().unwrap();
        let mut hashes = HashStore::new();
        let result = write_artifact(tmp.path(), &slug("nope"), "x", &mut hashes, true).unwrap();
        assert!(matches!(result, WriteResult::WouldWrite { .. }));
        assert!(!result.path().exists(), "dry-run must not create files");
        assert!(hashes.is_empty());
    }

    #[test]
    fn tmp_file_removed_after_write_and_dirs_created() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("public").join("articles");
        let mut hashes = HashStore::new();
        let result = write_artifact(&dir, &slug("clean"), "data", &mut hashes, false).unwrap();
        assert!(result.path().exists());
        assert!(!tmp_path_for(result.path()).exists(), ".prerender.tmp must be cleaned up");
    }

    #[test]
    fn crlf_and_lf_content_share_the_same_hash() {
        let tmp = TempDir::new().unwrap();
        let mut hashes = HashStore::new();

        let first =
            write_artifact(tmp.path(), &slug("n"), "line1\r\nline2\r\n", &mut hashes, false).unwrap();
        assert!(matches!(first, WriteResult::Written { .. }));

        let second = write_artifact(tmp.path(), &slug("n"), "line1\nline2\n", &mut hashes, false).unwrap();
        assert!(matches!(second, WriteResult::Unchanged { .. }));
        assert_eq!(fs::read_to_string(second.path()).unwrap(), "line1\nline2\n");
    }

    #[test]
    fn sitemap_replaces_previous_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("public").join("sitemap.xml");

        let first = write_sitemap(&path, "<urlset/>", false).unwrap();
        assert!(matches!(first, WriteResult::Written { .. }));
        let same = write_sitemap(&path, "<urlset/>", false).unwrap();
        assert!(matches!(same, WriteResult::Unchanged { .. }));
        let next = write_sitemap(&path, "<urlset></urlset>", false).unwrap();
        assert!(matches!(next, WriteResult::Written { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<urlset></urlset>");

        let dry = write_sitemap(&path, "<other/>", true).unwrap();
        assert!(matches!(dry, WriteResult::WouldWrite { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<urlset></urlset>");
    }

    #[test]
    #[cfg(unix)]
    fn rename_failure_leaves_original_and_cleans_tmp() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let readonly_dir = root.path().join("readonly");
        fs::create_dir_all(&readonly_dir).unwrap();

        let path = readonly_dir.join("sitemap.xml");
        fs::write(&path, "original").unwrap();

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        let tmp_dir = TempDir::new().unwrap();
        let tmp_path = tmp_dir.path().join("sitemap.xml.prerender.tmp");

        let result = atomic_write_with_tmp(&path, "new content", &tmp_path);

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        // Root ignores directory permissions; only assert when the rename failed.
        if result.is_err() {
            assert_eq!(fs::read_to_string(&path).unwrap(), "original");
            assert!(!tmp_path.exists(), ".prerender.tmp should be cleaned up");
        }
    }
}
