use std::path::PathBuf;

use uuid::Uuid;

use crate::models::PeriodEntry;

/// Best-effort local copy of one user's entry list.
///
/// One JSON file per user under a fixed directory, the same serialized
/// whole-list shape the web client keeps in browser storage. Reads happen
/// only when the remote fetch fails; writes are opportunistic after entry
/// changes and never fatal.
pub struct EntryCache {
    dir: PathBuf,
}

impl EntryCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        // User ids are normally alphanumeric; anything else is flattened so
        // a crafted id cannot point outside the cache directory.
        let safe: String = user_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("period_entries-{safe}.json"))
    }

    /// The cached list, or empty when nothing usable is on disk.
    pub async fn load(&self, user_id: &str) -> Vec<PeriodEntry> {
        let path = self.path_for(user_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("❌ Corrupt entry cache {}: {}", path.display(), e);
                Vec::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!("❌ Failed to read entry cache {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Replaces the cached list. Failures are logged and swallowed.
    pub async fn save(&self, user_id: &str, entries: &[PeriodEntry]) {
        if let Err(e) = self.try_save(user_id, entries).await {
            tracing::warn!("❌ Failed to write entry cache: {}", e);
        }
    }

    /// Atomic write: temp file in the same directory, then rename. The temp
    /// name is unique per call, so concurrent saves never share a temp file
    /// and whichever rename lands last installs a complete snapshot.
    async fn try_save(&self, user_id: &str, entries: &[PeriodEntry]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(user_id);
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let tmp_path = path.with_extension(format!("tmp.{}", Uuid::new_v4()));
        tokio::fs::write(&tmp_path, &json).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, start: &str) -> PeriodEntry {
        PeriodEntry {
            id: id.to_string(),
            user_id: "ana".to_string(),
            start_date: start.to_string(),
            end_date: None,
            symptoms: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn save_then_load_returns_the_same_list() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EntryCache::new(dir.path());

        let entries = vec![entry("a", "2024-01-01"), entry("b", "2024-01-29")];
        cache.save("ana", &entries).await;

        assert_eq!(cache.load("ana").await, entries);
    }

    #[tokio::test]
    async fn load_with_no_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EntryCache::new(dir.path());

        assert!(cache.load("ana").await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EntryCache::new(dir.path());

        cache.save("ana", &[entry("a", "2024-01-01")]).await;
        let path = dir.path().join("period_entries-ana.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        assert!(cache.load("ana").await.is_empty());
    }

    #[tokio::test]
    async fn users_do_not_share_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EntryCache::new(dir.path());

        cache.save("ana", &[entry("a", "2024-01-01")]).await;

        assert!(cache.load("bea").await.is_empty());
        assert_eq!(cache.load("ana").await.len(), 1);
    }

    #[tokio::test]
    async fn hostile_user_id_stays_inside_the_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EntryCache::new(dir.path());

        cache.save("../../etc/passwd", &[entry("a", "2024-01-01")]).await;

        let mut names = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(item) = read_dir.next_entry().await.unwrap() {
            names.push(item.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["period_entries-______etc_passwd.json"]);
    }

    #[tokio::test]
    async fn concurrent_saves_leave_one_complete_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EntryCache::new(dir.path());

        let shorter = vec![entry("a", "2024-01-01")];
        let longer = vec![entry("a", "2024-01-01"), entry("b", "2024-01-29")];
        tokio::join!(cache.save("ana", &shorter), cache.save("ana", &longer));

        // Either save may win, but the survivor parses whole and no temp
        // files are left behind.
        let loaded = cache.load("ana").await;
        assert!(loaded == shorter || loaded == longer);

        let mut names = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(item) = read_dir.next_entry().await.unwrap() {
            names.push(item.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["period_entries-ana.json"]);
    }
}
