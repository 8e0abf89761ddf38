use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// One generated packet as remembered by the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    pub id: String,
    pub topic: String,
    pub subtopics: Vec<String>,
    pub grade_level: String,
    pub problem_count: usize,
    pub file_path: PathBuf,
    pub public: bool,
    pub created_at: DateTime<Utc>,
}

impl PacketRecord {
    pub fn new(
        topic: impl Into<String>,
        subtopics: Vec<String>,
        grade_level: impl Into<String>,
        problem_count: usize,
        file_path: impl Into<PathBuf>,
        public: bool,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            topic: topic.into(),
            subtopics,
            grade_level: grade_level.into(),
            problem_count,
            file_path: file_path.into(),
            public,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait PacketLibrary: Send + Sync {
    async fn record(&self, record: &PacketRecord) -> anyhow::Result<()>;
    async fn get(&self, id: &str) -> anyhow::Result<Option<PacketRecord>>;
    /// Newest first.
    async fn list(&self) -> anyhow::Result<Vec<PacketRecord>>;
    async fn list_public(&self) -> anyhow::Result<Vec<PacketRecord>>;
    async fn set_visibility(&self, id: &str, public: bool) -> anyhow::Result<Option<PacketRecord>>;
}

#[derive(Debug, Clone)]
pub struct LocalFsPacketLibrary {
    base_dir: PathBuf,
}

impl LocalFsPacketLibrary {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn records_dir(&self) -> PathBuf {
        self.base_dir.join("records")
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.records_dir().join(format!("{id}.json"))
    }
}

#[async_trait]
impl PacketLibrary for LocalFsPacketLibrary {
    async fn record(&self, record: &PacketRecord) -> anyhow::Result<()> {
        write_json_atomic(&self.record_path(&record.id), record)
            .await
            .with_context(|| format!("write record: {}", record.id))
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<PacketRecord>> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        let path = self.record_path(id);
        read_json(&path)
            .await
            .with_context(|| format!("read: {}", path.display()))
    }

    async fn list(&self) -> anyhow::Result<Vec<PacketRecord>> {
        let dir = self.records_dir();
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("read dir: {}", dir.display()));
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match read_json::<PacketRecord>(&path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(err) => tracing::warn!(path = %path.display(), ?err, "skipping unreadable record"),
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn list_public(&self) -> anyhow::Result<Vec<PacketRecord>> {
        let mut records = self.list().await?;
        records.retain(|record| record.public);
        Ok(records)
    }

    async fn set_visibility(&self, id: &str, public: bool) -> anyhow::Result<Option<PacketRecord>> {
        let Some(mut record) = self.get(id).await? else {
            return Ok(None);
        };
        record.public = public;
        self.record(&record).await?;
        tracing::info!(id, public, "packet visibility updated");
        Ok(Some(record))
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let value = serde_json::from_slice(&bytes).context("parse json")?;
    Ok(Some(value))
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .await
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).context("serialize json")?;
    fs::write(&tmp_path, &data)
        .await
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}
