use std::io::ErrorKind;
use std::path::PathBuf;
use shared::models::*;
use time::OffsetDateTime;
use tokio::{fs, sync::Mutex};
use tracing::{debug, error, info};
use uuid::Uuid;
use crate::store::{StoreError, VoteStore};

pub const DEFAULT_DATA_FILE: &str = "/tmp/damp-voting-data.json";

/// Keeps the whole voting document in one JSON file.
///
/// Every operation holds `lock` from load to save, which serializes writers
/// inside this process. Separate processes sharing the file are not
/// coordinated.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Reads the document, writing a fresh one first when the file is absent.
    /// A document whose totals disagree with its tallies or voters is refused.
    /// Callers must hold `lock`.
    async fn load(&self) -> Result<VotingData, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("📝 Creating new voting data file at {}", self.path.display());
                let data = VotingData::new(OffsetDateTime::now_utc());
                self.save(&data).await?;
                return Ok(data);
            }
            Err(e) => return Err(e.into()),
        };

        let mut data: VotingData = serde_json::from_str(&raw)?;
        data.ensure_catalog();
        if let Err(e) = data.check_consistency() {
            error!("Voting data at {} is inconsistent: {}", self.path.display(), e);
            return Err(StoreError::Inconsistent(e.to_string()));
        }
        Ok(data)
    }

    /// Writes to a sibling temp file and renames it into place so readers
    /// never observe a partial document.
    async fn save(&self, data: &VotingData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let body = serde_json::to_vec_pretty(data)?;
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "voting-data.json".into());
        let tmp = self.path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        fs::write(&tmp, body).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!("Saved voting data to {}", self.path.display());
        Ok(())
    }
}

#[rocket::async_trait]
impl VoteStore for JsonFileStore {
    async fn get_vote(&self, voter_id: &str) -> Result<Option<VoteRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let data = self.load().await?;
        Ok(data.get_vote(voter_id).cloned())
    }

    async fn record_vote(
        &self,
        voter_id: &str,
        product: ProductId,
        vote_type: VoteType,
        user_agent: Option<String>,
    ) -> Result<RecordOutcome, StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        let outcome = data.record(voter_id, product, vote_type, user_agent, OffsetDateTime::now_utc());
        if let RecordOutcome::Recorded { .. } = outcome {
            self.save(&data).await?;
        }
        Ok(outcome)
    }

    async fn get_results(&self) -> Result<VotingResults, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.results())
    }
}
