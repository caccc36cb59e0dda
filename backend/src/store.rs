use shared::models::*;
use time::OffsetDateTime;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Voting document is unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Inconsistent store state: {0}")]
    Inconsistent(String),
}

/// One vote per voter, with per-product tallies. Implementations must make
/// `record_vote` all-or-nothing: the record, its tally and the total commit
/// together or not at all.
#[rocket::async_trait]
pub trait VoteStore: Send + Sync {
    async fn get_vote(&self, voter_id: &str) -> Result<Option<VoteRecord>, StoreError>;

    async fn has_voted(&self, voter_id: &str) -> Result<bool, StoreError> {
        Ok(self.get_vote(voter_id).await?.is_some())
    }

    async fn record_vote(
        &self,
        voter_id: &str,
        product: ProductId,
        vote_type: VoteType,
        user_agent: Option<String>,
    ) -> Result<RecordOutcome, StoreError>;

    async fn get_results(&self) -> Result<VotingResults, StoreError>;
}

/// In-process store. The mutex is held for the whole read-modify-write, so
/// concurrent votes never lose updates.
pub struct MemoryStore {
    data: Mutex<VotingData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_data(VotingData::new(OffsetDateTime::now_utc()))
    }

    pub fn with_data(data: VotingData) -> Self {
        Self { data: Mutex::new(data) }
    }

    pub async fn snapshot(&self) -> VotingData {
        self.data.lock().await.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[rocket::async_trait]
impl VoteStore for MemoryStore {
    async fn get_vote(&self, voter_id: &str) -> Result<Option<VoteRecord>, StoreError> {
        Ok(self.data.lock().await.get_vote(voter_id).cloned())
    }

    async fn record_vote(
        &self,
        voter_id: &str,
        product: ProductId,
        vote_type: VoteType,
        user_agent: Option<String>,
    ) -> Result<RecordOutcome, StoreError> {
        let mut data = self.data.lock().await;
        Ok(data.record(voter_id, product, vote_type, user_agent, OffsetDateTime::now_utc()))
    }

    async fn get_results(&self) -> Result<VotingResults, StoreError> {
        Ok(self.data.lock().await.results())
    }
}
