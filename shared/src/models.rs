use serde::{Serialize, Deserialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Products open for voting, in registration order. The derived `Ord`
/// follows declaration order and is what breaks ties in the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductId {
    Handle,
    SiliconeBottom,
    CupSleeve,
    BabyBottle,
}

impl ProductId {
    pub const ALL: [ProductId; 4] = [
        ProductId::Handle,
        ProductId::SiliconeBottom,
        ProductId::CupSleeve,
        ProductId::BabyBottle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductId::Handle => "handle",
            ProductId::SiliconeBottom => "siliconeBottom",
            ProductId::CupSleeve => "cupSleeve",
            ProductId::BabyBottle => "babyBottle",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProductId::Handle => "DAMP Handle v1.0",
            ProductId::SiliconeBottom => "Silicone Bottom v1.0",
            ProductId::CupSleeve => "Cup Sleeve v1.0",
            ProductId::BabyBottle => "Baby Bottle v1.0",
        }
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductId {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductId::ALL
            .into_iter()
            .find(|product| product.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Public,
    Authenticated,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Public => "public",
            VoteType::Authenticated => "authenticated",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(VoteType::Public),
            "authenticated" => Ok(VoteType::Authenticated),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown value: {0}")]
pub struct UnknownVariant(pub String);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub product_id: ProductId,
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(alias = "type")]
    pub vote_type: VoteType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductTally {
    pub votes: u64,
    pub name: String,
}

impl ProductTally {
    pub fn empty(product: ProductId) -> Self {
        Self {
            votes: 0,
            name: product.display_name().to_string(),
        }
    }
}

/// The persisted voting document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VotingData {
    pub products: BTreeMap<ProductId, ProductTally>,
    pub votes: BTreeMap<String, VoteRecord>,
    pub total_votes: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteStats {
    pub product_votes: u64,
    pub total_votes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded { vote: VoteRecord, stats: VoteStats },
    AlreadyVoted { existing_vote: VoteRecord },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductResult {
    pub id: ProductId,
    pub name: String,
    pub votes: u64,
    pub percentage: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VotingResults {
    pub results: Vec<ProductResult>,
    pub total_votes: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

/// Fields stay untyped JSON so a value of the wrong type is reported as the
/// matching validation error rather than a body parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteRequest {
    pub product_id: Option<Value>,
    pub fingerprint: Option<Value>,
    pub user_id: Option<Value>,
    pub vote_type: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatusRequest {
    pub fingerprint: Option<Value>,
    pub user_id: Option<Value>,
    pub vote_type: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteResponse {
    pub success: bool,
    pub message: String,
    pub vote: VoteRecord,
    pub stats: VoteStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatusResponse {
    pub success: bool,
    pub has_voted: bool,
    pub vote: Option<VoteRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingResultsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub results: VotingResults,
}
