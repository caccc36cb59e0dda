use crate::models::*;
use std::collections::BTreeMap;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TallyError {
    #[error("Total votes ({total}) does not match the sum of product tallies ({sum})")]
    TotalMismatch { total: u64, sum: u64 },
    #[error("Total votes ({total}) does not match the number of recorded voters ({voters})")]
    VoterMismatch { total: u64, voters: u64 },
}

/// Milliseconds since the Unix epoch.
pub fn epoch_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// `round(votes / total * 100)` with halves rounded up, 0 when nothing has
/// been cast yet.
pub fn percentage(votes: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (votes * 200 + total) / (total * 2)
}

impl VotingData {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            products: ProductId::ALL
                .into_iter()
                .map(|product| (product, ProductTally::empty(product)))
                .collect(),
            votes: BTreeMap::new(),
            total_votes: 0,
            last_updated: now,
        }
    }

    /// Adds any registered product missing from an older document.
    pub fn ensure_catalog(&mut self) {
        for product in ProductId::ALL {
            self.products
                .entry(product)
                .or_insert_with(|| ProductTally::empty(product));
        }
    }

    pub fn has_voted(&self, voter_id: &str) -> bool {
        self.votes.contains_key(voter_id)
    }

    pub fn get_vote(&self, voter_id: &str) -> Option<&VoteRecord> {
        self.votes.get(voter_id)
    }

    /// Records the first vote for `voter_id`. A later attempt by the same
    /// voter leaves the document untouched and hands back the stored record.
    pub fn record(
        &mut self,
        voter_id: &str,
        product: ProductId,
        vote_type: VoteType,
        user_agent: Option<String>,
        now: OffsetDateTime,
    ) -> RecordOutcome {
        if let Some(existing) = self.votes.get(voter_id) {
            return RecordOutcome::AlreadyVoted {
                existing_vote: existing.clone(),
            };
        }

        let vote = VoteRecord {
            product_id: product,
            timestamp: epoch_millis(now),
            vote_type,
            user_agent,
        };
        self.votes.insert(voter_id.to_string(), vote.clone());

        let tally = self
            .products
            .entry(product)
            .or_insert_with(|| ProductTally::empty(product));
        tally.votes += 1;
        let product_votes = tally.votes;

        self.total_votes += 1;
        self.last_updated = now;

        RecordOutcome::Recorded {
            vote,
            stats: VoteStats {
                product_votes,
                total_votes: self.total_votes,
            },
        }
    }

    pub fn results(&self) -> VotingResults {
        let tallies = self
            .products
            .iter()
            .map(|(product, tally)| (*product, tally.votes));
        VotingResults::from_tallies(tallies, self.last_updated)
    }

    pub fn check_consistency(&self) -> Result<(), TallyError> {
        let sum: u64 = self.products.values().map(|tally| tally.votes).sum();
        if sum != self.total_votes {
            return Err(TallyError::TotalMismatch { total: self.total_votes, sum });
        }
        let voters = self.votes.len() as u64;
        if voters != self.total_votes {
            return Err(TallyError::VoterMismatch { total: self.total_votes, voters });
        }
        Ok(())
    }
}

impl VotingResults {
    /// Builds the ranked results from per-product counts. Products that are
    /// not listed count as zero; the total is derived from the counts.
    pub fn from_tallies(
        tallies: impl IntoIterator<Item = (ProductId, u64)>,
        last_updated: OffsetDateTime,
    ) -> Self {
        let counts: BTreeMap<ProductId, u64> = tallies.into_iter().collect();
        let total_votes: u64 = counts.values().sum();

        let mut results: Vec<ProductResult> = ProductId::ALL
            .into_iter()
            .map(|product| {
                let votes = counts.get(&product).copied().unwrap_or(0);
                ProductResult {
                    id: product,
                    name: product.display_name().to_string(),
                    votes,
                    percentage: percentage(votes, total_votes),
                }
            })
            .collect();

        // stable: equal counts keep registration order
        results.sort_by(|a, b| b.votes.cmp(&a.votes));

        Self {
            results,
            total_votes,
            last_updated,
        }
    }
}
