use shared::models::*;
use shared::tally::epoch_millis;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::warn;
use crate::store::{StoreError, VoteStore};

type VoteRow = (String, String, Option<String>, i64);

/// Postgres-backed store. The voter's row is claimed with
/// `ON CONFLICT DO NOTHING` and the tally is bumped in place, inside one
/// transaction, so concurrent submissions cannot double count.
pub struct PgVoteStore {
    pool: PgPool,
}

impl PgVoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_row((product_id, vote_type, user_agent, cast_at_ms): VoteRow) -> Result<VoteRecord, StoreError> {
        Ok(VoteRecord {
            product_id: product_id
                .parse()
                .map_err(|e| StoreError::Inconsistent(format!("{e} in votes.product_id")))?,
            timestamp: cast_at_ms,
            vote_type: vote_type
                .parse()
                .map_err(|e| StoreError::Inconsistent(format!("{e} in votes.vote_type")))?,
            user_agent,
        })
    }
}

#[rocket::async_trait]
impl VoteStore for PgVoteStore {
    async fn get_vote(&self, voter_id: &str) -> Result<Option<VoteRecord>, StoreError> {
        let row = sqlx::query_as::<_, VoteRow>(
            "SELECT product_id, vote_type, user_agent, cast_at_ms
             FROM voting.votes WHERE voter_id = $1",
        )
        .bind(voter_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::parse_row).transpose()
    }

    async fn record_vote(
        &self,
        voter_id: &str,
        product: ProductId,
        vote_type: VoteType,
        user_agent: Option<String>,
    ) -> Result<RecordOutcome, StoreError> {
        let cast_at = epoch_millis(OffsetDateTime::now_utc());
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO voting.votes (voter_id, product_id, vote_type, user_agent, cast_at_ms)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (voter_id) DO NOTHING",
        )
        .bind(voter_id)
        .bind(product.as_str())
        .bind(vote_type.as_str())
        .bind(user_agent.as_deref())
        .bind(cast_at)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            let existing_vote = self.get_vote(voter_id).await?.ok_or_else(|| {
                StoreError::Inconsistent(format!("vote for {voter_id} conflicted but is missing"))
            })?;
            return Ok(RecordOutcome::AlreadyVoted { existing_vote });
        }

        let product_votes: i64 = sqlx::query_scalar(
            "UPDATE voting.product_tallies SET votes = votes + 1
             WHERE product_id = $1 RETURNING votes",
        )
        .bind(product.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let total_votes: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(votes), 0)::BIGINT FROM voting.product_tallies",
        )
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE voting.meta SET last_updated = NOW()")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(RecordOutcome::Recorded {
            vote: VoteRecord {
                product_id: product,
                timestamp: cast_at,
                vote_type,
                user_agent,
            },
            stats: VoteStats {
                product_votes: product_votes.max(0) as u64,
                total_votes: total_votes.max(0) as u64,
            },
        })
    }

    async fn get_results(&self) -> Result<VotingResults, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT product_id, votes FROM voting.product_tallies ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;

        let last_updated: OffsetDateTime =
            sqlx::query_scalar("SELECT last_updated FROM voting.meta WHERE singleton")
                .fetch_one(&self.pool)
                .await?;

        let tallies = rows.into_iter().filter_map(|(id, votes)| match id.parse::<ProductId>() {
            Ok(product) => Some((product, votes.max(0) as u64)),
            Err(_) => {
                warn!("Ignoring tally for unregistered product {}", id);
                None
            }
        });

        Ok(VotingResults::from_tallies(tallies, last_updated))
    }
}
