//! Purchase ledger and the completion workflow.
//!
//! The completion workflow re-runs the same predicate construction as live
//! browsing against the stored filter specification, then freezes the result
//! into the purchase row. The freeze is a single conditional UPDATE so two
//! racing completion calls can never both populate the snapshot.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{AppError, ResultExt};
use crate::filters;
use crate::models::{
    payment_status, purchase_status, CompletionData, FilterSpec, Purchase, PurchaseSummary,
};

/// True once the snapshot has been populated; a frozen purchase is immutable.
pub fn snapshot_is_frozen(purchase: &Purchase) -> bool {
    purchase
        .data_snapshot
        .as_array()
        .map(|items| !items.is_empty())
        .unwrap_or(false)
}

/// Database access for the purchase ledger.
pub struct PurchaseLedger {
    pool: PgPool,
}

impl PurchaseLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new pending purchase carrying the filter spec verbatim.
    pub async fn create_pending(
        &self,
        user_id: Uuid,
        quantity: i32,
        price_per_unit: bigdecimal::BigDecimal,
        total_amount: bigdecimal::BigDecimal,
        filter_criteria: &FilterSpec,
        provider_order_id: &str,
    ) -> Result<Purchase, AppError> {
        let purchase = sqlx::query_as::<_, Purchase>(
            r#"
            INSERT INTO purchases
                (user_id, quantity, price_per_unit, total_amount,
                 filter_criteria, provider_order_id, payment_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(quantity)
        .bind(price_per_unit)
        .bind(total_amount)
        .bind(Json(filter_criteria.clone()))
        .bind(provider_order_id)
        .bind(payment_status::PENDING)
        .fetch_one(&self.pool)
        .await
        .context("creating pending purchase")?;

        Ok(purchase)
    }

    /// Load a purchase by id.
    pub async fn get(&self, id: Uuid) -> Result<Purchase, AppError> {
        sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Purchase {} not found", id)))
    }

    /// Load a purchase and enforce ownership in one step.
    pub async fn get_owned(&self, id: Uuid, caller: &AuthUser) -> Result<Purchase, AppError> {
        let purchase = self.get(id).await?;
        caller.require_owner(purchase.user_id, &format!("purchase {}", id))?;
        Ok(purchase)
    }

    /// Record a verified payment: store provider identifiers, flip to completed.
    pub async fn mark_payment_completed(
        &self,
        id: Uuid,
        payment_id: &str,
        signature: &str,
    ) -> Result<Purchase, AppError> {
        sqlx::query_as::<_, Purchase>(
            r#"
            UPDATE purchases
            SET provider_payment_id = $2,
                provider_signature = $3,
                payment_status = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payment_id)
        .bind(signature)
        .bind(payment_status::COMPLETED)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Purchase {} not found", id)))
    }

    /// Record a failed verification. Missing purchases are ignored here; the
    /// caller already reports a generic verification failure.
    pub async fn mark_payment_failed(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE purchases SET payment_status = $2 WHERE id = $1")
            .bind(id)
            .bind(payment_status::FAILED)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Atomic snapshot freeze: populate the snapshot, the matched record ids
    /// and the active status only while the snapshot is still empty.
    ///
    /// Returns false when the condition did not hold, i.e. a concurrent
    /// completion already won.
    pub async fn freeze_snapshot(
        &self,
        id: Uuid,
        snapshot: &serde_json::Value,
        record_ids: &[Uuid],
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE purchases
            SET data_snapshot = $2,
                purchased_record_ids = $3,
                status = $4
            WHERE id = $1
              AND jsonb_array_length(data_snapshot) = 0
            "#,
        )
        .bind(id)
        .bind(snapshot)
        .bind(record_ids)
        .bind(purchase_status::ACTIVE)
        .execute(&self.pool)
        .await
        .context("freezing purchase snapshot")?;

        Ok(result.rows_affected() == 1)
    }

    /// The caller's completed purchases, newest first, snapshots omitted.
    pub async fn list_completed_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PurchaseSummary>, AppError> {
        let purchases = sqlx::query_as::<_, PurchaseSummary>(
            r#"
            SELECT id, user_id, quantity, price_per_unit, total_amount,
                   filter_criteria, payment_status, provider_order_id,
                   status, purchase_date
            FROM purchases
            WHERE user_id = $1 AND payment_status = $2
            ORDER BY purchase_date DESC
            "#,
        )
        .bind(user_id)
        .bind(payment_status::COMPLETED)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }
}

/// Complete a paid purchase by freezing its snapshot, exactly once.
///
/// Guarded preconditions, in order: purchase exists, caller owns it, payment
/// is completed, snapshot not yet frozen, at least one record matches.
/// Under-fill (fewer matches than the requested quantity) completes without
/// adjusting the charged amount.
pub async fn complete_purchase(
    pool: &PgPool,
    purchase_id: Uuid,
    caller: &AuthUser,
) -> Result<CompletionData, AppError> {
    let ledger = PurchaseLedger::new(pool.clone());
    let purchase = ledger.get_owned(purchase_id, caller).await?;

    if purchase.payment_status != payment_status::COMPLETED {
        return Err(AppError::BadRequest("Payment not completed".to_string()));
    }
    if snapshot_is_frozen(&purchase) {
        return Err(AppError::Conflict(
            "Purchase already completed".to_string(),
        ));
    }

    // Same predicates and ordering as live browsing: the snapshot is the top
    // N most recent matches at completion time.
    let records = filters::fetch_matching(
        pool,
        &purchase.filter_criteria.0,
        purchase.quantity as i64,
        0,
    )
    .await?;

    if records.is_empty() {
        return Err(AppError::NotFound(
            "No data found matching criteria".to_string(),
        ));
    }

    let record_ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
    let snapshot = serde_json::to_value(&records)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize snapshot: {}", e)))?;

    let frozen = ledger
        .freeze_snapshot(purchase_id, &snapshot, &record_ids)
        .await?;
    if !frozen {
        // A concurrent completion populated the snapshot between our read and
        // the conditional update.
        return Err(AppError::Conflict(
            "Purchase already completed".to_string(),
        ));
    }

    tracing::info!(
        "Purchase {} completed: froze {} of {} requested records",
        purchase_id,
        records.len(),
        purchase.quantity
    );

    Ok(CompletionData {
        purchase_id,
        quantity: records.len(),
        purchase_date: purchase.purchase_date,
    })
}

/// The frozen snapshot for a paid purchase, ownership- and status-gated.
pub async fn purchased_data(
    pool: &PgPool,
    purchase_id: Uuid,
    caller: &AuthUser,
) -> Result<Purchase, AppError> {
    let ledger = PurchaseLedger::new(pool.clone());
    let purchase = ledger.get_owned(purchase_id, caller).await?;

    if purchase.payment_status != payment_status::COMPLETED {
        return Err(AppError::BadRequest("Payment not completed".to_string()));
    }

    Ok(purchase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use serde_json::json;
    use std::str::FromStr;

    fn pending_purchase() -> Purchase {
        Purchase {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            quantity: 3,
            price_per_unit: BigDecimal::from_str("0.50").unwrap(),
            total_amount: BigDecimal::from_str("1.50").unwrap(),
            filter_criteria: Json(FilterSpec::default()),
            payment_status: payment_status::PENDING.to_string(),
            provider_order_id: Some("order_1".to_string()),
            provider_payment_id: None,
            provider_signature: None,
            purchased_record_ids: vec![],
            data_snapshot: json!([]),
            status: purchase_status::ACTIVE.to_string(),
            purchase_date: Utc::now(),
        }
    }

    #[test]
    fn empty_snapshot_is_not_frozen() {
        let purchase = pending_purchase();
        assert!(!snapshot_is_frozen(&purchase));
    }

    #[test]
    fn populated_snapshot_is_frozen() {
        let mut purchase = pending_purchase();
        purchase.data_snapshot = json!([{"name": "Acme"}]);
        assert!(snapshot_is_frozen(&purchase));
    }

    #[test]
    fn non_array_snapshot_is_not_frozen() {
        let mut purchase = pending_purchase();
        purchase.data_snapshot = json!(null);
        assert!(!snapshot_is_frozen(&purchase));
    }
}
