use crate::auth::AuthUser;
use crate::config::Config;
use crate::errors::AppError;
use crate::filters;
use crate::models::*;
use crate::payment_gateway::{order_amounts, price_per_unit, PaymentGatewayClient, CURRENCY};
use crate::purchases::{self, PurchaseLedger};
use crate::record_store::RecordStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bigdecimal::ToPrimitive;
use moka::future::Cache;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Client for the external payment provider.
    pub payment_client: PaymentGatewayClient,
    /// Cache for the distinct-value enumeration (seven table scans per miss).
    pub filter_options_cache: Cache<String, FilterOptions>,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-datamart-api",
            "version": "0.1.0"
        })),
    )
}

// ============ Filter Evaluator Endpoints ============

/// POST /api/v1/data/filter
///
/// Blurred preview of active records matching the supplied filter
/// specification, newest first, with a pagination-independent total count.
pub async fn filter_data(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(req): Json<FilterDataRequest>,
) -> Result<Json<FilterDataResponse>, AppError> {
    let (page, limit) = filters::normalize_pagination(req.page, req.limit);
    tracing::info!(
        "POST /data/filter - page {} limit {} filters: {:?}",
        page,
        limit,
        req.filters
    );

    let total_count = filters::count_matching(&state.db, &req.filters).await?;
    let records =
        filters::fetch_matching(&state.db, &req.filters, limit, filters::page_offset(page, limit))
            .await?;
    let data: Vec<BlurredRecord> = records.iter().map(filters::blur).collect();

    Ok(Json(FilterDataResponse {
        success: true,
        count: data.len(),
        total_count,
        page,
        total_pages: filters::total_pages(total_count, limit),
        data,
    }))
}

/// GET /api/v1/data/filter-options
///
/// Distinct non-empty values per filterable field, cached briefly.
pub async fn filter_options(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<FilterOptionsResponse>, AppError> {
    if let Some(cached) = state.filter_options_cache.get("all").await {
        tracing::debug!("Filter options cache HIT");
        return Ok(Json(FilterOptionsResponse {
            success: true,
            data: cached,
        }));
    }

    let options = filters::filter_options(&state.db).await?;
    state
        .filter_options_cache
        .insert("all".to_string(), options.clone())
        .await;

    Ok(Json(FilterOptionsResponse {
        success: true,
        data: options,
    }))
}

// ============ Record Store Endpoints (admin) ============

/// POST /api/v1/data/upload
///
/// Admin-only upload of one record or an array of records.
pub async fn upload_records(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<UploadBody>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    user.require_admin()?;

    let payloads = body.into_vec();
    tracing::info!(
        "POST /data/upload - {} record(s) from admin {}",
        payloads.len(),
        user.user_id
    );

    let store = RecordStore::new(state.db.clone());
    let created = store.insert_many(payloads, user.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            success: true,
            count: created.len(),
            data: created,
        }),
    ))
}

/// GET /api/v1/data/all
///
/// Admin full mode: complete records, same ordering and pagination rules as
/// the preview, active records only.
pub async fn list_all_records(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<RecordPageResponse>, AppError> {
    user.require_admin()?;

    let (page, limit) =
        filters::normalize_pagination_with(params.page, params.limit, filters::DEFAULT_ADMIN_LIMIT);
    let spec = FilterSpec::default();
    let total_count = filters::count_matching(&state.db, &spec).await?;
    let data =
        filters::fetch_matching(&state.db, &spec, limit, filters::page_offset(page, limit)).await?;

    Ok(Json(RecordPageResponse {
        success: true,
        count: data.len(),
        total_count,
        page,
        total_pages: filters::total_pages(total_count, limit),
        data,
    }))
}

/// GET /api/v1/data/:id (admin - full details)
pub async fn get_record_by_id(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RecordResponse>, AppError> {
    user.require_admin()?;

    let record = RecordStore::new(state.db.clone()).get(id).await?;
    Ok(Json(RecordResponse {
        success: true,
        data: record,
    }))
}

/// PUT /api/v1/data/:id (admin)
pub async fn update_record(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordPayload>,
) -> Result<Json<RecordResponse>, AppError> {
    user.require_admin()?;

    let record = RecordStore::new(state.db.clone()).update(id, payload).await?;
    Ok(Json(RecordResponse {
        success: true,
        data: record,
    }))
}

/// DELETE /api/v1/data/:id (admin)
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require_admin()?;

    RecordStore::new(state.db.clone()).delete(id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Record deleted successfully",
    })))
}

// ============ Payment Gateway Endpoints ============

/// POST /api/v1/payment/create-order
///
/// Creates a provider order for `quantity` records and persists a pending
/// purchase carrying the filter specification verbatim.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    if req.quantity < 1 {
        return Err(AppError::BadRequest("Invalid quantity".to_string()));
    }

    let spec = req.filter_criteria.unwrap_or_default();
    let (total_amount, amount_minor) = order_amounts(req.quantity)?;

    let receipt = format!("receipt_{}", chrono::Utc::now().timestamp_millis());
    let notes = json!({
        "userId": user.user_id.to_string(),
        "quantity": req.quantity.to_string(),
    });

    // Provider first: if the provider is down no purchase row is created and
    // the caller gets a retryable error.
    let order = state
        .payment_client
        .create_order(amount_minor, &receipt, notes)
        .await?;

    let ledger = PurchaseLedger::new(state.db.clone());
    let purchase = ledger
        .create_pending(
            user.user_id,
            req.quantity,
            price_per_unit(),
            total_amount.clone(),
            &spec,
            &order.id,
        )
        .await?;

    tracing::info!(
        "Order {} created for user {} (purchase {}, {} records)",
        order.id,
        user.user_id,
        purchase.id,
        req.quantity
    );

    Ok(Json(CreateOrderResponse {
        success: true,
        data: OrderCreated {
            order_id: order.id,
            amount: total_amount.to_f64().unwrap_or_default(),
            currency: CURRENCY.to_string(),
            purchase_id: purchase.id,
        },
    }))
}

/// POST /api/v1/payment/verify
///
/// Recomputes the expected signature and accepts the payment only on an
/// exact match. A mismatch marks the purchase failed and returns a generic
/// failure with no detail.
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, AppError> {
    let ledger = PurchaseLedger::new(state.db.clone());

    let authentic =
        state
            .payment_client
            .verify_callback_signature(&req.order_id, &req.payment_id, &req.signature);

    if !authentic {
        tracing::warn!("Signature mismatch for purchase {}", req.purchase_id);
        ledger.mark_payment_failed(req.purchase_id).await?;
        return Err(AppError::BadRequest(
            "Payment verification failed".to_string(),
        ));
    }

    let purchase = ledger.get_owned(req.purchase_id, &user).await?;
    let updated = ledger
        .mark_payment_completed(purchase.id, &req.payment_id, &req.signature)
        .await?;

    tracing::info!("Payment verified for purchase {}", updated.id);

    Ok(Json(VerifyPaymentResponse {
        success: true,
        message: "Payment verified successfully".to_string(),
        data: Some(updated),
    }))
}

/// GET /api/v1/payment/key
///
/// The public key identifier for the client-side payment widget. The secret
/// never leaves the process.
pub async fn payment_key(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Json<PaymentKeyResponse> {
    Json(PaymentKeyResponse {
        success: true,
        key: state.payment_client.key_id().to_string(),
    })
}

// ============ Purchase Endpoints ============

/// POST /api/v1/purchase/complete/:id
///
/// Freezes the snapshot for a paid purchase, exactly once.
pub async fn complete_purchase(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CompletePurchaseResponse>, AppError> {
    let data = purchases::complete_purchase(&state.db, id, &user).await?;

    Ok(Json(CompletePurchaseResponse {
        success: true,
        message: "Purchase completed successfully".to_string(),
        data,
    }))
}

/// GET /api/v1/purchase/my-purchases
pub async fn my_purchases(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<PurchaseListResponse>, AppError> {
    let purchases = PurchaseLedger::new(state.db.clone())
        .list_completed_for_user(user.user_id)
        .await?;

    Ok(Json(PurchaseListResponse {
        success: true,
        count: purchases.len(),
        data: purchases,
    }))
}

/// GET /api/v1/purchase/:id
pub async fn get_purchase(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let purchase = PurchaseLedger::new(state.db.clone())
        .get_owned(id, &user)
        .await?;

    Ok(Json(PurchaseResponse {
        success: true,
        data: purchase,
    }))
}

/// GET /api/v1/purchase/:id/data
///
/// The frozen snapshot, gated on ownership and completed payment.
pub async fn get_purchased_data(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PurchasedDataResponse>, AppError> {
    let purchase = purchases::purchased_data(&state.db, id, &user).await?;

    let count = purchase
        .data_snapshot
        .as_array()
        .map(|items| items.len())
        .unwrap_or(0);

    Ok(Json(PurchasedDataResponse {
        success: true,
        count,
        purchase_date: purchase.purchase_date,
        data: purchase.data_snapshot,
    }))
}
