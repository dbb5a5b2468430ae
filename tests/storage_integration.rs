use std::env;
use uuid::Uuid;

use rust_datamart_api::auth::AuthUser;
use rust_datamart_api::db::Database;
use rust_datamart_api::errors::AppError;
use rust_datamart_api::filters;
use rust_datamart_api::models::{Address, FilterSpec, RecordPayload};
use rust_datamart_api::payment_gateway::{order_amounts, price_per_unit};
use rust_datamart_api::purchases::{self, PurchaseLedger};
use rust_datamart_api::record_store::RecordStore;

fn pune_record(category_marker: &str) -> RecordPayload {
    RecordPayload {
        name: "Acme Tools Pune".to_string(),
        record_type: "company".to_string(),
        email: "contact@acme.example".to_string(),
        phone: "+911234567890".to_string(),
        alternate_phone: None,
        website: None,
        fax: None,
        address: Some(Address {
            street: Some("12 MG Road".to_string()),
            city: Some("Pune".to_string()),
            state: Some("Maharashtra".to_string()),
            country: Some("India".to_string()),
            pincode: None,
            landmark: None,
        }),
        category: Some(category_marker.to_string()),
        sub_category: None,
        industry: Some("Tooling".to_string()),
        established_year: Some(2001),
        employee_count: Some("11-50".to_string()),
        revenue: None,
        annual_turnover: None,
        gst_number: None,
        pan_number: None,
        cin_number: None,
        company_type: None,
        description: Some("Industrial tooling supplier".to_string()),
        services: None,
        products: None,
        certifications: None,
        awards: None,
        social_media: None,
        people: None,
        metadata: None,
        is_active: None,
    }
}

fn database_url() -> anyhow::Result<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))
}

/// Batch upload is all-or-nothing: a valid batch lands completely, and a
/// batch with one bad item writes nothing.
#[tokio::test]
#[ignore]
async fn batch_upload_commits_all_rows_together() -> anyhow::Result<()> {
    let db = Database::new(&database_url()?).await?;
    let store = RecordStore::new(db.pool.clone());
    let marker = format!("itest-batch-{}", Uuid::new_v4());
    let admin_id = Uuid::new_v4();

    let created = store
        .insert_many(vec![pune_record(&marker), pune_record(&marker)], admin_id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(created.len(), 2);

    let spec = FilterSpec {
        category: Some(marker.clone()),
        ..Default::default()
    };
    let count = filters::count_matching(&db.pool, &spec)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(count, 2);

    // One bad item rejects the whole batch before anything is written.
    let mut bad = pune_record(&marker);
    bad.record_type = "conglomerate".to_string();
    let err = store
        .insert_many(vec![pune_record(&marker), bad], admin_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let count = filters::count_matching(&db.pool, &spec)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(count, 2);

    Ok(())
}

/// End-to-end smoke test for the filter-to-purchase pipeline against a real
/// database. Marked ignored to avoid running against production by accident;
/// set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn filter_purchase_snapshot_smoke_test() -> anyhow::Result<()> {
    let db = Database::new(&database_url()?).await?;
    let pool = db.pool.clone();
    let store = RecordStore::new(pool.clone());
    let ledger = PurchaseLedger::new(pool.clone());

    // Unique category so repeated runs do not see each other's rows.
    let marker = format!("itest-{}", Uuid::new_v4());
    let admin_id = Uuid::new_v4();
    let record = store.insert(pune_record(&marker), admin_id).await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    // Case-insensitive filter hit: lowercase city, uppercase-created record.
    let spec = FilterSpec {
        city: Some("pune".to_string()),
        employee_count: Some("11-50".to_string()),
        category: Some(marker.to_uppercase()),
        ..Default::default()
    };

    let total = filters::count_matching(&pool, &spec).await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(total, 1);

    let page = filters::fetch_matching(&pool, &spec, 10, 0).await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(page.len(), 1);
    assert_eq!(filters::blur(&page[0]).location, "Pune, Maharashtra");

    // Order for quantity 1 at the fixed unit price.
    let owner = AuthUser {
        user_id: Uuid::new_v4(),
        role: "user".to_string(),
    };
    let (total_amount, amount_minor) = order_amounts(1).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(amount_minor, 50);

    let purchase = ledger
        .create_pending(
            owner.user_id,
            1,
            price_per_unit(),
            total_amount,
            &spec,
            "order_itest",
        )
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    // Completion before payment verification is rejected.
    let err = purchases::complete_purchase(&pool, purchase.id, &owner)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    ledger
        .mark_payment_completed(purchase.id, "pay_itest", "sig_itest")
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    // A non-owner cannot complete, read, or fetch purchased data.
    let stranger = AuthUser {
        user_id: Uuid::new_v4(),
        role: "user".to_string(),
    };
    let err = purchases::complete_purchase(&pool, purchase.id, &stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = ledger.get_owned(purchase.id, &stranger).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = purchases::purchased_data(&pool, purchase.id, &stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // First completion freezes exactly one record.
    let completion = purchases::complete_purchase(&pool, purchase.id, &owner)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(completion.quantity, 1);

    // Second completion is a conflict and must not touch the snapshot.
    let err = purchases::complete_purchase(&pool, purchase.id, &owner)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Mutating the underlying record does not alter the frozen snapshot.
    let mut updated = pune_record(&marker);
    updated.name = "Renamed After Purchase".to_string();
    store.update(record.id, updated).await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let frozen = purchases::purchased_data(&pool, purchase.id, &owner)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let snapshot = frozen.data_snapshot.as_array().cloned().unwrap_or_default();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(
        snapshot[0].get("name").and_then(|v| v.as_str()),
        Some("Acme Tools Pune")
    );
    assert_eq!(frozen.purchased_record_ids, vec![record.id]);

    // Deleting the record leaves the snapshot intact too.
    store.delete(record.id).await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let frozen = purchases::purchased_data(&pool, purchase.id, &owner)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(
        frozen.data_snapshot.as_array().map(|a| a.len()),
        Some(1)
    );

    Ok(())
}
