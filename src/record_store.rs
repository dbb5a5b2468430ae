//! Record store: admin-only persistence of business records.
//!
//! Validation happens before any row is written; enum domains and the email
//! shape are checked per payload so a bad item in a batch rejects the batch.

use regex::Regex;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Record, RecordPayload, EMPLOYEE_COUNTS, RECORD_TYPES};

/// Validate email address shape.
///
/// RFC 5322 simplified; matches local@domain.tld with a minimum length.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    let email_regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    email_regex.is_match(email)
}

/// Reject payloads with missing required fields or out-of-domain enums
/// before anything touches the database.
pub fn validate_payload(payload: &RecordPayload) -> Result<(), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if !RECORD_TYPES.contains(&payload.record_type.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Invalid type '{}', expected one of: {}",
            payload.record_type,
            RECORD_TYPES.join(", ")
        )));
    }
    if payload.phone.trim().is_empty() {
        return Err(AppError::BadRequest("Phone is required".to_string()));
    }
    if !is_valid_email(payload.email.trim()) {
        return Err(AppError::BadRequest(format!(
            "Invalid email: {}",
            payload.email
        )));
    }
    if let Some(employee_count) = &payload.employee_count {
        if !EMPLOYEE_COUNTS.contains(&employee_count.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Invalid employeeCount '{}', expected one of: {}",
                employee_count,
                EMPLOYEE_COUNTS.join(", ")
            )));
        }
    }
    Ok(())
}

/// Database access for business records.
pub struct RecordStore {
    pool: PgPool,
}

impl RecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one validated payload and return the created row.
    pub async fn insert(
        &self,
        payload: RecordPayload,
        uploaded_by: Uuid,
    ) -> Result<Record, AppError> {
        validate_payload(&payload)?;
        insert_row(&self.pool, payload, uploaded_by).await
    }

    /// Insert a batch of payloads atomically: every payload is validated
    /// before any insert runs, and the inserts share one transaction so a
    /// mid-batch failure leaves nothing behind.
    pub async fn insert_many(
        &self,
        payloads: Vec<RecordPayload>,
        uploaded_by: Uuid,
    ) -> Result<Vec<Record>, AppError> {
        if payloads.is_empty() {
            return Err(AppError::BadRequest(
                "Upload body contains no records".to_string(),
            ));
        }
        for payload in &payloads {
            validate_payload(payload)?;
        }

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(payloads.len());
        for payload in payloads {
            created.push(insert_row(&mut *tx, payload, uploaded_by).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    /// Full record by id.
    pub async fn get(&self, id: Uuid) -> Result<Record, AppError> {
        sqlx::query_as::<_, Record>("SELECT * FROM records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Record {} not found", id)))
    }

    /// Replace the mutable fields of a record and bump updated_at.
    pub async fn update(&self, id: Uuid, payload: RecordPayload) -> Result<Record, AppError> {
        validate_payload(&payload)?;

        let record = sqlx::query_as::<_, Record>(
            r#"
            UPDATE records SET
                name = $2, record_type = $3, email = $4, phone = $5,
                alternate_phone = $6, website = $7, fax = $8, address = $9,
                category = $10, sub_category = $11, industry = $12,
                established_year = $13, employee_count = $14, revenue = $15,
                annual_turnover = $16, gst_number = $17, pan_number = $18,
                cin_number = $19, company_type = $20, description = $21,
                services = $22, products = $23, certifications = $24,
                awards = $25, social_media = $26, people = $27, metadata = $28,
                is_active = $29, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.trim())
        .bind(&payload.record_type)
        .bind(payload.email.trim().to_lowercase())
        .bind(payload.phone.trim())
        .bind(&payload.alternate_phone)
        .bind(&payload.website)
        .bind(&payload.fax)
        .bind(payload.address.map(Json))
        .bind(&payload.category)
        .bind(&payload.sub_category)
        .bind(&payload.industry)
        .bind(payload.established_year)
        .bind(&payload.employee_count)
        .bind(&payload.revenue)
        .bind(&payload.annual_turnover)
        .bind(&payload.gst_number)
        .bind(&payload.pan_number)
        .bind(&payload.cin_number)
        .bind(&payload.company_type)
        .bind(&payload.description)
        .bind(&payload.services)
        .bind(&payload.products)
        .bind(&payload.certifications)
        .bind(&payload.awards)
        .bind(payload.social_media.map(Json))
        .bind(payload.people.map(Json))
        .bind(payload.metadata.map(Json))
        .bind(payload.is_active.unwrap_or(true))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Record {} not found", id)))?;

        Ok(record)
    }

    /// Hard delete. Frozen purchase snapshots hold full copies and are
    /// unaffected.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Record {} not found", id)));
        }
        Ok(())
    }
}

/// The single-row insert, against either the pool or a batch transaction.
/// Payload must already be validated.
async fn insert_row<'e, E>(
    executor: E,
    payload: RecordPayload,
    uploaded_by: Uuid,
) -> Result<Record, AppError>
where
    E: PgExecutor<'e>,
{
    let record = sqlx::query_as::<_, Record>(
        r#"
        INSERT INTO records (
            name, record_type, email, phone, alternate_phone, website, fax,
            address, category, sub_category, industry, established_year,
            employee_count, revenue, annual_turnover, gst_number, pan_number,
            cin_number, company_type, description, services, products,
            certifications, awards, social_media, people, metadata,
            uploaded_by, is_active
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
            $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26,
            $27, $28, $29
        )
        RETURNING *
        "#,
    )
    .bind(payload.name.trim())
    .bind(&payload.record_type)
    .bind(payload.email.trim().to_lowercase())
    .bind(payload.phone.trim())
    .bind(&payload.alternate_phone)
    .bind(&payload.website)
    .bind(&payload.fax)
    .bind(payload.address.clone().map(Json))
    .bind(&payload.category)
    .bind(&payload.sub_category)
    .bind(&payload.industry)
    .bind(payload.established_year)
    .bind(&payload.employee_count)
    .bind(&payload.revenue)
    .bind(&payload.annual_turnover)
    .bind(&payload.gst_number)
    .bind(&payload.pan_number)
    .bind(&payload.cin_number)
    .bind(&payload.company_type)
    .bind(&payload.description)
    .bind(&payload.services)
    .bind(&payload.products)
    .bind(&payload.certifications)
    .bind(&payload.awards)
    .bind(payload.social_media.clone().map(Json))
    .bind(payload.people.clone().map(Json))
    .bind(payload.metadata.clone().map(Json))
    .bind(uploaded_by)
    .bind(payload.is_active.unwrap_or(true))
    .fetch_one(executor)
    .await?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> RecordPayload {
        RecordPayload {
            name: "Acme Tools".to_string(),
            record_type: "company".to_string(),
            email: "contact@acme.example".to_string(),
            phone: "+911234567890".to_string(),
            alternate_phone: None,
            website: None,
            fax: None,
            address: None,
            category: None,
            sub_category: None,
            industry: None,
            established_year: None,
            employee_count: Some("11-50".to_string()),
            revenue: None,
            annual_turnover: None,
            gst_number: None,
            pan_number: None,
            cin_number: None,
            company_type: None,
            description: None,
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

    #[test]
    fn accepts_valid_payload() {
        assert!(validate_payload(&valid_payload()).is_ok());
    }

    #[test]
    fn rejects_blank_required_fields() {
        let mut p = valid_payload();
        p.name = "   ".to_string();
        assert!(validate_payload(&p).is_err());

        let mut p = valid_payload();
        p.phone = String::new();
        assert!(validate_payload(&p).is_err());
    }

    #[test]
    fn rejects_out_of_domain_enums() {
        let mut p = valid_payload();
        p.record_type = "conglomerate".to_string();
        assert!(validate_payload(&p).is_err());

        let mut p = valid_payload();
        p.employee_count = Some("42".to_string());
        assert!(validate_payload(&p).is_err());
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user+tag@example.co.uk"));
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@examplecom"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }
}
