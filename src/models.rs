use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// ============ Enumerated Domains ============

/// Allowed values for `Record::record_type`.
pub const RECORD_TYPES: &[&str] = &[
    "company",
    "business",
    "industry",
    "shop",
    "startup",
    "organization",
    "other",
];

/// Allowed values for `Record::employee_count` (bucketed headcount).
pub const EMPLOYEE_COUNTS: &[&str] = &[
    "1-10", "11-50", "51-200", "201-500", "501-1000", "1000+", "unknown",
];

/// Payment lifecycle states for a purchase.
pub mod payment_status {
    pub const PENDING: &str = "pending";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
    pub const REFUNDED: &str = "refunded";
}

/// Purchase entry states (post-payment).
pub mod purchase_status {
    pub const ACTIVE: &str = "active";
    pub const EXPIRED: &str = "expired";
    pub const CANCELLED: &str = "cancelled";
}

// ============ Database Models ============

/// A business/organization record in the store.
///
/// The filterable attributes live in dedicated columns; open-ended parts
/// (address, social links, embedded people, arbitrary metadata) are JSONB.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier for the record.
    pub id: Uuid,
    /// Display name of the business.
    pub name: String,
    /// Entity type, one of `RECORD_TYPES`.
    #[serde(rename = "type")]
    pub record_type: String,
    /// Contact email (stored lowercased).
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Secondary phone.
    pub alternate_phone: Option<String>,
    /// Website URL.
    pub website: Option<String>,
    /// Fax number.
    pub fax: Option<String>,
    /// Nested address, partially populated.
    pub address: Option<Json<Address>>,
    /// Business category.
    pub category: Option<String>,
    /// Business sub-category.
    pub sub_category: Option<String>,
    /// Industry sector.
    pub industry: Option<String>,
    /// Year the business was established.
    pub established_year: Option<i32>,
    /// Headcount bucket, one of `EMPLOYEE_COUNTS`.
    pub employee_count: Option<String>,
    /// Revenue description.
    pub revenue: Option<String>,
    /// Annual turnover description.
    pub annual_turnover: Option<String>,
    /// GST registration number.
    pub gst_number: Option<String>,
    /// PAN number.
    pub pan_number: Option<String>,
    /// CIN number.
    pub cin_number: Option<String>,
    /// Legal company type.
    pub company_type: Option<String>,
    /// Free-form description (participates in text search).
    pub description: Option<String>,
    /// Services offered.
    pub services: Option<Vec<String>>,
    /// Products offered.
    pub products: Option<Vec<String>>,
    /// Certifications held.
    pub certifications: Option<Vec<String>>,
    /// Awards received.
    pub awards: Option<Vec<String>>,
    /// Social media links.
    pub social_media: Option<Json<SocialMedia>>,
    /// Embedded person sub-records (key contacts).
    pub people: Option<Json<Vec<PersonRecord>>>,
    /// Open string-to-value mapping for unanticipated attributes.
    pub metadata: Option<Json<serde_json::Map<String, serde_json::Value>>>,
    /// Admin user who uploaded the record.
    pub uploaded_by: Uuid,
    /// Inactive records are invisible to filtering and counting.
    pub is_active: bool,
    /// Timestamp of creation (drives newest-first ordering).
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: DateTime<Utc>,
}

/// Nested address; every part is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub landmark: Option<String>,
}

/// Social media links; every part is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMedia {
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
    pub youtube: Option<String>,
}

/// Person sub-record embedded in a business record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub alternate_phone: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub linked_in: Option<String>,
    pub twitter: Option<String>,
    pub role: Option<String>,
}

/// A purchase ledger entry tying a user, a filter specification, a payment
/// and (once completed) an immutable data snapshot together.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    /// Unique identifier for the purchase.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Requested number of records (>= 1).
    pub quantity: i32,
    /// Fixed price per record at order time.
    pub price_per_unit: BigDecimal,
    /// quantity * price_per_unit, computed at order time.
    pub total_amount: BigDecimal,
    /// The filter specification used, stored verbatim.
    pub filter_criteria: Json<FilterSpec>,
    /// One of `payment_status`: pending -> completed | failed (refunded out-of-band).
    pub payment_status: String,
    /// External provider order id.
    pub provider_order_id: Option<String>,
    /// External provider payment id (set at verification).
    pub provider_payment_id: Option<String>,
    /// Provider-supplied signature (set at verification).
    pub provider_signature: Option<String>,
    /// Identities of the snapshotted records.
    pub purchased_record_ids: Vec<Uuid>,
    /// Immutable snapshot of full record copies; non-empty means frozen.
    pub data_snapshot: serde_json::Value,
    /// One of `purchase_status`.
    pub status: String,
    /// When the purchase was created.
    pub purchase_date: DateTime<Utc>,
}

/// Purchase listing row without the (potentially large) snapshot payload.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub price_per_unit: BigDecimal,
    pub total_amount: BigDecimal,
    pub filter_criteria: Json<FilterSpec>,
    pub payment_status: String,
    pub provider_order_id: Option<String>,
    pub status: String,
    pub purchase_date: DateTime<Utc>,
}

// ============ Filter Specification ============

/// User-supplied filter specification. Absent fields impose no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Exact match against `RECORD_TYPES`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    /// Case-insensitive substring match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Case-insensitive substring match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Case-insensitive substring match on the nested address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Case-insensitive substring match on the nested address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Case-insensitive substring match on the nested address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Exact match against `EMPLOYEE_COUNTS`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<String>,
    /// Inclusive lower bound on established year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub established_year_from: Option<i32>,
    /// Inclusive upper bound on established year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub established_year_to: Option<i32>,
    /// Text-relevance search over name and description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
}

impl FilterSpec {
    /// True when no predicate fields are set.
    pub fn is_empty(&self) -> bool {
        self.record_type.is_none()
            && self.category.is_none()
            && self.industry.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.country.is_none()
            && self.employee_count.is_none()
            && self.established_year_from.is_none()
            && self.established_year_to.is_none()
            && self.search_term.is_none()
    }
}

// ============ API Request Models ============

/// Body for POST /api/v1/data/filter: filter spec plus pagination.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDataRequest {
    #[serde(flatten)]
    pub filters: FilterSpec,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Query params for admin listing endpoints.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Incoming record payload for upload/update. Same shape as `Record` minus
/// the server-assigned fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub email: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub website: Option<String>,
    pub fax: Option<String>,
    pub address: Option<Address>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub industry: Option<String>,
    pub established_year: Option<i32>,
    pub employee_count: Option<String>,
    pub revenue: Option<String>,
    pub annual_turnover: Option<String>,
    pub gst_number: Option<String>,
    pub pan_number: Option<String>,
    pub cin_number: Option<String>,
    pub company_type: Option<String>,
    pub description: Option<String>,
    pub services: Option<Vec<String>>,
    pub products: Option<Vec<String>>,
    pub certifications: Option<Vec<String>>,
    pub awards: Option<Vec<String>>,
    pub social_media: Option<SocialMedia>,
    pub people: Option<Vec<PersonRecord>>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub is_active: Option<bool>,
}

/// Upload bodies may be a single record or an array of records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UploadBody {
    Many(Vec<RecordPayload>),
    One(Box<RecordPayload>),
}

impl UploadBody {
    pub fn into_vec(self) -> Vec<RecordPayload> {
        match self {
            UploadBody::Many(items) => items,
            UploadBody::One(item) => vec![*item],
        }
    }
}

/// Body for POST /api/v1/payment/create-order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub quantity: i32,
    pub filter_criteria: Option<FilterSpec>,
}

/// Body for POST /api/v1/payment/verify.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub purchase_id: Uuid,
}

// ============ API Response Models ============

/// Blurred projection of a record shown before purchase. Everything beyond
/// name/type/category/industry and the "city, state" string is withheld.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlurredRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub category: Option<String>,
    pub industry: Option<String>,
    pub location: String,
}

/// Response for the blurred filter preview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDataResponse {
    pub success: bool,
    pub count: usize,
    pub total_count: i64,
    pub page: i64,
    pub total_pages: i64,
    pub data: Vec<BlurredRecord>,
}

/// Response for the admin full-record listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPageResponse {
    pub success: bool,
    pub count: usize,
    pub total_count: i64,
    pub page: i64,
    pub total_pages: i64,
    pub data: Vec<Record>,
}

/// Distinct non-empty values present per filterable field, for client pickers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub types: Vec<String>,
    pub categories: Vec<String>,
    pub industries: Vec<String>,
    pub cities: Vec<String>,
    pub states: Vec<String>,
    pub countries: Vec<String>,
    pub employee_counts: Vec<String>,
}

/// Envelope for filter options.
#[derive(Debug, Serialize)]
pub struct FilterOptionsResponse {
    pub success: bool,
    pub data: FilterOptions,
}

/// Response after uploading one or many records.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Record>,
}

/// Single-record envelope.
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub success: bool,
    pub data: Record,
}

/// Provider order details returned to the caller for widget initialization.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: String,
    pub amount: f64,
    pub currency: String,
    pub purchase_id: Uuid,
}

/// Envelope for order creation.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub data: OrderCreated,
}

/// Envelope for payment verification.
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Purchase>,
}

/// Payload of a successful purchase completion.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionData {
    pub purchase_id: Uuid,
    pub quantity: usize,
    pub purchase_date: DateTime<Utc>,
}

/// Envelope for purchase completion.
#[derive(Debug, Serialize)]
pub struct CompletePurchaseResponse {
    pub success: bool,
    pub message: String,
    pub data: CompletionData,
}

/// Caller's purchase history (snapshots omitted).
#[derive(Debug, Serialize)]
pub struct PurchaseListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<PurchaseSummary>,
}

/// Single purchase envelope (includes the snapshot when frozen).
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub success: bool,
    pub data: Purchase,
}

/// The frozen snapshot array for a paid purchase.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedDataResponse {
    pub success: bool,
    pub count: usize,
    pub purchase_date: DateTime<Utc>,
    pub data: serde_json::Value,
}

/// Public payment key for client-side widget initialization.
#[derive(Debug, Serialize)]
pub struct PaymentKeyResponse {
    pub success: bool,
    pub key: String,
}
