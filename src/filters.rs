//! Filter evaluator: turns a `FilterSpec` into SQL predicates and produces
//! the blurred top-N preview, the admin full listing, and the distinct-value
//! enumeration that drives client-side filter pickers.
//!
//! The purchase completion workflow reuses `push_filters` + `fetch_matching`
//! so a frozen snapshot reflects exactly what live browsing would have shown.

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::errors::AppError;
use crate::models::{BlurredRecord, FilterOptions, FilterSpec, Record};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
/// The admin full listing pages more coarsely than the preview.
pub const DEFAULT_ADMIN_LIMIT: i64 = 50;

/// Clamp user-supplied pagination to sane values instead of erroring.
/// Anything missing, zero or negative falls back to page 1 and the given
/// default limit.
pub fn normalize_pagination_with(
    page: Option<i64>,
    limit: Option<i64>,
    default_limit: i64,
) -> (i64, i64) {
    let page = match page {
        Some(p) if p >= 1 => p,
        _ => DEFAULT_PAGE,
    };
    let limit = match limit {
        Some(l) if l >= 1 => l,
        _ => default_limit,
    };
    (page, limit)
}

/// `normalize_pagination_with` at the preview default of limit 10.
pub fn normalize_pagination(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    normalize_pagination_with(page, limit, DEFAULT_LIMIT)
}

/// Ceiling division for the totalPages field. `limit` must be >= 1.
/// Saturates so extreme limits cannot overflow.
pub fn total_pages(total_count: i64, limit: i64) -> i64 {
    total_count.saturating_add(limit - 1) / limit
}

/// Row offset for a page. Saturates so an absurd page number yields an
/// empty page instead of overflowing into a negative OFFSET.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    (page - 1).saturating_mul(limit)
}

/// Escape LIKE wildcards so user input only ever matches literally.
pub fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Append the WHERE clause for a filter specification.
///
/// All predicates are ANDed; absent fields contribute nothing. `is_active`
/// is always enforced so inactive records never surface anywhere.
pub fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, spec: &FilterSpec) {
    qb.push(" WHERE is_active = TRUE");

    if let Some(record_type) = &spec.record_type {
        qb.push(" AND record_type = ").push_bind(record_type.clone());
    }
    if let Some(category) = &spec.category {
        qb.push(" AND category ILIKE ")
            .push_bind(format!("%{}%", escape_like(category)));
    }
    if let Some(industry) = &spec.industry {
        qb.push(" AND industry ILIKE ")
            .push_bind(format!("%{}%", escape_like(industry)));
    }
    if let Some(city) = &spec.city {
        qb.push(" AND address ->> 'city' ILIKE ")
            .push_bind(format!("%{}%", escape_like(city)));
    }
    if let Some(state) = &spec.state {
        qb.push(" AND address ->> 'state' ILIKE ")
            .push_bind(format!("%{}%", escape_like(state)));
    }
    if let Some(country) = &spec.country {
        qb.push(" AND address ->> 'country' ILIKE ")
            .push_bind(format!("%{}%", escape_like(country)));
    }
    if let Some(employee_count) = &spec.employee_count {
        qb.push(" AND employee_count = ")
            .push_bind(employee_count.clone());
    }
    if let Some(from) = spec.established_year_from {
        qb.push(" AND established_year >= ").push_bind(from);
    }
    if let Some(to) = spec.established_year_to {
        qb.push(" AND established_year <= ").push_bind(to);
    }
    if let Some(term) = &spec.search_term {
        qb.push(
            " AND to_tsvector('english', name || ' ' || coalesce(description, '')) \
             @@ plainto_tsquery('english', ",
        )
        .push_bind(term.clone())
        .push(")");
    }
}

/// Count of active records matching the specification, independent of
/// pagination.
pub async fn count_matching(pool: &PgPool, spec: &FilterSpec) -> Result<i64, AppError> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM records");
    push_filters(&mut qb, spec);
    let count: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

/// A page of matching records, newest first.
pub async fn fetch_matching(
    pool: &PgPool,
    spec: &FilterSpec,
    limit: i64,
    offset: i64,
) -> Result<Vec<Record>, AppError> {
    let mut qb = QueryBuilder::new("SELECT * FROM records");
    push_filters(&mut qb, spec);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let records = qb.build_query_as::<Record>().fetch_all(pool).await?;
    Ok(records)
}

/// Blurred projection: only name, type, category, industry and a derived
/// "city, state" location string survive. Everything else is withheld.
pub fn blur(record: &Record) -> BlurredRecord {
    let (city, state) = record
        .address
        .as_ref()
        .map(|addr| (addr.city.clone(), addr.state.clone()))
        .unwrap_or((None, None));

    BlurredRecord {
        id: record.id,
        name: record.name.clone(),
        record_type: record.record_type.clone(),
        category: record.category.clone(),
        industry: record.industry.clone(),
        location: format!(
            "{}, {}",
            city.unwrap_or_else(|| "N/A".to_string()),
            state.unwrap_or_else(|| "N/A".to_string())
        ),
    }
}

/// Distinct non-empty values for one column expression, active records only.
async fn distinct_values(pool: &PgPool, expr: &str) -> Result<Vec<String>, AppError> {
    let sql = format!(
        "SELECT DISTINCT {expr} AS value FROM records \
         WHERE is_active = TRUE AND {expr} IS NOT NULL AND {expr} <> '' \
         ORDER BY value"
    );
    let values = sqlx::query_scalar::<_, String>(&sql).fetch_all(pool).await?;
    Ok(values)
}

/// The distinct values currently present per filterable field.
pub async fn filter_options(pool: &PgPool) -> Result<FilterOptions, AppError> {
    Ok(FilterOptions {
        types: distinct_values(pool, "record_type").await?,
        categories: distinct_values(pool, "category").await?,
        industries: distinct_values(pool, "industry").await?,
        cities: distinct_values(pool, "address ->> 'city'").await?,
        states: distinct_values(pool, "address ->> 'state'").await?,
        countries: distinct_values(pool, "address ->> 'country'").await?,
        employee_counts: distinct_values(pool, "employee_count").await?,
    })
}
