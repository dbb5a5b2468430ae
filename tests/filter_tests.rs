/// Unit tests for the filter request/response surface:
/// wire-format deserialization, pagination normalization and upload bodies.
use rust_datamart_api::filters::{normalize_pagination, page_offset, total_pages};
use rust_datamart_api::models::{FilterDataRequest, FilterSpec, UploadBody};

#[cfg(test)]
mod filter_spec_wire_format {
    use super::*;

    #[test]
    fn deserializes_camel_case_fields() {
        let spec: FilterSpec = serde_json::from_str(
            r#"{
                "type": "company",
                "employeeCount": "11-50",
                "establishedYearFrom": 1990,
                "establishedYearTo": 2020,
                "searchTerm": "tooling",
                "city": "pune"
            }"#,
        )
        .unwrap();

        assert_eq!(spec.record_type.as_deref(), Some("company"));
        assert_eq!(spec.employee_count.as_deref(), Some("11-50"));
        assert_eq!(spec.established_year_from, Some(1990));
        assert_eq!(spec.established_year_to, Some(2020));
        assert_eq!(spec.search_term.as_deref(), Some("tooling"));
        assert_eq!(spec.city.as_deref(), Some("pune"));
    }

    #[test]
    fn absent_fields_impose_no_constraint() {
        let spec: FilterSpec = serde_json::from_str("{}").unwrap();
        assert!(spec.is_empty());
    }

    #[test]
    fn round_trips_verbatim_for_purchase_storage() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"city":"Pune","employeeCount":"11-50"}"#).unwrap();
        let stored = serde_json::to_value(&spec).unwrap();
        let reloaded: FilterSpec = serde_json::from_value(stored).unwrap();
        assert_eq!(reloaded.city.as_deref(), Some("Pune"));
        assert_eq!(reloaded.employee_count.as_deref(), Some("11-50"));
    }

    #[test]
    fn filter_request_flattens_spec_and_pagination() {
        let req: FilterDataRequest = serde_json::from_str(
            r#"{"city": "pune", "page": 2, "limit": 25}"#,
        )
        .unwrap();
        assert_eq!(req.filters.city.as_deref(), Some("pune"));
        assert_eq!(req.page, Some(2));
        assert_eq!(req.limit, Some(25));
    }
}

#[cfg(test)]
mod pagination_tests {
    use super::*;

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        assert_eq!(normalize_pagination(None, None), (1, 10));
        assert_eq!(normalize_pagination(Some(0), None), (1, 10));
        assert_eq!(normalize_pagination(Some(-1), Some(-5)), (1, 10));
    }

    #[test]
    fn valid_values_pass_through() {
        assert_eq!(normalize_pagination(Some(3), Some(50)), (3, 50));
    }

    #[test]
    fn page_two_at_limit_ten_covers_ranks_eleven_to_twenty() {
        let (page, limit) = normalize_pagination(Some(2), Some(10));
        let offset = page_offset(page, limit);
        assert_eq!(offset, 10);
        assert_eq!(offset + limit, 20);
    }

    #[test]
    fn maximum_page_and_limit_are_a_valid_empty_page_request() {
        let (page, limit) = normalize_pagination(Some(i64::MAX), Some(i64::MAX));
        let offset = page_offset(page, limit);
        assert!(offset >= 0);
        assert_eq!(total_pages(42, limit), 1);
    }

    #[test]
    fn total_pages_matches_count_and_limit() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(30, 10), 3);
    }
}

#[cfg(test)]
mod upload_body_tests {
    use super::*;

    const RECORD: &str = r#"{
        "name": "Acme Tools",
        "type": "company",
        "email": "contact@acme.example",
        "phone": "+911234567890"
    }"#;

    #[test]
    fn accepts_single_record() {
        let body: UploadBody = serde_json::from_str(RECORD).unwrap();
        let records = body.into_vec();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Acme Tools");
    }

    #[test]
    fn accepts_record_array() {
        let body: UploadBody = serde_json::from_str(&format!("[{RECORD}, {RECORD}]")).unwrap();
        assert_eq!(body.into_vec().len(), 2);
    }
}
