/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use proptest::prelude::*;
use rust_datamart_api::filters::{escape_like, normalize_pagination, page_offset, total_pages};
use rust_datamart_api::payment_gateway::{compute_signature, verify_signature};

// Property: pagination normalization never produces invalid values
proptest! {
    #[test]
    fn pagination_is_always_positive(page in any::<Option<i64>>(), limit in any::<Option<i64>>()) {
        let (p, l) = normalize_pagination(page, limit);
        prop_assert!(p >= 1);
        prop_assert!(l >= 1);
    }

    #[test]
    fn valid_pagination_passes_through(page in 1i64..=100_000, limit in 1i64..=1_000) {
        prop_assert_eq!(normalize_pagination(Some(page), Some(limit)), (page, limit));
    }

    #[test]
    fn pagination_arithmetic_never_overflows(page in 1i64.., limit in 1i64..) {
        // Any positive page/limit pair, up to i64::MAX, must produce an
        // in-range, non-negative offset and page count.
        let offset = page_offset(page, limit);
        prop_assert!(offset >= 0);
        prop_assert!(total_pages(i64::MAX, limit) >= 1);
    }

    #[test]
    fn total_pages_covers_all_rows(total in 0i64..=1_000_000, limit in 1i64..=1_000) {
        let pages = total_pages(total, limit);
        // Enough pages for every row, and no fully-empty trailing page.
        prop_assert!(pages * limit >= total);
        if total > 0 {
            prop_assert!((pages - 1) * limit < total);
        } else {
            prop_assert_eq!(pages, 0);
        }
    }
}

// Property: LIKE escaping leaves no live wildcard in user input
proptest! {
    #[test]
    fn escaped_input_has_no_unescaped_wildcards(input in "\\PC*") {
        let escaped = escape_like(&input);
        let chars: Vec<char> = escaped.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == '\\' {
                // Escape consumes the following character.
                i += 2;
            } else {
                prop_assert!(chars[i] != '%' && chars[i] != '_');
                i += 1;
            }
        }
    }
}

// Property: signature verification is exact and never panics
proptest! {
    #[test]
    fn verify_never_panics_on_arbitrary_input(
        secret in "[a-zA-Z0-9]{1,32}",
        order_id in "[a-zA-Z0-9_]{1,24}",
        payment_id in "[a-zA-Z0-9_]{1,24}",
        supplied in "\\PC*"
    ) {
        let _ = verify_signature(&secret, &order_id, &payment_id, &supplied);
    }

    #[test]
    fn computed_signature_always_verifies(
        secret in "[a-zA-Z0-9]{1,32}",
        order_id in "[a-zA-Z0-9_]{1,24}",
        payment_id in "[a-zA-Z0-9_]{1,24}"
    ) {
        let sig = compute_signature(&secret, &order_id, &payment_id);
        prop_assert!(verify_signature(&secret, &order_id, &payment_id, &sig));
    }

    #[test]
    fn flipping_any_hex_char_breaks_verification(
        secret in "[a-zA-Z0-9]{1,32}",
        order_id in "[a-zA-Z0-9_]{1,24}",
        payment_id in "[a-zA-Z0-9_]{1,24}",
        position in 0usize..64
    ) {
        let sig = compute_signature(&secret, &order_id, &payment_id);
        let mut bytes = sig.into_bytes();
        bytes[position] = if bytes[position] == b'0' { b'1' } else { b'0' };
        let tampered = String::from_utf8(bytes).unwrap();
        prop_assert!(!verify_signature(&secret, &order_id, &payment_id, &tampered));
    }
}
