//! Line item arithmetic and validation tests. The rounding rule is
//! pinned here: 2 decimal places, half-up (midpoint away from zero).

mod common;

use common::{dec, document_input, item, seed_customer, TestDb};
use documents_service::models::{compute_totals, validate_items, DocumentType, UpdateDocument};
use service_core::error::AppError;

#[test]
fn line_total_applies_the_discount_multiplier() {
    assert_eq!(item(1, "2", "10.00", "10").line_total(), dec("18.00"));
    assert_eq!(item(1, "1", "5.00", "0").line_total(), dec("5.00"));
    assert_eq!(item(1, "1", "100.00", "100").line_total(), dec("0.00"));
}

#[test]
fn rounding_is_half_up_to_two_decimals() {
    // 3 * 0.335 = 1.005; half-up gives 1.01 where half-even would give 1.00.
    assert_eq!(item(1, "3", "0.335", "0").line_total(), dec("1.01"));
    // 0.125 rounds up to 0.13, not to the even 0.12.
    assert_eq!(item(1, "1", "0.125", "0").line_total(), dec("0.13"));
    // 2.5 * 3.333 = 8.3325 -> 8.33.
    assert_eq!(item(1, "2.5", "3.333", "0").line_total(), dec("8.33"));
}

#[test]
fn discount_and_tax_amounts_are_rounded_independently() {
    let mut taxed = item(1, "1", "33.33", "0");
    taxed.tax_rate = dec("7");
    // 33.33 * 7% = 2.3331 -> 2.33.
    assert_eq!(taxed.tax_amount(), dec("2.33"));

    let discounted = item(1, "3", "9.99", "15");
    // 3 * 9.99 * 15% = 4.4955 -> 4.50.
    assert_eq!(discounted.discount_amount(), dec("4.50"));
    // 3 * 9.99 * 0.85 = 25.4745 -> 25.47.
    assert_eq!(discounted.line_total(), dec("25.47"));
}

#[test]
fn totals_sum_the_rounded_per_line_amounts() {
    let mut taxed = item(1, "1", "100.00", "0");
    taxed.tax_rate = dec("8.25");
    let items = [taxed, item(2, "2", "10.00", "10")];

    let totals = compute_totals(&items);
    assert_eq!(totals.subtotal, dec("118.00"));
    assert_eq!(totals.tax_amount, dec("8.25"));
    assert_eq!(totals.total_amount, dec("126.25"));
}

#[test]
fn validation_reports_every_violation_at_once() {
    let mut negative_tax = item(4, "1", "1.00", "0");
    negative_tax.tax_rate = dec("-1");

    let items = [
        item(1, "0", "10.00", "0"),   // quantity not positive
        item(2, "1", "-5.00", "0"),   // negative unit price
        item(3, "1", "10.00", "150"), // discount out of range
        negative_tax,                 // negative tax rate
        item(4, "1", "10.00", "0"),   // duplicate line number
        item(0, "1", "10.00", "0"),   // line number not positive
    ];

    let errors = validate_items(&items).expect_err("validation must fail");
    let field_errors = errors.field_errors();
    let item_errors = field_errors.get("items").expect("errors on items");
    assert_eq!(item_errors.len(), 6);

    let codes: Vec<&str> = item_errors.iter().map(|e| e.code.as_ref()).collect();
    for expected in [
        "quantity_not_positive",
        "unit_price_negative",
        "discount_percent_out_of_range",
        "tax_rate_negative",
        "line_number_duplicate",
        "line_number_not_positive",
    ] {
        assert!(codes.contains(&expected), "missing code {expected}");
    }
}

#[test]
fn boundary_values_are_accepted() {
    let items = [
        item(1, "0.001", "0.00", "0"),
        item(2, "1", "10.00", "100"),
        item(3, "1", "10.00", "0"),
    ];
    assert!(validate_items(&items).is_ok());
}

#[tokio::test]
async fn invalid_items_block_document_creation_entirely() {
    let app = TestDb::new().await;
    let customer = seed_customer(&app.db).await;

    let err = app
        .db
        .create_document(
            &document_input(DocumentType::Invoice, customer.id),
            &[item(1, "1", "10.00", "0"), item(2, "0", "10.00", "0")],
        )
        .await
        .expect_err("create must fail");
    assert!(matches!(err, AppError::ValidationError(_)));

    let headers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(app.db.pool())
        .await
        .expect("count documents");
    assert_eq!(headers, 0);

    // The counter was not advanced either.
    let peek = app
        .db
        .peek_next_number(DocumentType::Invoice)
        .await
        .expect("peek");
    assert_eq!(peek, "INV-00001");
}

#[tokio::test]
async fn invalid_replacement_leaves_the_existing_set_untouched() {
    let app = TestDb::new().await;
    let customer = seed_customer(&app.db).await;

    let (document, original_items) = app
        .db
        .create_document(
            &document_input(DocumentType::Invoice, customer.id),
            &[item(1, "2", "10.00", "0")],
        )
        .await
        .expect("create document");

    let err = app
        .db
        .update_document(
            document.id,
            &UpdateDocument::default(),
            Some(&[item(1, "0", "10.00", "0")]),
        )
        .await
        .expect_err("update must fail");
    assert!(matches!(err, AppError::ValidationError(_)));

    let (stored, stored_items) = app.db.get_document(document.id).await.expect("get");
    assert_eq!(stored_items.len(), 1);
    assert_eq!(stored_items[0].id, original_items[0].id);
    assert_eq!(stored.subtotal, document.subtotal);
    assert_eq!(stored.updated_at, document.updated_at);
}
