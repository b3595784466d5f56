use crate::listings::domain::{ListingDraft, ListingStatus, ListingType, ListingUpdate, Purpose};
use crate::listings::service::{validate_draft, validate_update};

fn draft() -> ListingDraft {
    ListingDraft {
        title: Some("  Harbour view loft ".to_string()),
        price: Some(1850.0),
        listing_type: Some("Apartment".to_string()),
        purpose: Some("rent".to_string()),
        location: Some("Old Town".to_string()),
        bedrooms: Some(2),
        ..ListingDraft::default()
    }
}

#[test]
fn draft_with_required_fields_is_accepted() {
    let listing = validate_draft(draft()).expect("valid draft");
    assert_eq!(listing.title, "Harbour view loft");
    assert_eq!(listing.listing_type, ListingType::Apartment);
    assert_eq!(listing.purpose, Purpose::Rent);
    assert!(listing.features.is_empty());
}

#[test]
fn empty_draft_reports_each_required_field() {
    let errors = validate_draft(ListingDraft::default()).expect_err("empty draft");
    let paths: Vec<_> = errors.iter().map(|error| error.path).collect();
    assert_eq!(paths, vec!["title", "price", "type", "purpose", "location"]);
}

#[test]
fn draft_rejects_non_positive_price_and_unknown_type() {
    let errors = validate_draft(ListingDraft {
        price: Some(0.0),
        listing_type: Some("castle".to_string()),
        bathrooms: Some(-1),
        ..draft()
    })
    .expect_err("invalid draft");
    let paths: Vec<_> = errors.iter().map(|error| error.path).collect();
    assert_eq!(paths, vec!["price", "type", "bathrooms"]);
}

#[test]
fn update_parses_only_present_fields() {
    let patch = validate_update(ListingUpdate {
        status: Some("sold".to_string()),
        title: Some("   ".to_string()),
        ..ListingUpdate::default()
    })
    .expect("valid update");
    assert_eq!(patch.status, Some(ListingStatus::Sold));
    assert_eq!(patch.title, None);
    assert_eq!(patch.price, None);

    let errors = validate_update(ListingUpdate {
        price: Some(-5.0),
        status: Some("demolished".to_string()),
        ..ListingUpdate::default()
    })
    .expect_err("invalid update");
    assert_eq!(errors.len(), 2);
}
