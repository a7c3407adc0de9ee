use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{Error, Result, ValidationErrors, codes};
use crate::models::{Contact, Parcel, Party, PartyDetails, RouteEnd, ShipmentInfo};

/// Dial prefixes for the markets the platform serves (ISO code → prefix).
static DIAL_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("NG", "234"),
        ("GH", "233"),
        ("KE", "254"),
        ("ZA", "27"),
        ("CI", "225"),
        ("SN", "221"),
        ("BJ", "229"),
        ("TG", "228"),
        ("CM", "237"),
        ("EG", "20"),
        ("US", "1"),
        ("GB", "44"),
    ])
});

/// Normalize a phone number to a country-prefixed `+...` format.
///
/// Leading trunk zeros are dropped and the country's dial prefix is added
/// unless already present. Unknown countries keep the digits as entered.
/// Returns `None` when too few digits remain to be a phone number.
pub fn normalize_phone(phone: &str, country: &str) -> Option<String> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 6 {
        return None;
    }

    match DIAL_CODES.get(country) {
        Some(dial) if digits.starts_with(dial) => Some(format!("+{}", digits)),
        Some(dial) => {
            let national = digits.strip_prefix('0').unwrap_or(&digits);
            Some(format!("+{}{}", dial, national))
        }
        None => Some(format!("+{}", digits)),
    }
}

fn valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

fn check_route_end(errors: &mut ValidationErrors, prefix: &str, end: &RouteEnd) {
    if end.country.trim().is_empty() {
        errors.push(&format!("{}.country", prefix), "country is required");
    }
    if end.state.trim().is_empty() {
        errors.push(&format!("{}.state", prefix), "state is required");
    }
    if end.city.trim().is_empty() {
        errors.push(&format!("{}.city", prefix), "city is required");
    }
}

fn check_parcel(errors: &mut ValidationErrors, parcel: &Parcel) {
    if parcel.description.trim().is_empty() {
        errors.push("parcel.description", "description is required");
    }
    if parcel.weight <= 0.0 {
        errors.push("parcel.weight", "weight must be greater than zero");
    }
    if parcel.items.is_empty() {
        errors.push("parcel.items", "at least one item is required");
    }
    for (i, item) in parcel.items.iter().enumerate() {
        if item.name.trim().is_empty() {
            errors.push(&format!("parcel.items[{}].name", i), "name is required");
        }
        if item.value <= 0.0 {
            errors.push(
                &format!("parcel.items[{}].value", i),
                "declared value must be greater than zero",
            );
        }
        if item.quantity == 0 {
            errors.push(
                &format!("parcel.items[{}].quantity", i),
                "quantity must be at least 1",
            );
        }
    }
}

/// Step 1: route endpoints must be complete triples and the parcel must be
/// plausible. A complete but identical route is a business error, not a
/// field error.
pub fn validate_shipment_info(info: &ShipmentInfo) -> Result<()> {
    let mut errors = ValidationErrors::new();

    check_route_end(&mut errors, "pickup", &info.pickup);
    check_route_end(&mut errors, "destination", &info.destination);
    check_parcel(&mut errors, &info.parcel);

    errors.into_result()?;

    if info.pickup == info.destination {
        return Err(Error::business(
            codes::SAME_ROUTE,
            "pickup and destination cannot be the same",
        ));
    }

    Ok(())
}

fn check_party(errors: &mut ValidationErrors, prefix: &str, party: &Party) {
    if party.name.trim().is_empty() {
        errors.push(&format!("{}.name", prefix), "name is required");
    }
    if !valid_email(&party.email) {
        errors.push(&format!("{}.email", prefix), "a valid email is required");
    }
    if normalize_phone(&party.phone, &party.country).is_none() {
        errors.push(&format!("{}.phone", prefix), "a valid phone number is required");
    }
    if party.address.trim().is_empty() {
        errors.push(&format!("{}.address", prefix), "address is required");
    }
    if party.city.trim().is_empty() {
        errors.push(&format!("{}.city", prefix), "city is required");
    }
    if party.state.trim().is_empty() {
        errors.push(&format!("{}.state", prefix), "state is required");
    }
    if party.country.trim().is_empty() {
        errors.push(&format!("{}.country", prefix), "country is required");
    }
}

/// Step 2: both parties complete, with phones rewritten to the normalized
/// country-prefixed form in the returned copy.
pub fn validate_party_details(details: &PartyDetails) -> Result<PartyDetails> {
    let mut errors = ValidationErrors::new();

    check_party(&mut errors, "sender", &details.sender);
    check_party(&mut errors, "receiver", &details.receiver);

    errors.into_result()?;

    let mut normalized = details.clone();
    if let Some(phone) = normalize_phone(&details.sender.phone, &details.sender.country) {
        normalized.sender.phone = phone;
    }
    if let Some(phone) = normalize_phone(&details.receiver.phone, &details.receiver.country) {
        normalized.receiver.phone = phone;
    }

    Ok(normalized)
}

/// Contact capture step (also reused by the quote-request form).
pub fn validate_contact(contact: &Contact) -> Result<()> {
    let mut errors = ValidationErrors::new();

    if contact.name.trim().is_empty() {
        errors.push("contact.name", "name is required");
    }
    if !valid_email(&contact.email) {
        errors.push("contact.email", "a valid email is required");
    }
    if contact.phone.chars().filter(|c| c.is_ascii_digit()).count() < 6 {
        errors.push("contact.phone", "a valid phone number is required");
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParcelItem, WeightUnit};

    fn lagos() -> RouteEnd {
        RouteEnd {
            country: "NG".to_string(),
            state: "LA".to_string(),
            city: "Lagos".to_string(),
        }
    }

    fn abuja() -> RouteEnd {
        RouteEnd {
            country: "NG".to_string(),
            state: "FC".to_string(),
            city: "Abuja".to_string(),
        }
    }

    fn parcel() -> Parcel {
        Parcel {
            description: "Electronics".to_string(),
            weight: 2.0,
            weight_unit: WeightUnit::Kg,
            items: vec![ParcelItem {
                name: "Phone".to_string(),
                description: "Refurbished handset".to_string(),
                currency: "NGN".to_string(),
                value: 50_000.0,
                weight: 2.0,
                quantity: 1,
            }],
        }
    }

    fn sender() -> Party {
        Party {
            name: "Ada Obi".to_string(),
            email: "ada@example.com".to_string(),
            phone: "08012345678".to_string(),
            address: "12 Marina Rd".to_string(),
            city: "Lagos".to_string(),
            state: "LA".to_string(),
            country: "NG".to_string(),
            zip: Some("100001".to_string()),
        }
    }

    #[test]
    fn nigerian_trunk_zero_is_replaced_with_dial_code() {
        assert_eq!(
            normalize_phone("0801 234 5678", "NG").as_deref(),
            Some("+2348012345678")
        );
    }

    #[test]
    fn already_prefixed_numbers_are_left_alone() {
        assert_eq!(
            normalize_phone("+234 801 234 5678", "NG").as_deref(),
            Some("+2348012345678")
        );
    }

    #[test]
    fn unknown_countries_keep_digits_as_entered() {
        assert_eq!(normalize_phone("5551234567", "XX").as_deref(), Some("+5551234567"));
    }

    #[test]
    fn too_short_numbers_are_rejected() {
        assert!(normalize_phone("12 34", "NG").is_none());
    }

    #[test]
    fn complete_shipment_info_passes() {
        let info = ShipmentInfo {
            pickup: lagos(),
            destination: abuja(),
            parcel: parcel(),
        };
        assert!(validate_shipment_info(&info).is_ok());
    }

    #[test]
    fn missing_city_is_a_field_error() {
        let mut info = ShipmentInfo {
            pickup: lagos(),
            destination: abuja(),
            parcel: parcel(),
        };
        info.destination.city.clear();

        match validate_shipment_info(&info) {
            Err(Error::Validation(errors)) => {
                assert!(errors.field("destination.city").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn identical_route_is_a_business_error() {
        let info = ShipmentInfo {
            pickup: lagos(),
            destination: lagos(),
            parcel: parcel(),
        };

        let err = validate_shipment_info(&info).unwrap_err();
        assert!(err.is_business(codes::SAME_ROUTE));
    }

    #[test]
    fn zero_weight_parcel_is_rejected() {
        let mut info = ShipmentInfo {
            pickup: lagos(),
            destination: abuja(),
            parcel: parcel(),
        };
        info.parcel.weight = 0.0;

        match validate_shipment_info(&info) {
            Err(Error::Validation(errors)) => {
                assert!(errors.field("parcel.weight").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn party_details_come_back_with_normalized_phones() {
        let details = PartyDetails {
            sender: sender(),
            receiver: Party {
                phone: "0802 111 2222".to_string(),
                ..sender()
            },
        };

        let normalized = validate_party_details(&details).unwrap();
        assert_eq!(normalized.sender.phone, "+2348012345678");
        assert_eq!(normalized.receiver.phone, "+2348021112222");
    }

    #[test]
    fn bad_party_email_is_field_scoped() {
        let details = PartyDetails {
            sender: Party {
                email: "not-an-email".to_string(),
                ..sender()
            },
            receiver: sender(),
        };

        match validate_party_details(&details) {
            Err(Error::Validation(errors)) => {
                assert!(errors.field("sender.email").is_some());
                assert!(errors.field("receiver.email").is_none());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn contact_requires_name_email_and_phone() {
        let contact = Contact {
            name: String::new(),
            email: "ada@example.com".to_string(),
            phone: "08012345678".to_string(),
        };

        match validate_contact(&contact) {
            Err(Error::Validation(errors)) => {
                assert!(errors.field("contact.name").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
