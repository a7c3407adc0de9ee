use crate::models::{BookingResult, FormSubmission};

#[derive(Debug, Clone, PartialEq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

/// Administrative notification: everything ops needs to act on the
/// submission without opening the CRM.
pub fn admin_email(form: &FormSubmission, booking: Option<&BookingResult>) -> EmailContent {
    match form {
        FormSubmission::ShipmentRequest(request) => {
            let mut body = String::new();
            body.push_str("New shipment request\n\n");
            body.push_str(&format!("Contact: {} <{}> {}\n", request.contact.name, request.contact.email, request.contact.phone));
            body.push_str(&format!(
                "Route: {}, {} -> {}, {}\n",
                request.sender.city, request.sender.country, request.receiver.city, request.receiver.country
            ));
            body.push_str(&format!(
                "Parcel: {} ({} {})\n",
                request.parcel.description,
                request.parcel.weight,
                request.parcel.weight_unit.as_str()
            ));

            if let Some(booking) = booking {
                body.push_str(&format!("\nBooked with {} ({})\n", booking.carrier_name, booking.status));
                body.push_str(&format!("Shipment: {}\n", booking.shipment_id));
                if let Some(ref tracking) = booking.tracking_number {
                    body.push_str(&format!("Tracking: {}\n", tracking));
                }
            }

            EmailContent {
                subject: format!("Shipment request from {}", request.contact.name),
                body,
            }
        }
        FormSubmission::QuoteRequest(request) => {
            let mut body = String::new();
            body.push_str("New quote request\n\n");
            body.push_str(&format!("Contact: {} <{}> {}\n", request.contact.name, request.contact.email, request.contact.phone));
            if let Some(ref company) = request.company {
                body.push_str(&format!("Company: {}\n", company));
            }
            body.push_str(&format!("Product: {}\n", request.product));
            body.push_str(&format!("Quantity: {}\n", request.quantity));
            body.push_str(&format!("Destination: {}\n", request.destination));
            if let Some(ref notes) = request.notes {
                body.push_str(&format!("Notes: {}\n", notes));
            }

            EmailContent {
                subject: format!("Quote request from {}", request.contact.name),
                body,
            }
        }
    }
}

/// Customer confirmation for the submitting contact.
pub fn customer_email(form: &FormSubmission, booking: Option<&BookingResult>) -> EmailContent {
    match form {
        FormSubmission::ShipmentRequest(request) => {
            let mut body = String::new();
            body.push_str(&format!("Hello {},\n\n", request.contact.name));
            body.push_str("Your shipment request has been received.\n");

            if let Some(booking) = booking {
                body.push_str(&format!(
                    "\nYour shipment is booked with {}.\n",
                    booking.carrier_name
                ));
                if let Some(ref tracking) = booking.tracking_number {
                    body.push_str(&format!("Tracking number: {}\n", tracking));
                }
                if let Some(ref url) = booking.tracking_url {
                    body.push_str(&format!("Track it here: {}\n", url));
                }
            } else {
                body.push_str("Our team will be in touch shortly.\n");
            }

            body.push_str("\nThank you for shipping with Obana.\n");

            EmailContent {
                subject: "Your shipment request has been received".to_string(),
                body,
            }
        }
        FormSubmission::QuoteRequest(request) => {
            let mut body = String::new();
            body.push_str(&format!("Hello {},\n\n", request.contact.name));
            body.push_str(&format!(
                "We have received your quote request for {} and will respond within one business day.\n",
                request.product
            ));
            body.push_str("\nThank you for choosing Obana.\n");

            EmailContent {
                subject: "We have received your quote request".to_string(),
                body,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Contact, Parcel, ParcelItem, Party, QuoteRequestForm, ShipmentRequestForm, WeightUnit,
    };

    fn contact() -> Contact {
        Contact {
            name: "Ada Obi".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+2348012345678".to_string(),
        }
    }

    fn shipment_form() -> FormSubmission {
        let party = Party {
            name: "Ada Obi".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+2348012345678".to_string(),
            address: "12 Marina Rd".to_string(),
            city: "Lagos".to_string(),
            state: "LA".to_string(),
            country: "NG".to_string(),
            zip: None,
        };

        FormSubmission::ShipmentRequest(ShipmentRequestForm {
            contact: contact(),
            sender: party.clone(),
            receiver: Party {
                city: "Abuja".to_string(),
                state: "FC".to_string(),
                ..party
            },
            parcel: Parcel {
                description: "Electronics".to_string(),
                weight: 2.0,
                weight_unit: WeightUnit::Kg,
                items: vec![ParcelItem {
                    name: "Phone".to_string(),
                    description: "Handset".to_string(),
                    currency: "NGN".to_string(),
                    value: 50_000.0,
                    weight: 2.0,
                    quantity: 1,
                }],
            },
        })
    }

    fn booking() -> BookingResult {
        BookingResult {
            shipment_id: "SHP-1".to_string(),
            tracking_number: Some("TRK-1".to_string()),
            tracking_url: Some("https://track.example/TRK-1".to_string()),
            carrier_name: "Obana Express".to_string(),
            status: "confirmed".to_string(),
            events: vec![],
        }
    }

    #[test]
    fn admin_shipment_email_includes_route_and_tracking() {
        let email = admin_email(&shipment_form(), Some(&booking()));

        assert_eq!(email.subject, "Shipment request from Ada Obi");
        assert!(email.body.contains("Lagos, NG -> Abuja, NG"));
        assert!(email.body.contains("Tracking: TRK-1"));
    }

    #[test]
    fn customer_shipment_email_links_the_tracking_page() {
        let email = customer_email(&shipment_form(), Some(&booking()));

        assert!(email.body.contains("booked with Obana Express"));
        assert!(email.body.contains("https://track.example/TRK-1"));
    }

    #[test]
    fn quote_emails_never_mention_a_booking() {
        let form = FormSubmission::QuoteRequest(QuoteRequestForm {
            contact: contact(),
            company: None,
            product: "Cocoa butter".to_string(),
            quantity: "200 cartons".to_string(),
            destination: "Accra".to_string(),
            notes: Some("Urgent".to_string()),
        });

        let admin = admin_email(&form, None);
        let customer = customer_email(&form, None);

        assert!(admin.body.contains("Product: Cocoa butter"));
        assert!(admin.body.contains("Notes: Urgent"));
        assert!(customer.body.contains("quote request for Cocoa butter"));
        assert!(!customer.body.contains("Tracking"));
    }
}
