//! Input validation for bookings, permission requests and products
//!
//! All checks run before any write so a rejected input leaves no trace.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};
use crate::models::{Customer, NewBookingLine, NewPermissionRequest, NewProduct};
use crate::product_code::is_valid_code;

// ============================================================================
// Booking Validations
// ============================================================================

/// Validate customer contact details
pub fn validate_customer(customer: &Customer) -> DomainResult<()> {
    require_text("customer.name", &customer.name)?;
    require_text("customer.phone", &customer.phone)?;
    require_text("customer.address", &customer.address)?;
    validate_phone(&customer.phone)
}

/// Validate a phone number: 6 to 20 digits, separators allowed
pub fn validate_phone(phone: &str) -> DomainResult<()> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')'));

    if !allowed || !(6..=20).contains(&digits) {
        return Err(DomainError::validation(
            "customer.phone",
            "Phone number must contain 6 to 20 digits",
        ));
    }
    Ok(())
}

/// Validate booking lines: at least one, every quantity positive
pub fn validate_booking_lines(lines: &[NewBookingLine]) -> DomainResult<()> {
    if lines.is_empty() {
        return Err(DomainError::validation(
            "lines",
            "A booking needs at least one product",
        ));
    }
    if let Some(line) = lines.iter().find(|l| l.quantity <= 0) {
        return Err(DomainError::validation(
            "lines.quantity",
            format!("Quantity for product {} must be positive", line.product_id),
        ));
    }
    Ok(())
}

// ============================================================================
// Catalog Validations
// ============================================================================

/// Validate a storeman's stock request
pub fn validate_permission_request(request: &NewPermissionRequest) -> DomainResult<()> {
    require_text("supplier_name", &request.supplier_name)?;
    require_text("product_name", &request.product_name)?;
    require_text("category", &request.category)?;
    require_positive("mrp", request.mrp)?;
    require_positive("selling_price", request.selling_price)?;
    if request.quantity <= 0 {
        return Err(DomainError::validation("quantity", "Quantity must be positive"));
    }
    if let Some(code) = request.product_code.as_deref() {
        validate_code_if_present(code)?;
    }
    Ok(())
}

/// Validate a product added straight to the catalog
pub fn validate_new_product(product: &NewProduct) -> DomainResult<()> {
    require_text("name", &product.name)?;
    require_text("category", &product.category)?;
    validate_price(product.price)?;
    if product.opening_stock < 0 {
        return Err(DomainError::validation(
            "opening_stock",
            "Opening stock cannot be negative",
        ));
    }
    if let Some(code) = product.code.as_deref() {
        validate_code_if_present(code)?;
    }
    Ok(())
}

/// Validate a catalog price
pub fn validate_price(price: Decimal) -> DomainResult<()> {
    if price < Decimal::ZERO {
        return Err(DomainError::validation("price", "Price cannot be negative"));
    }
    Ok(())
}

fn validate_code_if_present(code: &str) -> DomainResult<()> {
    let code = code.trim();
    if !code.is_empty() && !is_valid_code(&code.to_ascii_uppercase()) {
        return Err(DomainError::validation(
            "product_code",
            "Product code must be two letters followed by six digits",
        ));
    }
    Ok(())
}

fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, format!("{} is required", field)));
    }
    Ok(())
}

fn require_positive(field: &str, value: Decimal) -> DomainResult<()> {
    if value <= Decimal::ZERO {
        return Err(DomainError::validation(
            field,
            format!("{} must be greater than zero", field),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn customer() -> Customer {
        Customer {
            name: "Rina Akter".to_string(),
            phone: "+880 1711-000000".to_string(),
            address: "House 4, Road 2, Dhaka".to_string(),
        }
    }

    fn request() -> NewPermissionRequest {
        NewPermissionRequest {
            supplier_name: "Acme Supply".to_string(),
            product_code: None,
            product_name: "USB Hub".to_string(),
            category: "Electronics".to_string(),
            mrp: Decimal::from(25),
            selling_price: Decimal::from(20),
            quantity: 10,
            invoice_image: None,
        }
    }

    #[test]
    fn test_valid_customer() {
        assert!(validate_customer(&customer()).is_ok());
    }

    #[test]
    fn test_customer_missing_fields() {
        let mut c = customer();
        c.address = "   ".to_string();
        let err = validate_customer(&c).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "customer.address"));
    }

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("01711000000").is_ok());
        assert!(validate_phone("(02) 555-0101").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn test_booking_lines() {
        let product_id = Uuid::new_v4();
        assert!(validate_booking_lines(&[]).is_err());
        assert!(validate_booking_lines(&[NewBookingLine { product_id, quantity: 0 }]).is_err());
        assert!(validate_booking_lines(&[NewBookingLine { product_id, quantity: 2 }]).is_ok());
    }

    #[test]
    fn test_permission_request_rules() {
        assert!(validate_permission_request(&request()).is_ok());

        let mut r = request();
        r.product_code = Some("EC123456".to_string());
        assert!(validate_permission_request(&r).is_ok());

        r.product_code = Some("   ".to_string());
        assert!(validate_permission_request(&r).is_ok());

        r.product_code = Some("ELEC-1".to_string());
        assert!(validate_permission_request(&r).is_err());

        let mut r = request();
        r.mrp = Decimal::ZERO;
        assert!(validate_permission_request(&r).is_err());

        let mut r = request();
        r.quantity = -1;
        assert!(validate_permission_request(&r).is_err());
    }

    #[test]
    fn test_new_product_rules() {
        let product = NewProduct {
            code: None,
            sku: None,
            name: "Desk Lamp".to_string(),
            category: "Home & Garden".to_string(),
            description: None,
            price: Decimal::from(30),
            opening_stock: 0,
        };
        assert!(validate_new_product(&product).is_ok());

        let mut bad = product.clone();
        bad.opening_stock = -1;
        assert!(validate_new_product(&bad).is_err());

        let mut bad = product;
        bad.price = Decimal::from(-1);
        assert!(validate_new_product(&bad).is_err());
    }
}
