//! # Validation Module
//!
//! Input validation for catalog records and stock movements.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: THIS MODULE                                                   │
//! │  ├── Names non-empty and bounded                                       │
//! │  └── Movement quantity > 0, expiry parses                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0) on stocks                                   │
//! │  ├── UNIQUE (department, item, expiry) on stocks                       │
//! │  └── UNIQUE (item, category) on item_categories                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{NewItem, NewMovement};
use crate::MAX_NAME_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates an item or category name.
///
/// ## Example
/// ```rust
/// use medstock_core::validation::validate_name;
///
/// assert!(validate_name("name", "輸液セット").is_ok());
/// assert!(validate_name("name", "  ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a new catalog item.
pub fn validate_new_item(item: &NewItem) -> ValidationResult<()> {
    validate_name("name", &item.name)?;

    if item.unit.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "unit".to_string(),
        });
    }

    if item.min_stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "min_stock".to_string(),
        });
    }

    Ok(())
}

/// Validates a movement quantity (must be > 0).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock movement before it touches the ledger.
pub fn validate_movement(movement: &NewMovement) -> ValidationResult<()> {
    validate_quantity(movement.quantity)?;

    if let Some(remarks) = &movement.remarks {
        if remarks.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::TooLong {
                field: "remarks".to_string(),
                max: MAX_NAME_LENGTH,
            });
        }
    }

    Ok(())
}

/// Parses an expiry date in `YYYY-MM-DD` form.
///
/// Empty input means "no expiry".
///
/// ## Example
/// ```rust
/// use medstock_core::validation::parse_expiry_date;
///
/// assert!(parse_expiry_date("2026-01-01").unwrap().is_some());
/// assert!(parse_expiry_date("").unwrap().is_none());
/// assert!(parse_expiry_date("01/01/2026").is_err());
/// ```
pub fn parse_expiry_date(raw: &str) -> ValidationResult<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| ValidationError::InvalidFormat {
            field: "expiry_date".to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "酸素マスク成人高").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"あ".repeat(MAX_NAME_LENGTH + 1)).is_err());
        assert!(validate_name("name", &"あ".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_new_item() {
        let mut item = NewItem::simple("三角巾", Some(8));
        assert!(validate_new_item(&item).is_ok());

        item.min_stock = -1;
        assert!(matches!(
            validate_new_item(&item),
            Err(ValidationError::MustNotBeNegative { .. })
        ));

        let item = NewItem {
            unit: " ".to_string(),
            ..NewItem::simple("三角巾", None)
        };
        assert!(matches!(
            validate_new_item(&item),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_movement() {
        assert!(validate_movement(&NewMovement::stock_out(1, 5, 2)).is_ok());
        assert!(validate_movement(&NewMovement::stock_in(1, 5, 0)).is_err());
    }

    #[test]
    fn test_parse_expiry_date() {
        assert_eq!(
            parse_expiry_date(" 2026-01-01 ").unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 1)
        );
        assert!(parse_expiry_date("2026-13-01").is_err());
    }
}
