use crate::errors::ServiceError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// The two document types that move stock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Consumption bill: stock leaves the warehouse.
    Bill,
    /// Reception sheet: stock enters the warehouse.
    Reception,
}

impl DocumentKind {
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Bill => "consumption bill",
            DocumentKind::Reception => "reception sheet",
        }
    }

    /// Applies this document's stock effect to `current`.
    pub fn apply_delta(self, current: Decimal, quantity: Decimal) -> Decimal {
        match self {
            DocumentKind::Bill => current - quantity,
            DocumentKind::Reception => current + quantity,
        }
    }

    /// Only consumption bills are checked against stock on hand.
    pub fn checks_stock(self) -> bool {
        matches!(self, DocumentKind::Bill)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A product snapshot taken when the item was added to a document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    /// 1-based position within the document
    pub item_number: i32,
    pub code: String,
    pub name: String,
    pub unit: String,
    #[schema(value_type = String, example = "4")]
    pub quantity: Decimal,
    pub location: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BillMetadata {
    pub employee_name: String,
    pub employee_signature: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReceptionMetadata {
    pub supplier: String,
    pub document_number: Option<String>,
    pub notes: Option<String>,
}

/// Header fields entered alongside the line items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentMetadata {
    Bill(BillMetadata),
    Reception(ReceptionMetadata),
}

impl DocumentMetadata {
    pub fn kind(&self) -> DocumentKind {
        match self {
            DocumentMetadata::Bill(_) => DocumentKind::Bill,
            DocumentMetadata::Reception(_) => DocumentKind::Reception,
        }
    }

    /// Checks the fields a finalized document cannot be stored without.
    pub fn ensure_required(&self) -> Result<(), ServiceError> {
        match self {
            DocumentMetadata::Bill(meta) if meta.employee_name.trim().is_empty() => Err(
                ServiceError::ValidationError("Employee name is required".to_string()),
            ),
            DocumentMetadata::Reception(meta) if meta.supplier.trim().is_empty() => Err(
                ServiceError::ValidationError("Supplier is required".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Trims every field and drops optional ones that end up empty.
    pub fn normalized(self) -> Self {
        match self {
            DocumentMetadata::Bill(meta) => DocumentMetadata::Bill(BillMetadata {
                employee_name: meta.employee_name.trim().to_string(),
                employee_signature: non_blank(meta.employee_signature),
            }),
            DocumentMetadata::Reception(meta) => DocumentMetadata::Reception(ReceptionMetadata {
                supplier: meta.supplier.trim().to_string(),
                document_number: non_blank(meta.document_number),
                notes: non_blank(meta.notes),
            }),
        }
    }
}

/// Trims an optional text field, mapping blank input to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn apply_delta_follows_document_direction() {
        assert_eq!(DocumentKind::Bill.apply_delta(dec!(10), dec!(4)), dec!(6));
        assert_eq!(
            DocumentKind::Reception.apply_delta(dec!(10), dec!(2.5)),
            dec!(12.5)
        );
    }

    #[test]
    fn bill_requires_employee_name() {
        let meta = DocumentMetadata::Bill(BillMetadata {
            employee_name: "   ".into(),
            employee_signature: None,
        });
        assert!(matches!(
            meta.ensure_required(),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn reception_requires_supplier() {
        let meta = DocumentMetadata::Reception(ReceptionMetadata::default());
        assert!(meta.ensure_required().is_err());

        let meta = DocumentMetadata::Reception(ReceptionMetadata {
            supplier: "Acme".into(),
            ..Default::default()
        });
        assert!(meta.ensure_required().is_ok());
    }

    #[test]
    fn normalized_trims_and_drops_blank_optionals() {
        let meta = DocumentMetadata::Reception(ReceptionMetadata {
            supplier: "  Acme ".into(),
            document_number: Some("  ".into()),
            notes: Some(" pallet 3 ".into()),
        })
        .normalized();

        assert_eq!(
            meta,
            DocumentMetadata::Reception(ReceptionMetadata {
                supplier: "Acme".into(),
                document_number: None,
                notes: Some("pallet 3".into()),
            })
        );
    }
}
