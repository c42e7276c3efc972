//! Soft-delete visibility.
//!
//! Records are never physically removed. A record is live while its
//! deletion marker is `NULL` or false; every read this crate builds carries
//! [`live_condition`] and every mutation targets live records only.

use datadef_core::FieldValue;

use crate::query::Condition;
use crate::record::{RecordType, StoredRecord};

/// Condition selecting live records of `record_type`.
pub fn live_condition(record_type: &RecordType) -> Condition {
    Condition::NotFlagged(record_type.deleted_column().to_string())
}

/// Whether a stored record is visible, for backends that evaluate
/// conditions themselves.
pub fn is_live(record: &StoredRecord, record_type: &RecordType) -> bool {
    !is_flagged(record.get(record_type.deleted_column()))
}

pub(crate) fn is_flagged(marker: Option<&FieldValue>) -> bool {
    match marker {
        Some(FieldValue::Boolean(flag)) => *flag,
        Some(FieldValue::Integer(flag)) => *flag != 0,
        None | Some(FieldValue::Null) => false,
        // Anything else in a marker column is treated as set.
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ColumnType;

    #[test]
    fn test_null_and_missing_marker_are_live() {
        let rt = RecordType::builder("orders", "orders")
            .column("state", ColumnType::Text)
            .build()
            .unwrap();
        assert!(is_live(&StoredRecord::new().with("id", 1i64), &rt));
        assert!(is_live(
            &StoredRecord::new().with("deleted", FieldValue::Null),
            &rt
        ));
        assert!(is_live(&StoredRecord::new().with("deleted", 0i64), &rt));
        assert!(!is_live(&StoredRecord::new().with("deleted", true), &rt));
        assert!(!is_live(&StoredRecord::new().with("deleted", 1i64), &rt));
    }

    #[test]
    fn test_custom_marker_column() {
        let rt = RecordType::builder("orders", "orders")
            .deleted_column("removed")
            .build()
            .unwrap();
        assert_eq!(
            live_condition(&rt),
            Condition::NotFlagged("removed".to_string())
        );
        assert!(is_live(&StoredRecord::new().with("deleted", true), &rt));
    }
}
