//! Payment gateway transaction status -> order status

use shared::models::OrderStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusMapError {
    #[error("unknown transaction status: {0}")]
    UnknownStatus(String),
    #[error("unknown fraud status {fraud} for {status}")]
    UnknownFraudStatus { status: String, fraud: String },
}

/// Map the gateway's `transaction_status` / `fraud_status` pair to an order status.
pub fn map_transaction_status(
    transaction_status: &str,
    fraud_status: Option<&str>,
) -> Result<OrderStatus, StatusMapError> {
    match transaction_status {
        "capture" => match fraud_status {
            None | Some("accept") => Ok(OrderStatus::Packed),
            // held for manual review at the gateway
            Some("challenge") => Ok(OrderStatus::Unpaid),
            Some("deny") => Ok(OrderStatus::Cancelled),
            Some(other) => Err(StatusMapError::UnknownFraudStatus {
                status: transaction_status.to_string(),
                fraud: other.to_string(),
            }),
        },
        "settlement" => Ok(OrderStatus::Packed),
        "pending" => Ok(OrderStatus::Unpaid),
        "deny" | "cancel" | "expire" | "failure" => Ok(OrderStatus::Cancelled),
        "refund" | "partial_refund" => Ok(OrderStatus::Cancelled),
        other => Err(StatusMapError::UnknownStatus(other.to_string())),
    }
}

/// Whether a payment notification may move an order from `current` to `target`.
///
/// Payments only act on unpaid orders, except refunds which may cancel a
/// paid order that has not left the farm yet.
pub fn payment_applies(current: OrderStatus, target: OrderStatus) -> bool {
    if current == target {
        return false;
    }
    match current {
        OrderStatus::Unpaid => true,
        OrderStatus::Packed => target == OrderStatus::Cancelled,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_known_statuses() {
        let table = [
            ("capture", None, Packed),
            ("capture", Some("accept"), Packed),
            ("capture", Some("challenge"), Unpaid),
            ("capture", Some("deny"), Cancelled),
            ("settlement", None, Packed),
            ("settlement", Some("accept"), Packed),
            ("pending", None, Unpaid),
            ("deny", None, Cancelled),
            ("cancel", None, Cancelled),
            ("expire", None, Cancelled),
            ("failure", None, Cancelled),
            ("refund", None, Cancelled),
            ("partial_refund", None, Cancelled),
        ];
        for (status, fraud, expected) in table {
            assert_eq!(
                map_transaction_status(status, fraud),
                Ok(expected),
                "{status} / {fraud:?}"
            );
        }
    }

    #[test]
    fn test_unknown_status_is_error() {
        assert_eq!(
            map_transaction_status("authorize", None),
            Err(StatusMapError::UnknownStatus("authorize".into()))
        );
        assert_eq!(
            map_transaction_status("", None),
            Err(StatusMapError::UnknownStatus(String::new()))
        );
        assert!(matches!(
            map_transaction_status("capture", Some("maybe")),
            Err(StatusMapError::UnknownFraudStatus { .. })
        ));
    }

    #[test]
    fn test_status_match_is_case_sensitive() {
        assert!(map_transaction_status("SETTLEMENT", None).is_err());
    }

    #[test]
    fn test_payment_applicability() {
        assert!(payment_applies(Unpaid, Packed));
        assert!(payment_applies(Unpaid, Cancelled));
        assert!(payment_applies(Packed, Cancelled));

        assert!(!payment_applies(Unpaid, Unpaid));
        assert!(!payment_applies(Packed, Packed));
        assert!(!payment_applies(Packed, Unpaid));
        assert!(!payment_applies(Shipped, Cancelled));
        assert!(!payment_applies(Cancelled, Packed));
        assert!(!payment_applies(Completed, Cancelled));
    }
}
