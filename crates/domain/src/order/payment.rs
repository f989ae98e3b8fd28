//! Payment methods and details (simulated — no gateway integration).

use serde::{Deserialize, Serialize};

use super::OrderError;

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    Card,
    Bkash,
    Nagad,
    Rocket,
}

impl PaymentMethod {
    /// Mobile-banking methods need a sender number and transaction id.
    pub fn requires_mobile_banking_details(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Bkash | PaymentMethod::Nagad | PaymentMethod::Rocket
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::Card => "card",
            PaymentMethod::Bkash => "bkash",
            PaymentMethod::Nagad => "nagad",
            PaymentMethod::Rocket => "rocket",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mobile-banking transaction fields, present when the method needs them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub mobile_number: Option<String>,
    pub transaction_number: Option<String>,
}

/// Payment information frozen onto an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    #[serde(default)]
    pub details: PaymentDetails,
}

impl Payment {
    /// Builds a payment, enforcing that mobile-banking methods carry both
    /// transaction fields.
    pub fn new(method: PaymentMethod, details: PaymentDetails) -> Result<Self, OrderError> {
        if method.requires_mobile_banking_details() {
            let complete = details
                .mobile_number
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty())
                && details
                    .transaction_number
                    .as_deref()
                    .is_some_and(|s| !s.trim().is_empty());
            if !complete {
                return Err(OrderError::MissingPaymentDetails { method });
            }
        }
        Ok(Self { method, details })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_on_delivery_needs_no_details() {
        let payment = Payment::new(PaymentMethod::CashOnDelivery, PaymentDetails::default());
        assert!(payment.is_ok());
    }

    #[test]
    fn test_mobile_banking_requires_both_fields() {
        let result = Payment::new(
            PaymentMethod::Bkash,
            PaymentDetails {
                mobile_number: Some("01700000000".to_string()),
                transaction_number: None,
            },
        );
        assert_eq!(
            result,
            Err(OrderError::MissingPaymentDetails {
                method: PaymentMethod::Bkash
            })
        );
    }

    #[test]
    fn test_mobile_banking_rejects_blank_fields() {
        let result = Payment::new(
            PaymentMethod::Nagad,
            PaymentDetails {
                mobile_number: Some("  ".to_string()),
                transaction_number: Some("TXN123".to_string()),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mobile_banking_complete_details() {
        let payment = Payment::new(
            PaymentMethod::Rocket,
            PaymentDetails {
                mobile_number: Some("01700000000".to_string()),
                transaction_number: Some("TXN123".to_string()),
            },
        );
        assert!(payment.is_ok());
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"cash_on_delivery\""
        );
    }
}
