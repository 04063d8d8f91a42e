// Copyright (c) 2024 The Botho Foundation

//! Exchange policy and the payment validation gate.

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};

use crate::{
    outcome::RejectionReason,
    payment::{IncomingPayment, PaymentCategory},
};

/// Parameters of one exchange run, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangePolicy {
    /// Our address that must have received the payment
    pub expected_receive_address: String,

    /// Asset dispensed in return
    pub asset_name: String,

    /// Asset units per whole native unit; `None` means 1
    pub multiplier: Option<u32>,

    /// Minimum confirmations on the incoming payment
    pub min_confirmations: u32,
}

impl ExchangePolicy {
    /// Effective multiplier.
    pub fn multiplier(&self) -> u32 {
        self.multiplier.unwrap_or(1)
    }

    /// Check the policy parameters themselves.
    pub fn validate(&self) -> Result<(), String> {
        if self.expected_receive_address.is_empty() {
            return Err("receive address cannot be empty".to_string());
        }
        if self.asset_name.is_empty() {
            return Err("asset name cannot be empty".to_string());
        }
        if self.multiplier == Some(0) {
            return Err("multiplier must be at least 1".to_string());
        }
        Ok(())
    }

    /// Run the validation gate against a payment.
    ///
    /// Checks run in order and stop at the first failure:
    /// category, receive address, whole amount, confirmations. On success
    /// returns the asset quantity owed for the payment.
    pub fn check(&self, payment: &IncomingPayment) -> Result<u64, RejectionReason> {
        if payment.category != PaymentCategory::Receive {
            return Err(RejectionReason::NotAReceive {
                category: payment.category,
            });
        }

        if payment.receive_address != self.expected_receive_address {
            return Err(RejectionReason::AddressMismatch {
                expected: self.expected_receive_address.clone(),
                actual: payment.receive_address.clone(),
            });
        }

        if payment.amount.floor() < Decimal::ONE {
            return Err(RejectionReason::BelowMinimumAmount {
                amount: payment.amount,
            });
        }

        if payment.confirmations < i64::from(self.min_confirmations) {
            return Err(RejectionReason::InsufficientConfirmations {
                required: self.min_confirmations,
                actual: payment.confirmations,
            });
        }

        Ok(exchange_quantity(payment.amount, self.multiplier))
    }
}

/// Asset quantity owed for `amount` native units.
///
/// The fractional part of the amount is dropped, so partial payments never
/// round up. Negative amounts give 0 and the product saturates at
/// `u64::MAX`.
pub fn exchange_quantity(amount: Decimal, multiplier: Option<u32>) -> u64 {
    let whole = amount.floor();
    if whole.is_sign_negative() {
        return 0;
    }
    let whole = whole.to_u64().unwrap_or(u64::MAX);
    whole.saturating_mul(u64::from(multiplier.unwrap_or(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const OUR_ADDRESS: &str = "RKw8d3BzLgkQ6pG2iZ8kUcAGS9mX4wNvRj";

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn policy(multiplier: Option<u32>, min_confirmations: u32) -> ExchangePolicy {
        ExchangePolicy {
            expected_receive_address: OUR_ADDRESS.to_string(),
            asset_name: "BRIDGE_TOKEN".to_string(),
            multiplier,
            min_confirmations,
        }
    }

    fn payment(category: PaymentCategory, amount: &str, confirmations: i64) -> IncomingPayment {
        IncomingPayment {
            category,
            receive_address: OUR_ADDRESS.to_string(),
            amount: dec(amount),
            confirmations,
        }
    }

    #[test]
    fn test_quantity_floors_fraction() {
        assert_eq!(exchange_quantity(dec("5.7"), Some(10)), 50);
        assert_eq!(exchange_quantity(dec("3"), Some(1)), 3);
        assert_eq!(exchange_quantity(dec("0.99999999"), Some(1000)), 0);
        assert_eq!(exchange_quantity(dec("12.00000001"), None), 12);
    }

    #[test]
    fn test_quantity_matches_floor_times_multiplier() {
        for amount in ["0", "1", "1.5", "2.25", "99.999", "1000000.1"] {
            for multiplier in [1u32, 2, 7, 100, 12345] {
                let expected = dec(amount).floor().to_u64().unwrap() * u64::from(multiplier);
                assert_eq!(exchange_quantity(dec(amount), Some(multiplier)), expected);
            }
        }
    }

    #[test]
    fn test_quantity_edges() {
        assert_eq!(exchange_quantity(dec("-4.5"), Some(10)), 0);
        assert_eq!(exchange_quantity(Decimal::MAX, Some(u32::MAX)), u64::MAX);
        assert_eq!(exchange_quantity(dec("18446744073709551615"), Some(2)), u64::MAX);
    }

    #[test]
    fn test_check_passes() {
        let quantity = policy(Some(10), 1)
            .check(&payment(PaymentCategory::Receive, "5.7", 3))
            .unwrap();
        assert_eq!(quantity, 50);
    }

    #[test]
    fn test_send_always_rejected() {
        // Everything else about this payment is acceptable
        let reason = policy(None, 0)
            .check(&payment(PaymentCategory::Send, "100", 100))
            .unwrap_err();
        assert_eq!(
            reason,
            RejectionReason::NotAReceive {
                category: PaymentCategory::Send
            }
        );
    }

    #[test]
    fn test_address_mismatch() {
        let mut incoming = payment(PaymentCategory::Receive, "5", 3);
        incoming.receive_address = "RSomeoneElse".to_string();

        let reason = policy(None, 1).check(&incoming).unwrap_err();
        assert_eq!(
            reason,
            RejectionReason::AddressMismatch {
                expected: OUR_ADDRESS.to_string(),
                actual: "RSomeoneElse".to_string(),
            }
        );
    }

    #[test]
    fn test_below_minimum_amount() {
        let reason = policy(None, 1)
            .check(&payment(PaymentCategory::Receive, "0.9", 3))
            .unwrap_err();
        assert_eq!(
            reason,
            RejectionReason::BelowMinimumAmount { amount: dec("0.9") }
        );
    }

    #[test]
    fn test_insufficient_confirmations() {
        let reason = policy(None, 1)
            .check(&payment(PaymentCategory::Receive, "2", 0))
            .unwrap_err();
        assert_eq!(
            reason,
            RejectionReason::InsufficientConfirmations {
                required: 1,
                actual: 0
            }
        );
    }

    #[test]
    fn test_checks_short_circuit_in_order() {
        // Wrong category, wrong address, tiny amount, no confirmations:
        // only the first failing rule is reported.
        let mut incoming = payment(PaymentCategory::Other, "0.1", 0);
        incoming.receive_address = "RSomeoneElse".to_string();
        assert!(matches!(
            policy(None, 6).check(&incoming),
            Err(RejectionReason::NotAReceive { .. })
        ));

        incoming.category = PaymentCategory::Receive;
        assert!(matches!(
            policy(None, 6).check(&incoming),
            Err(RejectionReason::AddressMismatch { .. })
        ));

        incoming.receive_address = OUR_ADDRESS.to_string();
        assert!(matches!(
            policy(None, 6).check(&incoming),
            Err(RejectionReason::BelowMinimumAmount { .. })
        ));
    }

    #[test]
    fn test_policy_validate() {
        assert!(policy(None, 0).validate().is_ok());
        assert!(policy(Some(0), 0).validate().is_err());

        let mut no_asset = policy(None, 1);
        no_asset.asset_name.clear();
        assert!(no_asset.validate().is_err());
    }
}
