//! Payment-method rules deriving the net amount that reaches a cash box.

use crate::entry::PaymentMethod;
use crate::error::{LedgerError, Result};
use crate::money::Money;
use rust_decimal::Decimal;

/// Derives the net amount for a gross `amount`.
///
/// InstaPay withholds `commission` before the money reaches the box, so the
/// net is `amount - commission` with `0 <= commission <= amount`. Every other
/// method passes the amount through and must not carry a commission.
pub fn resolve_net_amount(
    amount: Money,
    method: PaymentMethod,
    commission: Option<Money>,
) -> Result<Money> {
    match (method.carries_commission(), commission) {
        (false, Some(_)) => Err(LedgerError::UnexpectedCommission {
            method: method.to_string(),
        }),
        (false, None) | (true, None) => Ok(amount),
        (true, Some(commission)) => {
            if commission.is_negative() || commission > amount {
                return Err(LedgerError::InvalidCommission { amount, commission });
            }
            Ok(amount - commission)
        }
    }
}

/// Suggested InstaPay fee for a transfer of `amount`.
///
/// Nothing below 100; 0.50 up to 500; above 500 another 0.10 per started
/// 100, capped at 20.00. Callers use it to pre-fill a draft; the resolver
/// never applies it on its own.
pub fn suggest_instapay_commission(amount: Money) -> Money {
    let amount = amount.as_decimal();
    let hundred = Decimal::ONE_HUNDRED;
    let five_hundred = Decimal::new(500, 0);
    let base = Decimal::new(50, 2);
    let step = Decimal::new(10, 2);
    let cap = Decimal::new(20, 0);

    let fee = if amount < hundred {
        Decimal::ZERO
    } else if amount <= five_hundred {
        base
    } else {
        let started = ((amount - five_hundred) / hundred).ceil();
        base + started * step
    };

    Money::new(fee.min(cap))
}
