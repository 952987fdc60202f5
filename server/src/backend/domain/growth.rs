//! Period-over-period growth in whole percent.
//!
//! Halves round toward positive infinity, so -12.5 becomes -12 and 12.5
//! becomes 13. There is no growth figure without a non-zero previous value.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Growth from `previous` to `current`; `None` when `previous` is zero
pub fn growth_percentage(current: Decimal, previous: Decimal) -> Option<i64> {
    if previous.is_zero() {
        return None;
    }
    let ratio = current
        .checked_sub(previous)?
        .checked_div(previous)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    (ratio + Decimal::new(5, 1)).floor().to_i64()
}
