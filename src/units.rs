//! Human-readable display amounts ("1000.5" <-> WAD-scaled integers)

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{LedgerError, Result};
use crate::fixed::{WAD, WAD_DECIMALS};

pub fn parse_units(text: &str) -> Result<u128> {
    let value = Decimal::from_str(text.trim())
        .map_err(|e| LedgerError::InvalidAmount(format!("{}: {}", text, e)))?;
    if value.is_sign_negative() {
        return Err(LedgerError::InvalidAmount(format!("{}: negative", text)));
    }
    if value.scale() > WAD_DECIMALS {
        return Err(LedgerError::InvalidAmount(format!(
            "{}: more than {} decimal places",
            text, WAD_DECIMALS
        )));
    }

    let int = value.trunc();
    let whole = int.mantissa() as u128 / 10u128.pow(int.scale());
    let fract = value.fract();
    let frac = fract.mantissa() as u128 * 10u128.pow(WAD_DECIMALS - fract.scale());

    whole
        .checked_mul(WAD)
        .and_then(|w| w.checked_add(frac))
        .ok_or(LedgerError::Overflow)
}

pub fn format_units(amount: u128) -> String {
    let whole = amount / WAD;
    let frac = amount % WAD;
    if frac == 0 {
        return whole.to_string();
    }
    // Fractional part always fits a Decimal mantissa
    match Decimal::try_from_i128_with_scale(frac as i128, WAD_DECIMALS) {
        Ok(d) => {
            let frac_text = d.normalize().to_string();
            format!("{}{}", whole, frac_text.trim_start_matches('0'))
        }
        Err(_) => format!("{}.{:018}", whole, frac),
    }
}
