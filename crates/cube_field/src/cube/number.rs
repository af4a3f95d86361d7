//! Fixed-width number formatting used by cube files.
//!
//! Cube files written by Gaussian-compatible tools use a space in place of a plus sign and
//! always print at least two exponent digits with an explicit sign, e.g. ` 1.23450E-03`.

/// Fixed-point with a leading space for non-negative values, e.g. ` 0.500000` / `-0.500000`.
pub(crate) fn signed_fixed(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return signed_non_finite(value, false);
    }
    if value.is_sign_negative() {
        format!("{:.*}", precision, value)
    } else {
        format!(" {:.*}", precision, value)
    }
}

/// Scientific notation with a leading space for non-negative values and a signed two-digit
/// exponent, e.g. ` 1.23450E-03`.
pub(crate) fn signed_scientific(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return signed_non_finite(value, true);
    }
    let sign = if value.is_sign_negative() { '-' } else { ' ' };
    let rendered = format!("{:.*E}", precision, value.abs());
    match rendered.split_once('E') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let exponent_sign = if exponent < 0 { '-' } else { '+' };
            format!(
                "{}{}E{}{:02}",
                sign,
                mantissa,
                exponent_sign,
                exponent.unsigned_abs()
            )
        }
        None => format!("{}{}", sign, rendered),
    }
}

fn signed_non_finite(value: f64, upper: bool) -> String {
    let text = if value.is_nan() {
        " nan"
    } else if value > 0.0 {
        " inf"
    } else {
        "-inf"
    };
    if upper {
        text.to_uppercase()
    } else {
        text.to_owned()
    }
}
