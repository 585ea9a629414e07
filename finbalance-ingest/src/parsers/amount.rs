//! Locale-formatted amounts ("R$ 45,90", "1.200", "12.5") to f64.

/// Normalize a numeric substring into a value.
///
/// Keeps only digits, `,`, `.` and `-`, turns the first comma into a
/// decimal point and parses the longest leading `-?digits[.digits]` run.
/// Anything unparseable is 0; callers treat `<= 0` as "no amount".
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    let normalized = cleaned.replacen(',', ".", 1);
    leading_float(&normalized).unwrap_or(0.0)
}

fn leading_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    let value: f64 = s[..end].trim_end_matches('.').parse().ok()?;
    if value.is_finite() { Some(value) } else { None }
}
