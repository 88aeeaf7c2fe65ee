// Amount parsing (text-to-cents, no f64 on the text path)

/// Parse a monetary string to i64 minor units (cents).
///
/// Accepts "1234.56", "1,234.5", "$1,234", "€ 12.00", "-3.10" and the
/// accounting form "(12.00)" for negatives. Extra decimal places round to the
/// nearest cent, half away from zero, matching `minor_from_float`.
pub fn parse_money_minor(raw: &str) -> Result<i64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty amount".to_string());
    }

    let (parens, inner) = match trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',') && !c.is_whitespace())
        .collect();

    let (sign_negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    if parens && sign_negative {
        return Err(format!("ambiguous sign: {}", raw.trim()));
    }
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(format!("not a number: {}", raw.trim()));
    }

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if frac.contains('.') {
        return Err(format!("not a number: {}", raw.trim()));
    }
    if whole.is_empty() && frac.is_empty() {
        return Err(format!("not a number: {}", raw.trim()));
    }

    let units: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|e| format!("bad amount: {}", e))?
    };
    let cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|e| format!("bad cents: {}", e))? * 10,
        2 => frac.parse().map_err(|e| format!("bad cents: {}", e))?,
        _ => {
            let kept: i64 = frac[..2].parse().map_err(|e| format!("bad cents: {}", e))?;
            let round_up = frac.as_bytes()[2] >= b'5';
            kept + i64::from(round_up)
        }
    };

    let minor = units
        .checked_mul(100)
        .and_then(|u| u.checked_add(cents))
        .ok_or_else(|| format!("amount out of range: {}", raw.trim()))?;
    Ok(if parens || sign_negative { -minor } else { minor })
}

/// Convert a numeric spreadsheet cell to cents, rounded to the nearest cent.
pub fn minor_from_float(value: f64) -> Result<i64, String> {
    if !value.is_finite() {
        return Err(format!("not a finite amount: {}", value));
    }
    let scaled = (value * 100.0).round();
    if scaled.abs() >= i64::MAX as f64 {
        return Err(format!("amount out of range: {}", value));
    }
    Ok(scaled as i64)
}

/// Render cents as a plain two-decimal string ("-12.05").
pub fn format_minor(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_amounts() {
        assert_eq!(parse_money_minor("1234.56"), Ok(123456));
        assert_eq!(parse_money_minor("1234.5"), Ok(123450));
        assert_eq!(parse_money_minor("1234"), Ok(123400));
        assert_eq!(parse_money_minor(".75"), Ok(75));
        assert_eq!(parse_money_minor("-3.10"), Ok(-310));
        assert_eq!(parse_money_minor("+3"), Ok(300));
    }

    #[test]
    fn currency_symbols_and_separators() {
        assert_eq!(parse_money_minor("$1,234.56"), Ok(123456));
        assert_eq!(parse_money_minor("€ 12.00"), Ok(1200));
        assert_eq!(parse_money_minor("£7"), Ok(700));
        assert_eq!(parse_money_minor("  1 000.01 "), Ok(100001));
    }

    #[test]
    fn parenthesized_negative() {
        assert_eq!(parse_money_minor("(12.00)"), Ok(-1200));
        assert_eq!(parse_money_minor("($1,000.50)"), Ok(-100050));
        assert!(parse_money_minor("(-5)").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_money_minor("").is_err());
        assert!(parse_money_minor("abc").is_err());
        assert!(parse_money_minor("1.2.3").is_err());
        assert!(parse_money_minor("$").is_err());
        assert!(parse_money_minor(".").is_err());
    }

    #[test]
    fn extra_decimals_round_like_float_cells() {
        assert_eq!(parse_money_minor("12.345"), Ok(1235));
        assert_eq!(parse_money_minor("12.344999"), Ok(1234));
        assert_eq!(parse_money_minor("0.995"), Ok(100));
        assert_eq!(parse_money_minor("-12.345"), Ok(-1235));
        assert_eq!(parse_money_minor("(1,000.005)"), Ok(-100001));
    }

    #[test]
    fn two_decimal_inputs_are_exact() {
        for cents in [0i64, 1, 9, 10, 99, 100, 101, 123456789, 10000000001] {
            let text = format_minor(cents);
            assert_eq!(parse_money_minor(&text), Ok(cents), "{}", text);
        }
    }

    #[test]
    fn float_cells_round_to_cents() {
        assert_eq!(minor_from_float(100.0), Ok(10000));
        assert_eq!(minor_from_float(0.1 + 0.2), Ok(30));
        assert_eq!(minor_from_float(-12.346), Ok(-1235));
        assert!(minor_from_float(f64::NAN).is_err());
    }

    #[test]
    fn format_negative() {
        assert_eq!(format_minor(-1205), "-12.05");
        assert_eq!(format_minor(5), "0.05");
    }
}
