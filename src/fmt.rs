use rust_decimal::Decimal;

/// Format an amount in peso style: `$1.234.567`, with `,` decimals only when
/// the amount has cents (`$1.234,50`).
pub fn money(val: Decimal) -> String {
    let negative = val.is_sign_negative() && !val.is_zero();
    let rounded = val.abs().round_dp(2);
    let cents = format!("{:.2}", rounded);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_dots = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_dots.push('.');
        }
        with_dots.push(c);
    }
    let with_dots: String = with_dots.chars().rev().collect();

    let sign = if negative { "-" } else { "" };
    if dec_part == "00" {
        format!("{sign}${with_dots}")
    } else {
        format!("{sign}${with_dots},{dec_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(Decimal::new(1234567, 0)), "$1.234.567");
        assert_eq!(money(Decimal::new(-500, 0)), "-$500");
        assert_eq!(money(Decimal::ZERO), "$0");
        assert_eq!(money(Decimal::new(123450, 2)), "$1.234,50");
        assert_eq!(money(Decimal::new(4210, 2)), "$42,10");
        assert_eq!(money(Decimal::new(1999, 3)), "$2");
    }
}
