/// Parses a duration string into a number of milliseconds.
///
/// The string is a sequence of `<digits><unit>` groups, where unit is one of `ms`, `s`, `m`,
/// `h` or `d`. Groups are summed, so `1m30s` is 90 000 milliseconds.
///
/// Returns `None` if the input is empty, malformed, or overflows.
///
/// # Examples
///
/// ```
/// use filekit_utils::time::parse_duration;
///
/// assert_eq!(parse_duration("30s"), Some(30_000));
/// assert_eq!(parse_duration("1m500ms"), Some(60_500));
/// ```
pub fn parse_duration(input: &str) -> Option<u64> {
    let mut total: u64 = 0;
    let mut chars = input.trim().chars().peekable();

    chars.peek()?;

    while chars.peek().is_some() {
        let mut number_str = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                number_str.push(c);
                chars.next();
            } else {
                break;
            }
        }

        if number_str.is_empty() {
            return None;
        }

        let number: u64 = number_str.parse().ok()?;
        let multiplier = match chars.next()? {
            'm' if chars.peek() == Some(&'s') => {
                chars.next();
                1
            }
            's' => 1000,
            'm' => 60 * 1000,
            'h' => 60 * 60 * 1000,
            'd' => 24 * 60 * 60 * 1000,
            _ => return None,
        };

        total = total.checked_add(number.checked_mul(multiplier)?)?;
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("250ms"), Some(250));
        assert_eq!(parse_duration("1s"), Some(1000));
        assert_eq!(parse_duration("1m"), Some(60 * 1000));
        assert_eq!(parse_duration("1h"), Some(60 * 60 * 1000));
        assert_eq!(parse_duration("1d"), Some(24 * 60 * 60 * 1000));
        assert_eq!(parse_duration("1m30s"), Some(90 * 1000));
        assert_eq!(parse_duration(" 30s "), Some(30 * 1000));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("30"), None);
        assert_eq!(parse_duration("1s1"), None);
        assert_eq!(parse_duration("1x"), None);
        assert_eq!(parse_duration("fail"), None);
        assert_eq!(parse_duration("99999999999999999999d"), None);
    }
}
