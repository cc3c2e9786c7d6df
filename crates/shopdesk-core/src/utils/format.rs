/// Format an amount of money for display, e.g. `$45.00`
pub fn format_money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", -amount)
    } else {
        format!("${:.2}", amount)
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None or empty
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.format("%b %d, %Y").to_string()
    } else if date.len() >= 10 && date.is_char_boundary(10) {
        // Try to parse YYYY-MM-DD format
        date[..10].to_string()
    } else {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(45.0), "$45.00");
        assert_eq!(format_money(25.999), "$26.00");
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(-3.5), "-$3.50");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        // Counts characters, not bytes
        assert_eq!(truncate_string("ភ្នំពេញ", 7), "ភ្នំពេញ");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(&Some("Shirts".into()), "-"), "Shirts");
        assert_eq!(format_optional(&Some(String::new()), "-"), "-");
        assert_eq!(format_optional(&None, "-"), "-");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2026-02-18T10:30:00"), "Feb 18, 2026");
        assert_eq!(format_date("2026-02-18T10:30:00.123456"), "Feb 18, 2026");
        assert_eq!(format_date("2026-02-18T10:30:00Z"), "Feb 18, 2026");
        assert_eq!(format_date("2026-02-18"), "2026-02-18");
        assert_eq!(format_date("soon"), "soon");
    }
}
