use super::text::split_lines;
use crate::models::{StatValue, Stats};

/// Parse a stat cell such as `hp: 60` / `Special_Defense: 80` into stats.
///
/// Lines without a `:` are ignored. Keys are lowercased and underscores
/// become spaces; a line like `: 5` is kept under the empty key. A value
/// holding a number keeps its first digit run; anything else is kept as
/// trimmed text.
pub fn parse_stats(text: &str) -> Stats {
    let mut stats = Stats::default();
    for line in split_lines(text) {
        let line = line.trim().trim_matches(',').trim_matches('"');
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let key = key.trim().trim_matches('"').replace('_', " ");
        let key = key.trim().to_lowercase();

        stats.insert(key, parse_value(value));
    }
    stats
}

fn parse_value(value: &str) -> StatValue {
    let digits: String = value
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    match digits.parse::<i64>() {
        Ok(n) => StatValue::Number(n),
        Err(_) => StatValue::Text(value.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stats_basic() {
        let stats = parse_stats("hp:60\nattack:75\nSpecial_Defense: 80");
        assert_eq!(stats.get("hp"), Some(&StatValue::Number(60)));
        assert_eq!(stats.get("attack"), Some(&StatValue::Number(75)));
        assert_eq!(stats.get("special defense"), Some(&StatValue::Number(80)));
    }

    #[test]
    fn test_parse_stats_quotes_and_commas() {
        let stats = parse_stats("\"hp\": 45,\n  \"speed\": \"90\",  ");
        assert_eq!(stats.get("hp"), Some(&StatValue::Number(45)));
        assert_eq!(stats.get("speed"), Some(&StatValue::Number(90)));
    }

    #[test]
    fn test_parse_stats_first_digit_run() {
        let stats = parse_stats("speed: ~85 (110 mega)");
        assert_eq!(stats.get("speed"), Some(&StatValue::Number(85)));
    }

    #[test]
    fn test_parse_stats_text_fallback() {
        let stats = parse_stats("ability: Overgrow \nhp: 99999999999999999999999");
        assert_eq!(stats.get("ability"), Some(&StatValue::Text("Overgrow".into())));
        assert_eq!(
            stats.get("hp"),
            Some(&StatValue::Text("99999999999999999999999".into()))
        );
    }

    #[test]
    fn test_parse_stats_skips_lines_without_colon() {
        let stats = parse_stats("Base stats\n\nhp: 10");
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.get("hp"), Some(&StatValue::Number(10)));
    }

    #[test]
    fn test_parse_stats_keeps_empty_key() {
        let stats = parse_stats(": 5\rhp: 10");
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.get(""), Some(&StatValue::Number(5)));
        assert_eq!(stats.get("hp"), Some(&StatValue::Number(10)));
    }

    #[test]
    fn test_parse_stats_duplicate_key_overwrites() {
        let stats = parse_stats("HP: 10\nhp: 20");
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.get("hp"), Some(&StatValue::Number(20)));
    }
}
