//! Tests for key canonicalization.

use storagebus_storage::{DEFAULT_SEPARATOR, sanitize};

#[test]
fn test_numbers_become_strings() {
    assert_eq!(sanitize(123, "-").unwrap(), "123");
    assert_eq!(sanitize(-7i64, "-").unwrap(), "-7");
    assert_eq!(sanitize(1.5, "-").unwrap(), "1.5");
    assert_eq!(sanitize(123.0, "-").unwrap(), "123");
}

#[test]
fn test_numbers_skip_separator_validation() {
    assert_eq!(sanitize(42, "|").unwrap(), "42");
}

#[test]
fn test_invalid_keys() {
    assert!(sanitize("", "-").unwrap_err().is_invalid_argument());
    assert!(sanitize(f64::NAN, "-").unwrap_err().is_invalid_argument());
    assert!(sanitize(f64::INFINITY, "-").unwrap_err().is_invalid_argument());
}

#[test]
fn test_valid_keys_are_unchanged() {
    let key = "my.great_photos-2014/jan/myvacation.jpg";
    assert_eq!(sanitize(key, DEFAULT_SEPARATOR).unwrap(), key);
}

#[test]
fn test_spaces_are_trimmed_and_replaced() {
    assert_eq!(sanitize("  a b  ", "-").unwrap(), "a-b");
    assert_eq!(
        sanitize("   my.great_photos 2014/jan/myvacation.jpg    ", "-").unwrap(),
        "my.great_photos-2014/jan/myvacation.jpg"
    );
    assert_eq!(sanitize("test test test", "-").unwrap(), "test-test-test");
    assert_eq!(sanitize("test test test", "/").unwrap(), "test/test/test");
    assert_eq!(sanitize("a/b", "/").unwrap(), "a/b");
}

#[test]
fn test_illegal_characters_are_stripped() {
    assert_eq!(sanitize("123#@%$^&@456!-)+=*_", "-").unwrap(), "123456!-)*_");
    assert_eq!(sanitize("a\\b", "-").unwrap(), "ab");
    assert_eq!(sanitize("日本 語", "-").unwrap(), "-");
}

#[test]
fn test_latin_characters_are_folded() {
    assert_eq!(sanitize("áêīòü", "-").unwrap(), "aeiou");
    assert_eq!(sanitize("Straße Œuvre", "-").unwrap(), "Strasse-OEuvre");
    assert_eq!(sanitize("Łódź", "_").unwrap(), "Lodz");
}

#[test]
fn test_invalid_separators() {
    assert!(sanitize("a b", "|").unwrap_err().is_invalid_separator());
    assert!(sanitize("a b", "~").unwrap_err().is_invalid_separator());
    assert!(sanitize("a b", "").unwrap_err().is_invalid_separator());
}

#[test]
fn test_sanitize_is_idempotent() {
    let keys = [
        "  reports/Q3 summary (final).pdf ",
        "áêīòü über café",
        "123#@%$^&@456!-)+=*_",
        "a #",
        "docs/ünïcödé/read me.md",
    ];
    for key in keys {
        let once = sanitize(key, DEFAULT_SEPARATOR).unwrap();
        let twice = sanitize(once.as_str(), DEFAULT_SEPARATOR).unwrap();
        assert_eq!(once, twice, "sanitize is not idempotent for {:?}", key);
        assert!(
            once.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!_.*'()-/".contains(c)),
            "unsafe character in {:?}",
            once
        );
    }
}
