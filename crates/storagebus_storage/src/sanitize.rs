//! Key canonicalization.
//!
//! Keys are trimmed, Latin letters with diacritics are folded to ASCII,
//! characters outside the safe set are dropped and spaces become the
//! separator. Numbers bypass all of this and are returned in decimal form.

use std::borrow::Cow;
use storagebus_error::{ArgumentError, ArgumentErrorKind, StorageBusResult};

/// Separator substituted for spaces unless configured otherwise.
pub const DEFAULT_SEPARATOR: &str = "-";

/// A key as supplied by a caller: text or a number.
#[derive(Debug, Clone, PartialEq)]
pub enum RawKey<'a> {
    /// Text key, canonicalized by [`sanitize`]
    Text(Cow<'a, str>),
    /// Integer key, rendered verbatim
    Integer(i128),
    /// Floating point key, rendered verbatim when finite
    Float(f64),
}

impl<'a> From<&'a str> for RawKey<'a> {
    fn from(key: &'a str) -> Self {
        RawKey::Text(Cow::Borrowed(key))
    }
}

impl<'a> From<&'a String> for RawKey<'a> {
    fn from(key: &'a String) -> Self {
        RawKey::Text(Cow::Borrowed(key.as_str()))
    }
}

impl From<String> for RawKey<'_> {
    fn from(key: String) -> Self {
        RawKey::Text(Cow::Owned(key))
    }
}

macro_rules! integer_keys {
    ($($ty:ty),*) => {
        $(impl From<$ty> for RawKey<'_> {
            fn from(key: $ty) -> Self {
                RawKey::Integer(i128::from(key))
            }
        })*
    };
}

integer_keys!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f32> for RawKey<'_> {
    fn from(key: f32) -> Self {
        RawKey::Float(f64::from(key))
    }
}

impl From<f64> for RawKey<'_> {
    fn from(key: f64) -> Self {
        RawKey::Float(key)
    }
}

/// Canonicalize `key` into a backend-safe object key.
///
/// The output only contains `[0-9A-Za-z!_.*'()/-]` plus whatever the
/// separator contributes, and sanitizing it again with the same separator
/// returns it unchanged.
///
/// # Errors
///
/// - `InvalidArgument` for an empty text key or a non-finite number.
/// - `InvalidSeparator` when `separator` is empty or contains a character
///   outside the safe set.
///
/// # Examples
///
/// ```
/// use storagebus_storage::sanitize;
///
/// assert_eq!(sanitize(123, "-").unwrap(), "123");
/// assert_eq!(sanitize("  my photos/été 2014.jpg ", "-").unwrap(), "my-photos/ete-2014.jpg");
/// assert!(sanitize("a b", "|").unwrap_err().is_invalid_separator());
/// ```
pub fn sanitize<'a>(key: impl Into<RawKey<'a>>, separator: &str) -> StorageBusResult<String> {
    let text = match key.into() {
        RawKey::Integer(n) => return Ok(n.to_string()),
        RawKey::Float(n) if n.is_finite() => return Ok(n.to_string()),
        RawKey::Float(n) => {
            return Err(ArgumentError::invalid(format!(
                "Expected non-empty string or number, got {}",
                n
            ))
            .into());
        }
        RawKey::Text(text) => text,
    };

    if text.is_empty() {
        return Err(ArgumentError::invalid(
            "Expected non-empty string or number, got an empty string",
        )
        .into());
    }
    validate_separator(separator)?;

    let mut folded = String::with_capacity(text.len());
    for c in text.trim().chars() {
        match fold_latin(c) {
            Some(ascii) => folded.push_str(ascii),
            None => folded.push(c),
        }
    }

    let mut key = String::with_capacity(folded.len());
    for c in folded.chars().filter(|c| is_safe(*c)) {
        if c == ' ' {
            key.push_str(separator);
        } else {
            key.push(c);
        }
    }
    Ok(key)
}

/// Check that `separator` may be substituted for spaces.
///
/// # Errors
///
/// Returns `InvalidSeparator` if it is empty or contains an unsafe character.
pub fn validate_separator(separator: &str) -> StorageBusResult<()> {
    if separator.is_empty() || !separator.chars().all(is_safe) {
        return Err(ArgumentError::new(ArgumentErrorKind::InvalidSeparator(
            separator.to_string(),
        ))
        .into());
    }
    Ok(())
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '!' | ' ' | '_' | '.' | '*' | '\'' | '(' | ')' | '-' | '/')
}

/// ASCII transliteration of Latin-1 Supplement and Latin Extended-A letters.
fn fold_latin(c: char) -> Option<&'static str> {
    let ascii = match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' | 'Ć' | 'Ĉ' | 'Ċ' | 'Č' => "C",
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => "c",
        'Ð' | 'Ď' | 'Đ' => "D",
        'ð' | 'ď' | 'đ' => "d",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => "e",
        'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => "G",
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => "g",
        'Ĥ' | 'Ħ' => "H",
        'ĥ' | 'ħ' => "h",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => "I",
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => "i",
        'Ĳ' => "IJ",
        'ĳ' => "ij",
        'Ĵ' => "J",
        'ĵ' => "j",
        'Ķ' => "K",
        'ķ' | 'ĸ' => "k",
        'Ĺ' | 'Ļ' | 'Ľ' | 'Ŀ' | 'Ł' => "L",
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => "l",
        'Ñ' | 'Ń' | 'Ņ' | 'Ň' | 'Ŋ' => "N",
        'ñ' | 'ń' | 'ņ' | 'ň' | 'ŉ' | 'ŋ' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ŏ' | 'Ő' => "O",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => "o",
        'Œ' => "OE",
        'œ' => "oe",
        'Ŕ' | 'Ŗ' | 'Ř' => "R",
        'ŕ' | 'ŗ' | 'ř' => "r",
        'Ś' | 'Ŝ' | 'Ş' | 'Š' => "S",
        'ś' | 'ŝ' | 'ş' | 'š' | 'ſ' => "s",
        'ß' => "ss",
        'Ţ' | 'Ť' | 'Ŧ' => "T",
        'ţ' | 'ť' | 'ŧ' => "t",
        'Þ' => "TH",
        'þ' => "th",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => "U",
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => "u",
        'Ŵ' => "W",
        'ŵ' => "w",
        'Ý' | 'Ÿ' | 'Ŷ' => "Y",
        'ý' | 'ÿ' | 'ŷ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(ascii)
}
