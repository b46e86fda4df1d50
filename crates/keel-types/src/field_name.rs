//! Struct field name rules.
//!
//! A valid field (or struct) name starts with an ASCII letter and continues
//! with ASCII letters, digits or `_`:
//!
//! ```text
//! [a-zA-Z][a-zA-Z0-9_]*
//! ```
//!
//! Importers that take names from arbitrary text (CSV headers, JSON keys) use
//! [`camel_case_field_name`] for a best-effort readable name, or
//! [`escape_struct_field`] for a lossless one.

/// Escape marker used by [`escape_struct_field`]. Always escaped itself.
pub const ESCAPE_CHAR: char = 'Q';

/// Characters allowed as the first character of a name.
fn is_head_char(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

/// Characters allowed after the first character of a name.
fn is_tail_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Returns whether `name` is usable as a struct field name.
///
/// # Examples
///
/// ```
/// use keel_types::field_name::is_valid_field_name;
///
/// assert!(is_valid_field_name("given"));
/// assert!(is_valid_field_name("a_1"));
/// assert!(!is_valid_field_name("1a"));
/// assert!(!is_valid_field_name(""));
/// ```
pub fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_head_char(first) => chars.all(is_tail_char),
        _ => false,
    }
}

/// Walk `input`, checking the first character against the head rule and
/// the rest against the tail rule, and let `encode` decide what each
/// character becomes.
fn map_field_chars(input: &str, mut encode: impl FnMut(char, bool) -> Option<String>) -> String {
    let mut output = String::with_capacity(input.len());
    let mut head = true;
    for ch in input.chars() {
        let allowed = if head { is_head_char(ch) } else { is_tail_char(ch) };
        if let Some(piece) = encode(ch, allowed) {
            output.push_str(&piece);
        }
        head = false;
    }
    output
}

/// Turn free text into a camelCase field name.
///
/// Characters that are not allowed at their position are dropped (spaces
/// are kept as word breaks), the first word is lower-cased and every
/// following word is capitalised. Returns an empty string when nothing
/// usable remains; callers treat that as "no name", not as an error.
pub fn camel_case_field_name(input: &str) -> String {
    let stripped = map_field_chars(input, |ch, allowed| {
        (allowed || ch == ' ').then(|| ch.to_string())
    });

    let mut words = stripped.split_whitespace();
    let Some(first) = words.next() else {
        return String::new();
    };

    let mut output = first.to_lowercase();
    for word in words {
        let lower = word.to_lowercase();
        let mut chars = lower.chars();
        if let Some(initial) = chars.next() {
            output.extend(initial.to_uppercase());
            output.push_str(chars.as_str());
        }
    }

    // Dropping characters can leave a name that starts with a digit or `_`.
    if is_valid_field_name(&output) {
        output
    } else {
        String::new()
    }
}

/// Escape arbitrary text into a valid field name without losing
/// information.
///
/// Names that are already valid and do not contain [`ESCAPE_CHAR`] are
/// returned unchanged. Otherwise every character that is not allowed at its
/// position, and every `Q`, becomes `Q` followed by the upper-case hex of its
/// UTF-8 bytes.
///
/// ```
/// use keel_types::field_name::escape_struct_field;
///
/// assert_eq!(escape_struct_field("abc"), "abc");
/// assert_eq!(escape_struct_field("1a"), "Q31a");
/// assert_eq!(escape_struct_field("Quote"), "Q51uote");
/// ```
pub fn escape_struct_field(input: &str) -> String {
    if !input.contains(ESCAPE_CHAR) && is_valid_field_name(input) {
        return input.to_string();
    }

    map_field_chars(input, |ch, allowed| {
        if allowed && ch != ESCAPE_CHAR {
            return Some(ch.to_string());
        }
        let mut buf = [0u8; 4];
        let encoded = hex::encode_upper(ch.encode_utf8(&mut buf).as_bytes());
        Some(format!("{ESCAPE_CHAR}{encoded}"))
    })
}
