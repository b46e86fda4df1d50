//! Field tag parsing.
//!
//! A tag is `"name,opt,opt"`: an optional explicit field name followed by
//! options. The tag `"-"` skips the field entirely.

use keel_types::{is_valid_field_name, TypeError};

use crate::error::{DeriveError, DeriveResult};

/// Parsed field tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct FieldTags {
    /// keel field name, explicit or defaulted from the native name.
    pub name: String,
    /// Field is optional in the derived type.
    pub omit_empty: bool,
    /// Map with empty-struct values derives as a set of its keys.
    pub set: bool,
    /// Field holds the struct's original value and has no field type.
    pub original: bool,
}

impl FieldTags {
    /// Whether `tag` drops the field from derivation entirely.
    pub(crate) fn skips(tag: Option<&str>) -> bool {
        tag == Some("-")
    }

    /// Parse a tag that does not [skip](FieldTags::skips) its field.
    pub(crate) fn parse(native_name: &str, tag: Option<&str>) -> DeriveResult<Self> {
        let mut parts = tag.unwrap_or("").split(',');
        let explicit = parts.next().unwrap_or("");
        let name = if explicit.is_empty() {
            lower_first(native_name)
        } else {
            explicit.to_string()
        };
        if !is_valid_field_name(&name) {
            return Err(TypeError::InvalidFieldName(name).into());
        }

        let mut tags = Self {
            name,
            ..Default::default()
        };
        for option in parts {
            match option {
                "omitempty" => tags.omit_empty = true,
                "set" => tags.set = true,
                "original" => tags.original = true,
                other => return Err(DeriveError::UnrecognizedTag(other.to_string())),
            }
        }
        Ok(tags)
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Native struct names keep their spelling with the first letter raised.
pub(crate) fn struct_name(native_name: &str) -> String {
    let mut chars = native_name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_lowers_first_letter() {
        let tags = FieldTags::parse("Given", None).unwrap();
        assert_eq!(tags.name, "given");
        assert!(!tags.omit_empty && !tags.set && !tags.original);

        assert_eq!(FieldTags::parse("abc", None).unwrap().name, "abc");
        assert_eq!(FieldTags::parse("XMLName", Some("")).unwrap().name, "xMLName");
    }

    #[test]
    fn explicit_name_is_kept_verbatim() {
        assert_eq!(FieldTags::parse("bbb", Some("B")).unwrap().name, "B");
        assert_eq!(FieldTags::parse("aaa", Some("a,omitempty")).unwrap().name, "a");
    }

    #[test]
    fn options() {
        let tags = FieldTags::parse("tags", Some(",set,omitempty")).unwrap();
        assert_eq!(tags.name, "tags");
        assert!(tags.set && tags.omit_empty && !tags.original);

        assert!(FieldTags::parse("orig", Some(",original")).unwrap().original);
    }

    #[test]
    fn skip_tag() {
        assert!(FieldTags::skips(Some("-")));
        assert!(!FieldTags::skips(Some("-,omitempty")));
        assert!(!FieldTags::skips(None));
    }

    #[test]
    fn invalid_names_fail() {
        let err = FieldTags::parse("x", Some("1a")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid struct field name: 1a");

        let err = FieldTags::parse("_hidden", None).unwrap_err();
        assert_eq!(err.to_string(), "Invalid struct field name: _hidden");
    }

    #[test]
    fn unknown_option_fails() {
        let err = FieldTags::parse("a", Some("a,omitEmpty")).unwrap_err();
        assert_eq!(err.to_string(), "Unrecognized tag: omitEmpty");

        let err = FieldTags::parse("a", Some("a,")).unwrap_err();
        assert_eq!(err.to_string(), "Unrecognized tag: ");
    }

    #[test]
    fn struct_names_are_title_cased() {
        assert_eq!(struct_name("testStruct"), "TestStruct");
        assert_eq!(struct_name("Person"), "Person");
        assert_eq!(struct_name(""), "");
    }
}
