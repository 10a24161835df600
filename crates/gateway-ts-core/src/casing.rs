//! Identifier casing rules shared by the analyzer and the emitter.

/// Converts a snake_case identifier to camelCase following the protobuf JSON
/// mapping: underscores are dropped and a lowercase letter directly after an
/// underscore is uppercased. Digits never trigger capitalization on their
/// own, so `foo_3bar` collapses to `foo3bar` while `foo_3_bar` becomes
/// `foo3Bar`.
pub fn json_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut was_underscore = false;
    // proto identifiers are always ASCII
    for c in s.bytes() {
        if c != b'_' {
            let c = if was_underscore && c.is_ascii_lowercase() {
                c.to_ascii_uppercase()
            } else {
                c
            };
            out.push(c as char);
        }
        was_underscore = c == b'_';
    }
    out
}

/// Lowercases the leading uppercase run of a service or method name, keeping
/// the last uppercase letter when the run is followed by more of the word:
/// `SomeMethod` -> `someMethod`, `HTTPMethod` -> `httpMethod`.
pub fn function_case(s: &str) -> String {
    let first_lower = s.bytes().position(|c| c.is_ascii_lowercase());
    match first_lower {
        None => s.to_ascii_lowercase(),
        Some(0) => s.to_string(),
        Some(1) => {
            let mut out = s[..1].to_ascii_lowercase();
            out.push_str(&s[1..]);
            out
        }
        Some(pos) => {
            let mut out = s[..pos - 1].to_ascii_lowercase();
            out.push_str(&s[pos - 1..]);
            out
        }
    }
}

/// Uppercases the first ASCII letter and lowercases the rest: `GET` -> `Get`.
/// Used for deriving client method names of additional HTTP bindings.
pub fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut out = String::with_capacity(s.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(&chars.as_str().to_ascii_lowercase());
            out
        }
    }
}

/// Uppercases the first ASCII letter, leaving the rest untouched. Used when
/// building module identifiers out of package and file name segments.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut out = String::with_capacity(s.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_cases_snake_identifiers() {
        for (input, want) in [
            ("k8s_field", "k8sField"),
            ("foo_bar", "fooBar"),
            ("foobar", "foobar"),
            ("foo_bar_baz", "fooBarBaz"),
            ("foobar3", "foobar3"),
            ("foo3bar", "foo3bar"),
            ("foo3_bar", "foo3Bar"),
            ("foo_3bar", "foo3bar"),
            ("foo_3_bar", "foo3Bar"),
        ] {
            assert_eq!(json_camel_case(input), want, "json_camel_case({input})");
        }
    }

    #[test]
    fn function_case_handles_acronym_prefixes() {
        assert_eq!(function_case("SomeMethod"), "someMethod");
        assert_eq!(function_case("HTTPMethod"), "httpMethod");
        assert_eq!(function_case("alreadyLower"), "alreadyLower");
        assert_eq!(function_case("ABC"), "abc");
        assert_eq!(function_case(""), "");
    }

    #[test]
    fn title_case_normalizes_verbs() {
        assert_eq!(title_case("GET"), "Get");
        assert_eq!(title_case("post"), "Post");
        assert_eq!(title_case("DELETE"), "Delete");
    }
}
