//! Placeholder substitution for JVM argument lines.
//!
//! Three transforms, always applied in this order:
//! 1. `@{name}` build-property tokens (late-evaluated properties that other
//!    build steps may have set after the configuration was parsed),
//! 2. line breaks flattened to spaces,
//! 3. per-worker `${surefire.threadNumber}` / `${surefire.forkNumber}` tokens.

use crate::launch_spec::WorkerIndex;
use std::collections::BTreeMap;

/// Worker placeholder from the `threadCount`-era configuration surface.
pub const THREAD_NUMBER_PLACEHOLDER: &str = "${surefire.threadNumber}";

/// Worker placeholder from the `forkCount` configuration surface.
pub const FORK_NUMBER_PLACEHOLDER: &str = "${surefire.forkNumber}";

const PROPERTY_OPEN: &str = "@{";
const PROPERTY_CLOSE: char = '}';

/// Replace `@{name}` tokens in the raw argument line with property values.
///
/// Absent or blank lines resolve to an empty string. The line is trimmed and
/// scanned once; substituted values are never rescanned, so a value that
/// itself contains `@{...}` is emitted verbatim. Unknown properties resolve
/// to an empty string and an unterminated `@{` is kept literally.
pub fn replace_property_expressions(
    raw: Option<&str>,
    properties: &BTreeMap<String, String>,
) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let line = raw.trim();
    if line.is_empty() {
        return String::new();
    }

    let mut resolved = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find(PROPERTY_OPEN) {
        let after_open = &rest[start + PROPERTY_OPEN.len()..];
        let Some(name_len) = after_open.find(PROPERTY_CLOSE) else {
            break;
        };
        let name = &after_open[..name_len];
        if let Some(inner) = name.find(PROPERTY_OPEN) {
            // The first `@{` is unterminated; rescan from the nested one.
            let literal_end = start + PROPERTY_OPEN.len() + inner;
            resolved.push_str(&rest[..literal_end]);
            rest = &rest[literal_end..];
            continue;
        }
        resolved.push_str(&rest[..start]);
        if let Some(value) = properties.get(name) {
            resolved.push_str(value);
        }
        rest = &after_open[name_len + PROPERTY_CLOSE.len_utf8()..];
    }
    resolved.push_str(rest);
    resolved
}

/// Replace every line feed and carriage return with a single space.
pub fn strip_new_lines(line: &str) -> String {
    line.replace(['\n', '\r'], " ")
}

/// Replace both worker placeholders with the decimal worker index.
pub fn replace_worker_placeholders(line: &str, index: WorkerIndex) -> String {
    let number = index.to_string();
    line.replace(THREAD_NUMBER_PLACEHOLDER, &number)
        .replace(FORK_NUMBER_PLACEHOLDER, &number)
}

/// Fully resolve a configured argument line for one worker.
pub fn resolve_arg_line(
    raw: Option<&str>,
    properties: &BTreeMap<String, String>,
    index: WorkerIndex,
) -> String {
    let with_properties = replace_property_expressions(raw, properties);
    replace_worker_placeholders(&strip_new_lines(&with_properties), index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn worker(n: u32) -> WorkerIndex {
        WorkerIndex::new(n).unwrap()
    }

    #[test]
    fn test_absent_or_blank_line_is_empty() {
        let p = props(&[("foo", "bar")]);
        assert_eq!(replace_property_expressions(None, &p), "");
        assert_eq!(replace_property_expressions(Some(""), &p), "");
        assert_eq!(replace_property_expressions(Some("  \t\n "), &p), "");
    }

    #[test]
    fn test_property_substitution() {
        let p = props(&[("foo", "-Dbar=1"), ("mem", "512m")]);
        assert_eq!(
            replace_property_expressions(Some("-Xmx@{mem} @{foo}"), &p),
            "-Xmx512m -Dbar=1"
        );
    }

    #[test]
    fn test_repeated_token_replaced_everywhere() {
        let p = props(&[("v", "x")]);
        assert_eq!(
            replace_property_expressions(Some("@{v}-@{v}-@{v}"), &p),
            "x-x-x"
        );
    }

    #[test]
    fn test_unknown_property_resolves_empty() {
        let p = props(&[]);
        assert_eq!(
            replace_property_expressions(Some("-ea @{missing} -Xss1m"), &p),
            "-ea  -Xss1m"
        );
    }

    #[test]
    fn test_other_token_forms_untouched() {
        let p = props(&[("foo", "bar")]);
        let line = "${foo} @foo {foo} @{ foo";
        assert_eq!(replace_property_expressions(Some(line), &p), line);
    }

    #[test]
    fn test_unterminated_token_before_valid_one() {
        let p = props(&[("foo", "-Dbar=1")]);
        assert_eq!(
            replace_property_expressions(Some("-Da=@{ -Db=@{foo}"), &p),
            "-Da=@{ -Db=-Dbar=1"
        );
        assert_eq!(
            replace_property_expressions(Some("@{a@{foo}"), &p),
            "@{a-Dbar=1"
        );
        assert_eq!(
            replace_property_expressions(Some("@{@{@{foo} tail"), &p),
            "@{@{-Dbar=1 tail"
        );
    }

    #[test]
    fn test_substitution_is_not_recursive() {
        let p = props(&[("outer", "@{inner}"), ("inner", "deep")]);
        assert_eq!(
            replace_property_expressions(Some("-Da=@{outer}"), &p),
            "-Da=@{inner}"
        );
    }

    #[test]
    fn test_line_is_trimmed() {
        let p = props(&[]);
        assert_eq!(replace_property_expressions(Some("  -ea  "), &p), "-ea");
    }

    #[test]
    fn test_strip_new_lines() {
        assert_eq!(strip_new_lines("-Xmx1g\n-ea\r\n-Dx=1"), "-Xmx1g -ea  -Dx=1");
        assert_eq!(strip_new_lines("plain"), "plain");
    }

    #[test]
    fn test_worker_placeholders_are_aliases() {
        let line = "-Dt=${surefire.threadNumber} -Df=${surefire.forkNumber}";
        assert_eq!(replace_worker_placeholders(line, worker(7)), "-Dt=7 -Df=7");
    }

    #[test]
    fn test_newlines_inside_property_values_are_stripped() {
        let p = props(&[("multi", "-Da=1\n-Db=2")]);
        let resolved = resolve_arg_line(Some("@{multi}"), &p, worker(1));
        assert_eq!(resolved, "-Da=1 -Db=2");
    }

    #[test]
    fn test_property_value_can_carry_worker_placeholder() {
        let p = props(&[("dir", "/tmp/w${surefire.forkNumber}")]);
        let resolved = resolve_arg_line(Some("-Djava.io.tmpdir=@{dir}"), &p, worker(2));
        assert_eq!(resolved, "-Djava.io.tmpdir=/tmp/w2");
    }

    #[test]
    fn test_resolve_without_worker_tokens() {
        let p = props(&[("foo", "-Dbar=1")]);
        assert_eq!(
            resolve_arg_line(Some("-Xmx512m @{foo}"), &p, worker(3)),
            "-Xmx512m -Dbar=1"
        );
    }

    proptest! {
        #[test]
        fn prop_resolved_line_is_single_line(raw in "[ -~\n\r]{0,80}") {
            let resolved = resolve_arg_line(Some(&raw), &BTreeMap::new(), worker(1));
            prop_assert!(!resolved.contains('\n'));
            prop_assert!(!resolved.contains('\r'));
        }

        #[test]
        fn prop_known_tokens_replaced(key in "[a-z]{1,8}", value in "[A-Za-z0-9=.-]{0,12}") {
            let p = props(&[(key.as_str(), value.as_str())]);
            let raw = format!("-a @{{{key}}} -b");
            let resolved = replace_property_expressions(Some(&raw), &p);
            prop_assert_eq!(resolved, format!("-a {value} -b"));
        }

        #[test]
        fn prop_worker_tokens_match_index(n in 1u32..10_000) {
            let line = format!("{THREAD_NUMBER_PLACEHOLDER}:{FORK_NUMBER_PLACEHOLDER}");
            let resolved = replace_worker_placeholders(&line, worker(n));
            prop_assert_eq!(resolved, format!("{n}:{n}"));
        }
    }
}
