//! Property-based tests for the `.env` parser.

use std::path::Path;

use proptest::prelude::*;

use super::parse_env_str_with;
use crate::environment::EnvMap;
use crate::output::{DotenvFormatter, OutputFormatter};

fn parse(content: &str) -> crate::Result<EnvMap> {
    parse_env_str_with(content, Path::new(".env"), true, &|_: &str| None)
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,15}"
}

// Unquoted values: no quotes, `#`, `$`, backslashes or line breaks, no
// leading/trailing whitespace.
fn plain_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_./:@%+,-]([A-Za-z0-9_./:@%+, -]{0,30}[A-Za-z0-9_./:@%+,-])?"
}

fn env_map_strategy() -> impl Strategy<Value = EnvMap> {
    // `${NAME}` is always interpolated, so literal references cannot round-trip.
    let value = ".{0,40}".prop_filter("no references", |v: &String| !v.contains("${"));
    prop::collection::btree_map(key_strategy(), value, 0..12)
        .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    /// Property: A well-formed unquoted assignment yields exactly its value
    ///
    /// Mathematical Property: For all keys k and plain values v,
    /// parse("k=  v  ")[k] = trim(v)
    ///
    /// WHY THIS MATTERS: This is the common case of every `.env` file.
    #[test]
    fn unquoted_value_round_trips(key in key_strategy(), value in plain_value_strategy(), pad in " {0,3}") {
        let content = format!("{key}={pad}{value}{pad}\n");
        let parsed = parse(&content).unwrap();
        prop_assert_eq!(parsed.get(&key), Some(value.as_str()));
        prop_assert_eq!(parsed.len(), 1);
    }

    /// Property: Comment and blank lines never produce entries
    #[test]
    fn comment_lines_are_ignored(comment in "[^\r\n]{0,40}", blanks in " {0,4}") {
        let content = format!("#{comment}\n{blanks}\n  # {comment}\n");
        prop_assert!(parse(&content).unwrap().is_empty());
    }

    /// Property: Parsing preserves the declaration order of keys
    #[test]
    fn keys_keep_declaration_order(keys in prop::collection::btree_set(key_strategy(), 1..10)) {
        let content: String = keys.iter().rev().map(|k| format!("{k}=x\n")).collect();
        let parsed = parse(&content).unwrap();
        let expected: Vec<&str> = keys.iter().rev().map(String::as_str).collect();
        prop_assert_eq!(parsed.keys().collect::<Vec<_>>(), expected);
    }

    /// Property: The dotenv formatter output parses back to the same map
    ///
    /// Mathematical Property: For all maps m, parse(format_dotenv(m)) = m
    ///
    /// WHY THIS MATTERS: `strictenv parse --format dotenv` must produce a file
    /// that is read back identically, whatever characters the values hold.
    #[test]
    fn dotenv_output_round_trips(map in env_map_strategy()) {
        let rendered = DotenvFormatter.format(&map).unwrap();
        let parsed = parse(&rendered).unwrap();
        prop_assert_eq!(parsed, map);
    }

    /// Property: Lenient parsing never fails on arbitrary input
    #[test]
    fn lenient_parse_total(content in "(?s).{0,200}") {
        let result = parse_env_str_with(&content, Path::new(".env"), false, &|_: &str| None);
        prop_assert!(result.is_ok());
    }
}
