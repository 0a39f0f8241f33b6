//! Small helpers for permissively reading environment variables: a malformed
//! optional value is logged and ignored rather than treated as fatal, the
//! same policy the original worker's `LoadLimitsFromEnv` followed.

use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

pub fn required(name: &str) -> ConfigResult<String> {
    std::env::var(name).map_err(|_| ConfigError::MissingRequired(name.to_string()))
}

pub fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Parse `name` as `T`, falling back to `default` if unset, empty, or
/// unparsable. A parse failure is logged but never fatal.
pub fn parsed_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
{
    match optional(name) {
        None => default,
        Some(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(var = name, value = %raw, "ignoring malformed environment variable, using default");
                default
            }
        },
    }
}

/// Like [`parsed_or`] but additionally rejects non-positive values, matching
/// the original worker's `n > 0` guard for numeric limits.
pub fn positive_or<T>(name: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy,
{
    let value = parsed_or(name, default);
    if value > T::default() { value } else { default }
}

/// `false` (case-sensitive, matching the original `os.Getenv(...) != "false"`
/// convention) disables the flag; anything else, including unset, leaves it
/// at `default`.
pub fn flag_unless_false(name: &str, default: bool) -> bool {
    match optional(name) {
        Some(value) => value != "false",
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_or_rejects_zero_and_negative() {
        // SAFETY: tests run single-threaded per process for env mutation here.
        unsafe { std::env::set_var("FORGE_TEST_ZERO", "0") };
        assert_eq!(positive_or::<i64>("FORGE_TEST_ZERO", 42), 42);
        unsafe { std::env::remove_var("FORGE_TEST_ZERO") };
    }

    #[test]
    fn parsed_or_falls_back_on_garbage() {
        unsafe { std::env::set_var("FORGE_TEST_GARBAGE", "not-a-number") };
        assert_eq!(parsed_or::<u64>("FORGE_TEST_GARBAGE", 7), 7);
        unsafe { std::env::remove_var("FORGE_TEST_GARBAGE") };
    }

    #[test]
    fn flag_unless_false_only_false_disables() {
        unsafe { std::env::set_var("FORGE_TEST_FLAG", "false") };
        assert!(!flag_unless_false("FORGE_TEST_FLAG", true));
        unsafe { std::env::set_var("FORGE_TEST_FLAG", "no") };
        assert!(flag_unless_false("FORGE_TEST_FLAG", true));
        unsafe { std::env::remove_var("FORGE_TEST_FLAG") };
        assert!(flag_unless_false("FORGE_TEST_FLAG", true));
    }
}
