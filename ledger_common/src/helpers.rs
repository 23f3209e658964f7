use std::{env, fmt::Display, str::FromStr};

use log::*;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads a boolean flag from the environment variable `name`.
pub fn env_flag(name: &str, default: bool) -> bool {
    parse_boolean_flag(env::var(name).ok(), default)
}

/// Reads and parses the environment variable `name`. Missing or unparseable values fall back to `default`, with a log
/// entry explaining why.
pub fn env_parse_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            info!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boolean_flags() {
        assert!(parse_boolean_flag(Some("Yes".into()), false));
        assert!(!parse_boolean_flag(Some(" off ".into()), true));
        assert!(parse_boolean_flag(Some("maybe".into()), true));
        assert!(!parse_boolean_flag(None, false));
    }

    #[test]
    fn env_values_fall_back_to_defaults() {
        env::set_var("LEDGER_COMMON_TEST_PAGE_SIZE", "25");
        env::set_var("LEDGER_COMMON_TEST_BAD_SIZE", "lots");
        assert_eq!(env_parse_or("LEDGER_COMMON_TEST_PAGE_SIZE", 10u32), 25);
        assert_eq!(env_parse_or("LEDGER_COMMON_TEST_BAD_SIZE", 10u32), 10);
        assert_eq!(env_parse_or("LEDGER_COMMON_TEST_MISSING", 7u64), 7);
    }
}
