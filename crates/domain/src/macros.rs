//! Macro for implementing Display and FromStr for simple state enums
//!
//! Used for enums that are persisted or logged as lowercase strings.
//!
//! # Example
//!
//! ```rust
//! use cadence_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Mode {
//!     Online,
//!     Offline,
//! }
//!
//! impl_domain_status_conversions!(Mode {
//!     Online => "online",
//!     Offline => "offline",
//! });
//! ```

/// Implements Display and FromStr for a fieldless enum.
///
/// Parsing is case-insensitive; display is the lowercase mapping given.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Mode {
        Online,
        Offline,
    }

    impl_domain_status_conversions!(Mode {
        Online => "online",
        Offline => "offline",
    });

    #[test]
    fn display_uses_mapping() {
        assert_eq!(Mode::Online.to_string(), "online");
        assert_eq!(Mode::Offline.to_string(), "offline");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Mode::from_str("ONLINE").unwrap(), Mode::Online);
        assert_eq!(Mode::from_str("OffLine").unwrap(), Mode::Offline);
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = Mode::from_str("sometimes").unwrap_err();
        assert!(err.contains("Invalid Mode: sometimes"));
    }

    mod alongside_domain_result {
        use crate::{CadenceError, Result};

        #[derive(Debug, PartialEq, Eq)]
        enum Level {
            Low,
            High,
        }

        impl_domain_status_conversions!(Level {
            Low => "low",
            High => "high",
        });

        fn parse(value: &str) -> Result<Level> {
            value.parse().map_err(CadenceError::Config)
        }

        #[test]
        fn expands_where_domain_result_is_in_scope() {
            assert_eq!(parse("HIGH").unwrap(), Level::High);
            assert_eq!(Level::Low.to_string(), "low");
            assert!(matches!(parse("medium"), Err(CadenceError::Config(_))));
        }
    }
}
