//! Macro for implementing Display and FromStr for wire-name enums
//!
//! Several enums travel as lowercase strings (query parameters, config
//! values). This macro gives them a single Display/FromStr pair with
//! case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use tripline_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Shade {
//!     Light,
//!     Dark,
//! }
//!
//! impl_wire_name_conversions!(Shade {
//!     Light => "light",
//!     Dark => "dark",
//! });
//!
//! assert_eq!(Shade::Dark.to_string(), "dark");
//! assert_eq!("LIGHT".parse::<Shade>(), Ok(Shade::Light));
//! ```

/// Implements Display and FromStr for enums with a fixed wire name per
/// variant.
///
/// `$str` must be lowercase; parsing lowercases its input before matching.
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Wire name of this variant.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => ::std::result::Result::Ok(Self::$variant),)+
                    _ => ::std::result::Result::Err(::std::format!("Invalid {}: {}", ::std::stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Channel {
        Web,
        Mobile,
    }

    impl_wire_name_conversions!(Channel {
        Web => "web",
        Mobile => "mobile",
    });

    #[test]
    fn display_uses_wire_name() {
        assert_eq!(Channel::Web.to_string(), "web");
        assert_eq!(Channel::Mobile.as_str(), "mobile");
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(Channel::from_str("WEB").unwrap(), Channel::Web);
        assert_eq!(Channel::from_str(" Mobile ").unwrap(), Channel::Mobile);
    }

    mod shadowed_result {
        #[allow(dead_code)]
        type Result<T> = std::result::Result<T, crate::TriplineError>;

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Tier {
            Fresh,
            Stale,
        }

        impl_wire_name_conversions!(Tier {
            Fresh => "fresh",
            Stale => "stale",
        });
    }

    #[test]
    fn expands_next_to_a_single_parameter_result_alias() {
        use shadowed_result::Tier;

        assert_eq!(Tier::from_str("stale"), Ok(Tier::Stale));
        assert_eq!(Tier::Fresh.to_string(), "fresh");
        assert!(Tier::from_str("expired").is_err());
    }

    #[test]
    fn parse_rejects_unknown_names() {
        let err = Channel::from_str("fax").unwrap_err();
        assert!(err.contains("Invalid Channel: fax"));
        assert!(Channel::from_str("").is_err());
    }
}
