use crate::error::{Error, Result};
use crate::matching::{ContentHashStrategy, FilenameSizeStrategy, MatchStrategy};

/// Names of all registered strategies, in the order they are advertised
pub const STRATEGY_NAMES: [&str; 2] = ["content-hash", "filename-size"];

/// Look up a strategy by name. The registry is closed: anything not listed
/// in STRATEGY_NAMES is a configuration error, raised before any I/O.
pub fn strategy(name: &str) -> Result<Box<dyn MatchStrategy>> {
    match name {
        "filename-size" => Ok(Box::new(FilenameSizeStrategy)),
        "content-hash" => Ok(Box::new(ContentHashStrategy)),
        other => Err(Error::Configuration(format!(
            "unknown match strategy '{}'; available: {}",
            other,
            STRATEGY_NAMES.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_names_resolve() {
        for name in STRATEGY_NAMES {
            assert_eq!(strategy(name).unwrap().name(), name);
        }
    }

    #[test]
    fn unknown_name_is_a_configuration_error() {
        let err = strategy("perceptual").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("filename-size"));
    }
}
