//! Command-line configuration for the `fizzpipe` binary.

use std::ffi::OsString;

use clap::Parser;
use tracing::warn;

use crate::core::{Error, Result};
use crate::pipeline::Pipeline;
use crate::processors::{LimitFilter, TagFilter};
use crate::sources::Generator;

/// Number of values printed when no usable limit is given
pub const DEFAULT_LIMIT: usize = 45;

/// Print tagged values from an endless generator
#[derive(Parser, Debug, Default)]
#[command(name = "fizzpipe", version, about, long_about = None)]
pub struct Cli {
    /// How many values to print. Anything that isn't a non-negative integer
    /// is ignored with a warning.
    #[arg(allow_hyphen_values = true)]
    pub limit: Option<String>,
}

/// A divisor and the tag it attaches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRule {
    pub divisor: u64,
    pub tag: String,
}

impl TagRule {
    pub fn new<S: Into<String>>(divisor: u64, tag: S) -> Self {
        Self {
            divisor,
            tag: tag.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How many values the limit stage forwards
    pub limit: usize,
    /// Tagging stages, in composition order
    pub tags: Vec<TagRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            tags: vec![
                TagRule::new(3, "fizz"),
                TagRule::new(5, "buzz"),
                TagRule::new(7, "zang"),
                TagRule::new(9, "bang"),
            ],
        }
    }
}

impl Config {
    /// Parse a limit argument
    pub fn parse_limit(raw: &str) -> Result<usize> {
        raw.trim()
            .parse::<usize>()
            .map_err(|e| Error::InvalidLimit {
                input: raw.to_string(),
                reason: e.to_string(),
            })
    }

    /// Build the configuration from parsed arguments, falling back to the
    /// default limit when the argument is unusable.
    pub fn from_cli(cli: &Cli) -> Self {
        let mut config = Self::default();
        if let Some(raw) = &cli.limit {
            match Self::parse_limit(raw) {
                Ok(limit) => config.limit = limit,
                Err(e) => warn!(error = %e, default = config.limit, "ignoring limit argument"),
            }
        }
        config
    }

    /// Like [`Config::from_cli`], but never fails on bad arguments.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Cli::try_parse_from(args) {
            Ok(cli) => Self::from_cli(&cli),
            Err(e) => {
                warn!(error = %e, "could not parse arguments, using defaults");
                Self::default()
            }
        }
    }

    /// Generator, then the limit, then one tagging stage per rule.
    pub fn pipeline(&self) -> Result<Pipeline<Generator>> {
        let mut pipeline = Pipeline::new(Generator::new()).filter(LimitFilter::new(self.limit));
        for rule in &self.tags {
            pipeline = pipeline.filter(TagFilter::new(rule.divisor, rule.tag.as_str())?);
        }
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.limit, 45);
        let tags: Vec<&str> = config.tags.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["fizz", "buzz", "zang", "bang"]);
    }

    #[test]
    fn test_limit_argument() {
        assert_eq!(Config::from_args(["fizzpipe", "15"]).limit, 15);
        assert_eq!(Config::from_args(["fizzpipe", "0"]).limit, 0);
        assert_eq!(Config::from_args(["fizzpipe"]).limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_malformed_limit_falls_back_to_default() {
        assert_eq!(Config::from_args(["fizzpipe", "lots"]).limit, DEFAULT_LIMIT);
        assert_eq!(Config::from_args(["fizzpipe", "-3"]).limit, DEFAULT_LIMIT);
        assert_eq!(Config::from_args(["fizzpipe", "1.5"]).limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_parse_limit_reports_input() {
        match Config::parse_limit("ten") {
            Err(Error::InvalidLimit { input, .. }) => assert_eq!(input, "ten"),
            other => panic!("expected InvalidLimit, got {:?}", other),
        }
    }

    #[test]
    fn test_pipeline_has_limit_then_tags() {
        let pipeline = Config::default().pipeline().unwrap();
        assert_eq!(pipeline.stage_count(), 6);
    }

    #[test]
    fn test_zero_divisor_rule_is_rejected() {
        let config = Config {
            limit: 3,
            tags: vec![TagRule::new(0, "never")],
        };
        assert!(config.pipeline().is_err());
    }
}
