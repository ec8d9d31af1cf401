//! Top-level error type for building and running a simulation.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;

/// Everything that can stop the simulator. Publish failures are not here:
/// they are logged per message and the loop continues.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("{}", ConfigErrors(.0))]
    Config(Vec<ConfigError>),
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        SimError::Config(vec![e])
    }
}

struct ConfigErrors<'a>(&'a [ConfigError]);

impl fmt::Display for ConfigErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}
