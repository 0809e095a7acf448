use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_STACKWATCH_INTERVAL: &str = "STACKWATCH_INTERVAL";

/// Sampler configuration, built once at process start and read-only after.
///
/// An interval of zero (or none at all) disables the sampler entirely; the
/// launcher passes whatever the deployment supplied without special-casing
/// "off".
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    interval: Option<Duration>,
    dump_dir: PathBuf,
    iterations: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl SamplerConfig {
    /// Sample every `interval_secs` seconds; `0` yields a disabled config.
    pub fn new(interval_secs: u64) -> Self {
        let interval = match interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        SamplerConfig {
            interval,
            dump_dir: PathBuf::from("."),
            iterations: None,
        }
    }

    pub fn disabled() -> Self {
        SamplerConfig {
            interval: None,
            dump_dir: PathBuf::from("."),
            iterations: None,
        }
    }

    /// Read the interval from `STACKWATCH_INTERVAL`. Unset, empty or `0`
    /// disables the sampler; an unparsable value disables it with a warning.
    pub fn from_env() -> Self {
        match std::env::var(ENV_STACKWATCH_INTERVAL) {
            Ok(value) if value.trim().is_empty() => Self::disabled(),
            Ok(value) => match value.trim().parse::<u64>() {
                Ok(secs) => Self::new(secs),
                Err(err) => {
                    log::warn!(
                        "ignoring {}={:?}: {}, sampler disabled",
                        ENV_STACKWATCH_INTERVAL,
                        value,
                        err
                    );
                    Self::disabled()
                }
            },
            Err(_) => Self::disabled(),
        }
    }

    /// Directory dump files are written to. Defaults to the working
    /// directory of the process.
    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = dir.into();
        self
    }

    /// Stop after `iterations` capture cycles instead of running unbounded.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn enabled(&self) -> bool {
        self.interval.is_some()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn dump_dir(&self) -> &Path {
        &self.dump_dir
    }

    pub fn iterations(&self) -> Option<u64> {
        self.iterations
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_interval_disables() {
        assert!(!SamplerConfig::new(0).enabled());
        assert_eq!(SamplerConfig::new(0).interval(), None);
        assert!(!SamplerConfig::disabled().enabled());
        assert!(!SamplerConfig::default().enabled());
    }

    #[test]
    fn test_positive_interval_enables() {
        let config = SamplerConfig::new(30);
        assert!(config.enabled());
        assert_eq!(config.interval(), Some(Duration::from_secs(30)));
        assert_eq!(config.iterations(), None);
    }

    #[test]
    fn test_builders() {
        let config = SamplerConfig::new(5)
            .with_dump_dir("/tmp/dumps")
            .with_iterations(3);
        assert_eq!(config.dump_dir(), Path::new("/tmp/dumps"));
        assert_eq!(config.iterations(), Some(3));
    }

    #[test]
    fn test_from_env() {
        // all env cases in one test; parallel tests share the process
        // environment
        std::env::remove_var(ENV_STACKWATCH_INTERVAL);
        assert!(!SamplerConfig::from_env().enabled());

        std::env::set_var(ENV_STACKWATCH_INTERVAL, "15");
        assert_eq!(
            SamplerConfig::from_env().interval(),
            Some(Duration::from_secs(15))
        );

        std::env::set_var(ENV_STACKWATCH_INTERVAL, "0");
        assert!(!SamplerConfig::from_env().enabled());

        std::env::set_var(ENV_STACKWATCH_INTERVAL, "soon");
        assert!(!SamplerConfig::from_env().enabled());

        std::env::remove_var(ENV_STACKWATCH_INTERVAL);
    }
}
