use std::time::Duration;

use super::match_result::DistanceMetric;

/// Matching policy: metric and acceptance threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    pub metric: DistanceMetric,
    /// Maximum accepted distance between query and candidate.
    pub threshold: f32,
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(format!("threshold must be positive: {}", self.threshold));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::Cosine,
            // ArcFace cosine operating point.
            threshold: 0.68,
        }
    }
}

/// Capture deadline and presence-poll cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Overall wall-clock deadline for one capture call.
    pub timeout: Duration,
    /// How often the backend checks for sample presence.
    pub poll_interval: Duration,
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout.is_zero() {
            return Err("capture timeout must be non-zero".into());
        }
        if self.poll_interval.is_zero() || self.poll_interval > self.timeout {
            return Err("poll interval must be non-zero and within the timeout".into());
        }
        Ok(())
    }

    /// Default cadence under `timeout`; the poll interval is clamped so a
    /// deadline shorter than the default cadence still validates.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Self::default().poll_interval.min(timeout),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_validate() {
        assert!(MatchConfig::default().validate().is_ok());
        assert!(CaptureConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_threshold() {
        let config = MatchConfig {
            threshold: 0.0,
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MatchConfig {
            threshold: f32::NAN,
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn with_timeout_clamps_poll_interval_to_the_deadline() {
        let config = CaptureConfig::with_timeout(Duration::from_millis(50));
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval, Duration::from_millis(50));

        // A roomy deadline keeps the default cadence.
        let config = CaptureConfig::with_timeout(Duration::from_secs(10));
        assert_eq!(config.poll_interval, CaptureConfig::default().poll_interval);
    }

    #[test]
    fn rejects_poll_longer_than_timeout() {
        let config = CaptureConfig {
            timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(100),
        };
        assert!(config.validate().is_err());
    }
}
