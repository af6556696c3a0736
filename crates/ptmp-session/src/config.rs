use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ptmp_frame::{FrameConfig, FrameObserver, LengthMode, DEFAULT_MAX_FRAME_LENGTH};

/// Configuration for a PTMP session.
#[derive(Clone)]
pub struct SessionConfig {
    /// Timeout for connecting and for each blocking read or write.
    /// `None` blocks indefinitely.
    pub timeout: Option<Duration>,
    /// Maximum declared frame length accepted or sent.
    pub max_frame_length: usize,
    /// How declared lengths are enforced on received frames.
    pub length_mode: LengthMode,
    /// Reject negotiation responses that are not PTMP version 1.
    pub validate_negotiation: bool,
    /// Frame observer; `None` logs frames through `tracing`.
    pub observer: Option<Arc<dyn FrameObserver>>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(10)),
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            length_mode: LengthMode::default(),
            validate_negotiation: true,
            observer: None,
        }
    }
}

impl SessionConfig {
    /// Frame codec settings derived from this configuration.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_frame_length: self.max_frame_length,
            length_mode: self.length_mode,
            read_timeout: self.timeout,
            write_timeout: self.timeout,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("timeout", &self.timeout)
            .field("max_frame_length", &self.max_frame_length)
            .field("length_mode", &self.length_mode)
            .field("validate_negotiation", &self.validate_negotiation)
            .field(
                "observer",
                &self.observer.as_ref().map(|_| "<custom>").unwrap_or("<tracing>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_config_carries_limits_and_timeouts() {
        let config = SessionConfig {
            timeout: Some(Duration::from_millis(250)),
            max_frame_length: 4096,
            length_mode: LengthMode::Strict,
            ..SessionConfig::default()
        };
        let frame = config.frame_config();
        assert_eq!(frame.max_frame_length, 4096);
        assert_eq!(frame.length_mode, LengthMode::Strict);
        assert_eq!(frame.read_timeout, Some(Duration::from_millis(250)));
        assert_eq!(frame.write_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn defaults_are_lenient_and_validating() {
        let config = SessionConfig::default();
        assert_eq!(config.length_mode, LengthMode::Lenient);
        assert!(config.validate_negotiation);
        assert!(format!("{config:?}").contains("<tracing>"));
    }
}
