//! Transport Configuration
//!
//! Queue sizes and line limits for the pump pair.

use serde::{Deserialize, Serialize};

use super::codec::{DEFAULT_MAX_LINE_BYTES, MIN_MAX_LINE_BYTES};

/// Default capacity of the decoded-inbound queue
pub const DEFAULT_INCOMING_CAPACITY: usize = 100;

/// Default capacity of the error queue
pub const DEFAULT_ERROR_CAPACITY: usize = 10;

/// Transport configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Capacity of the decoded-inbound queue
    ///
    /// When full, the read pump stops reading until the consumer catches up.
    pub incoming_capacity: usize,

    /// Capacity of the error queue
    ///
    /// When full, further error reports are logged and dropped so that an
    /// idle error consumer never stalls the read pump.
    pub error_capacity: usize,

    /// Maximum size of one line in bytes
    pub max_line_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            incoming_capacity: DEFAULT_INCOMING_CAPACITY,
            error_capacity: DEFAULT_ERROR_CAPACITY,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl TransportConfig {
    /// Check the values are usable
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.incoming_capacity == 0 {
            return Err("transport.incoming_capacity must be greater than 0".to_string());
        }
        if self.error_capacity == 0 {
            return Err("transport.error_capacity must be greater than 0".to_string());
        }
        if self.max_line_bytes < MIN_MAX_LINE_BYTES {
            return Err(format!(
                "transport.max_line_bytes must be at least {MIN_MAX_LINE_BYTES}"
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TransportConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = TransportConfig {
            incoming_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("incoming_capacity"));

        let config = TransportConfig {
            error_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("error_capacity"));
    }

    #[test]
    fn test_tiny_line_limit_rejected() {
        let config = TransportConfig {
            max_line_bytes: 16,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
