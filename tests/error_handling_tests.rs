use serial_relay::{RelayError, RelayResult};
use std::error::Error;

/// Error handling and resilience tests
#[cfg(test)]
mod error_handling_tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let errors = vec![
            RelayError::DeviceOpen {
                path: "/dev/ttyACM0".to_string(),
                message: "Permission denied".to_string(),
            },
            RelayError::DeviceWrite { message: "Broken pipe".to_string() },
            RelayError::DeviceRead { message: "Device disconnected".to_string() },
            RelayError::DeviceNotOpen { state: "closed".to_string() },
            RelayError::Timeout,
            RelayError::Config { message: "Config error".to_string() },
            RelayError::Protocol("Unknown event".to_string()),
        ];

        for error in errors {
            let display = error.to_string();
            assert!(!display.is_empty(), "Error display should not be empty");
        }

        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RelayError>();
    }

    #[test]
    fn test_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "Address in use");
        let relay_error: RelayError = io_error.into();
        assert!(matches!(relay_error, RelayError::Network(_)));
    }

    #[test]
    fn test_result_type() {
        fn success_function() -> RelayResult<String> {
            Ok("success".to_string())
        }

        fn error_function() -> RelayResult<String> {
            Err(RelayError::Config {
                message: "Test error".to_string(),
            })
        }

        assert_eq!(success_function().unwrap(), "success");
        assert!(error_function().unwrap_err().to_string().contains("Configuration"));
    }

    #[test]
    fn test_error_chain() {
        let root_cause = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Access denied");
        let network_error: RelayError = root_cause.into();

        let mut current_error: &dyn Error = &network_error;
        let mut depth = 0;

        while let Some(source) = current_error.source() {
            current_error = source;
            depth += 1;
            if depth > 10 {
                break;
            }
        }

        assert!(depth > 0, "Should have at least one source error");
    }
}
