use iplocator::errors::{LocatorError, Result};
use std::error::Error;

#[cfg(test)]
mod error_creation_tests {
    use super::*;

    #[test]
    fn test_invalid_ip_error() {
        let error = LocatorError::invalid_ip("999.1.1.1");

        assert!(matches!(error, LocatorError::InvalidIp(_)));
        assert_eq!(error.code(), "E001");
        assert!(error.to_string().contains("Invalid IP Address"));
        assert!(error.to_string().contains("999.1.1.1"));
    }

    #[test]
    fn test_database_errors() {
        let not_found = LocatorError::database_not_found("qqwry.dat 不存在");
        assert!(matches!(not_found, LocatorError::DatabaseNotFound(_)));
        assert_eq!(not_found.code(), "E002");
        assert!(not_found.to_string().contains("qqwry.dat 不存在"));

        let invalid = LocatorError::database_invalid("文件头损坏");
        assert!(matches!(invalid, LocatorError::DatabaseInvalid(_)));
        assert_eq!(invalid.code(), "E003");
        assert_eq!(invalid.message(), "文件头损坏");
    }

    #[test]
    fn test_lookup_errors() {
        let no_data = LocatorError::no_data("没有数据");
        assert_eq!(no_data.code(), "E004");
        assert_eq!(no_data.error_type(), "No Data Found");

        let no_provider = LocatorError::no_provider("没有可用数据源");
        assert_eq!(no_provider.code(), "E005");

        let provider = LocatorError::provider("decode failed");
        assert_eq!(provider.code(), "E006");
        assert_eq!(provider.error_type(), "Provider Error");
    }

    #[test]
    fn test_config_and_close_errors() {
        let config = LocatorError::config("bad toml");
        assert_eq!(config.code(), "E007");
        assert_eq!(config.format_simple(), "Configuration Error: bad toml");

        let close = LocatorError::close("qqwry: busy; geolite: busy");
        assert_eq!(close.code(), "E008");
        assert!(close.to_string().contains("geolite: busy"));
    }

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            LocatorError::invalid_ip(""),
            LocatorError::database_not_found(""),
            LocatorError::database_invalid(""),
            LocatorError::no_data(""),
            LocatorError::no_provider(""),
            LocatorError::provider(""),
            LocatorError::config(""),
            LocatorError::close(""),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}

#[cfg(test)]
mod error_conversion_tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "文件未找到");
        let error: LocatorError = io_error.into();
        assert!(matches!(error, LocatorError::DatabaseNotFound(_)));
        assert!(error.message().contains("文件未找到"));

        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "权限不足");
        let error: LocatorError = io_error.into();
        assert!(matches!(error, LocatorError::DatabaseInvalid(_)));
    }

    #[test]
    fn test_addr_parse_conversion() {
        fn parse(ip: &str) -> Result<std::net::IpAddr> {
            Ok(ip.parse()?)
        }

        assert!(parse("8.8.8.8").is_ok());
        assert!(matches!(parse("8.8.8"), Err(LocatorError::InvalidIp(_))));
    }
}

#[cfg(test)]
mod error_trait_tests {
    use super::*;

    #[test]
    fn test_error_trait() {
        let error = LocatorError::no_data("nothing");
        assert!(error.source().is_none());

        let boxed: Box<dyn Error + Send + Sync> = Box::new(error.clone());
        assert_eq!(boxed.to_string(), error.to_string());
    }

    #[test]
    fn test_debug_and_clone() {
        let error = LocatorError::provider("task panicked");
        let cloned = error.clone();
        assert_eq!(error, cloned);
        assert!(format!("{:?}", error).contains("Provider"));
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_format_colored_contains_code() {
        colored::control::set_override(false);
        let error = LocatorError::invalid_ip("abc");
        let output = error.format_colored();
        assert!(output.contains("E001"));
        assert!(output.contains("abc"));
    }
}
