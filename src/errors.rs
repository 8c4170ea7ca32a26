use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    InvalidIp(String),
    DatabaseNotFound(String),
    DatabaseInvalid(String),
    NoData(String),
    NoProvider(String),
    Provider(String),
    Config(String),
    Close(String),
}

impl LocatorError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LocatorError::InvalidIp(_) => "E001",
            LocatorError::DatabaseNotFound(_) => "E002",
            LocatorError::DatabaseInvalid(_) => "E003",
            LocatorError::NoData(_) => "E004",
            LocatorError::NoProvider(_) => "E005",
            LocatorError::Provider(_) => "E006",
            LocatorError::Config(_) => "E007",
            LocatorError::Close(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LocatorError::InvalidIp(_) => "Invalid IP Address",
            LocatorError::DatabaseNotFound(_) => "Database Not Found",
            LocatorError::DatabaseInvalid(_) => "Invalid Database Format",
            LocatorError::NoData(_) => "No Data Found",
            LocatorError::NoProvider(_) => "No Provider Available",
            LocatorError::Provider(_) => "Provider Error",
            LocatorError::Config(_) => "Configuration Error",
            LocatorError::Close(_) => "Close Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LocatorError::InvalidIp(msg) => msg,
            LocatorError::DatabaseNotFound(msg) => msg,
            LocatorError::DatabaseInvalid(msg) => msg,
            LocatorError::NoData(msg) => msg,
            LocatorError::NoProvider(msg) => msg,
            LocatorError::Provider(msg) => msg,
            LocatorError::Config(msg) => msg,
            LocatorError::Close(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于命令行）
    #[cfg(feature = "cli")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LocatorError {}

// 便捷的构造函数
impl LocatorError {
    pub fn invalid_ip<T: Into<String>>(msg: T) -> Self {
        LocatorError::InvalidIp(msg.into())
    }

    pub fn database_not_found<T: Into<String>>(msg: T) -> Self {
        LocatorError::DatabaseNotFound(msg.into())
    }

    pub fn database_invalid<T: Into<String>>(msg: T) -> Self {
        LocatorError::DatabaseInvalid(msg.into())
    }

    pub fn no_data<T: Into<String>>(msg: T) -> Self {
        LocatorError::NoData(msg.into())
    }

    pub fn no_provider<T: Into<String>>(msg: T) -> Self {
        LocatorError::NoProvider(msg.into())
    }

    pub fn provider<T: Into<String>>(msg: T) -> Self {
        LocatorError::Provider(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        LocatorError::Config(msg.into())
    }

    pub fn close<T: Into<String>>(msg: T) -> Self {
        LocatorError::Close(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for LocatorError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => LocatorError::DatabaseNotFound(err.to_string()),
            _ => LocatorError::DatabaseInvalid(err.to_string()),
        }
    }
}

impl From<maxminddb::MaxMindDbError> for LocatorError {
    fn from(err: maxminddb::MaxMindDbError) -> Self {
        LocatorError::Provider(err.to_string())
    }
}

impl From<std::net::AddrParseError> for LocatorError {
    fn from(err: std::net::AddrParseError) -> Self {
        LocatorError::InvalidIp(err.to_string())
    }
}

impl From<config::ConfigError> for LocatorError {
    fn from(err: config::ConfigError) -> Self {
        LocatorError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LocatorError>;
