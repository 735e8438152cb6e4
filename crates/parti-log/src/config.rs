use serde::{Deserialize, Serialize};
use serde_with::DisplayFromStr;
pub use tracing::Level;

use crate::format::{LogFormat, LogTarget};

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// 日志格式
    pub format: LogFormat,
    /// 日志等级
    #[serde(with = "::serde_with::As::<DisplayFromStr>")]
    pub level: Level,
    /// 输出目标
    pub target: LogTarget,
    /// 是否显示 ANSI 颜色
    pub ansi: bool,
    /// 是否显示文件名
    pub with_filename: bool,
    /// 是否显示行号
    pub with_line_number: bool,
    /// 是否显示模块路径
    pub with_target: bool,
}

impl LogConfig {
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Compact,
            level: Level::INFO,
            target: LogTarget::Stderr,
            ansi: true,
            with_filename: false,
            with_line_number: false,
            with_target: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let conf: LogConfig = serde_json::from_str(r#"{"level": "debug", "format": "json"}"#).unwrap();
        assert_eq!(conf.level, Level::DEBUG);
        assert_eq!(conf.format, LogFormat::Json);
        assert_eq!(conf.target, LogTarget::Stderr);
        assert!(conf.ansi);
    }

    #[test]
    fn level_is_serialized_as_text() {
        let json = serde_json::to_value(LogConfig::default().with_level(Level::WARN)).unwrap();
        assert_eq!(json["level"], "WARN");
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(serde_json::from_str::<LogConfig>(r#"{"level": "loud"}"#).is_err());
    }
}
