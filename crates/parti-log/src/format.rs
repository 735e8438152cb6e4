use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumString};

/// 日志输出格式
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Display, EnumString, SerializeDisplay, DeserializeFromStr)]
pub enum LogFormat {
    #[default]
    #[strum(serialize = "compact")]
    Compact,
    #[strum(serialize = "pretty")]
    Pretty,
    #[strum(serialize = "json")]
    Json,
}

/// 日志输出目标. 命令行输出走 stdout, 日志默认写到 stderr
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Display, EnumString, SerializeDisplay, DeserializeFromStr)]
pub enum LogTarget {
    #[strum(serialize = "stdout")]
    Stdout,
    #[default]
    #[strum(serialize = "stderr")]
    Stderr,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_test::{Token, assert_de_tokens_error, assert_tokens};

    use super::*;

    #[test]
    fn format_names_are_lowercase() {
        assert_eq!(LogFormat::from_str("json"), Ok(LogFormat::Json));
        assert!(LogFormat::from_str("JSON").is_err());
        assert_eq!(LogFormat::Pretty.to_string(), "pretty");
    }

    #[test]
    fn serde_uses_display_names() {
        assert_tokens(&LogFormat::Compact, &[Token::Str("compact")]);
        assert_tokens(&LogTarget::Stderr, &[Token::Str("stderr")]);
        assert_de_tokens_error::<LogTarget>(&[Token::Str("file")], "Matching variant not found");
    }

    #[test]
    fn logs_go_to_stderr_by_default() {
        assert_eq!(LogTarget::default(), LogTarget::Stderr);
    }
}
