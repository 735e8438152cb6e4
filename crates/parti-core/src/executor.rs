use std::fmt;

use async_trait::async_trait;
use snafu::Snafu;

/// 执行语句失败
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ExecuteError {
    /// 对象已存在(表/分区/索引), 并发创建时视为成功
    #[snafu(display("DuplicateObject: {message}"))]
    DuplicateObject { message: String },

    #[snafu(display("StatementError: {message}"))]
    Statement { message: String },
}

impl ExecuteError {
    pub fn is_duplicate_object(&self) -> bool {
        matches!(self, ExecuteError::DuplicateObject { .. })
    }
}

/// 待执行的 SQL 语句, 占位符风格由生成语句的后端决定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub sql: String,
    pub values: Vec<String>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into(), values: Vec::new() }
    }

    pub fn with_values<I, V>(sql: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self { sql: sql.into(), values: values.into_iter().map(Into::into).collect() }
    }
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql.trim())
    }
}

/// 由调用方提供的连接/事务上下文, 超时与取消语义同样由调用方负责
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// 执行语句
    async fn execute(&self, statement: &SqlStatement) -> Result<(), ExecuteError>;

    /// 执行返回单个整数的查询(COUNT)
    async fn query_count(&self, statement: &SqlStatement) -> Result<i64, ExecuteError>;

    /// 执行返回单个文本的查询, 无结果时返回 None
    async fn query_text(&self, statement: &SqlStatement) -> Result<Option<String>, ExecuteError>;
}
