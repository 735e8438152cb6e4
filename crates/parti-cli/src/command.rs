use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parti_log::Level;

use crate::cmd::{EnsureCommand, PrepareCommand, ShowCommand};

// CLI命令解析结构
#[derive(Parser, Debug, Clone)]
#[command(name = "parti", version, about = "按时间自动分区的数据表管理工具")]
pub struct Cli {
    #[arg(long, global = true, help = "启用详细输出")]
    pub verbose: bool,

    #[arg(long, global = true, env = "PARTI_CONFIG", help = "配置文件路径")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "日志级别")]
    pub log_level: Option<Level>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// 命令行参数优先于配置文件
    pub fn effective_level(&self, configured: Level) -> Level {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level,
            (None, true) => Level::DEBUG,
            (None, false) => configured,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// 为分区实体初始化数据库结构
    Prepare(PrepareCommand),
    /// 确保指定时间所属的分区存在
    Ensure(EnsureCommand),
    /// 显示分区查询条件
    Show(ShowCommand),
}
