use async_trait::async_trait;
use parti_core::{ExecuteError, SqlStatement, StatementExecutor};
use sea_orm::sqlx::mysql::MySqlDatabaseError;
use sea_orm::{ConnectionTrait, DbErr, QueryResult, RuntimeErr, Statement, Value, sqlx};
use tracing::trace;

/// PostgreSQL: duplicate_table / duplicate_object / 并发建表时 pg_type 唯一键冲突
const PG_DUPLICATE_STATES: [&str; 3] = ["42P07", "42710", "23505"];
/// MySQL: ER_SAME_NAME_PARTITION / ER_TABLE_EXISTS_ERROR / ER_DUP_KEYNAME
const MYSQL_DUPLICATE_ERRORS: [u16; 3] = [1517, 1050, 1061];

/// 基于 sea-orm 连接或事务的语句执行器
pub struct SeaOrmExecutor<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> SeaOrmExecutor<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// 当前连接的后端标识
    pub fn backend(&self) -> &'static str {
        crate::backend_id(self.conn.get_database_backend())
    }

    fn statement(&self, statement: &SqlStatement) -> Statement {
        Statement::from_sql_and_values(
            self.conn.get_database_backend(),
            statement.sql.as_str(),
            statement.values.iter().cloned().map(Value::from),
        )
    }

    async fn query_one(&self, statement: &SqlStatement) -> Result<Option<QueryResult>, ExecuteError> {
        trace!(sql = %statement, values = ?statement.values, "query");
        self.conn.query_one(self.statement(statement)).await.map_err(classify)
    }
}

#[async_trait]
impl<C: ConnectionTrait> StatementExecutor for SeaOrmExecutor<'_, C> {
    async fn execute(&self, statement: &SqlStatement) -> Result<(), ExecuteError> {
        trace!(sql = %statement, values = ?statement.values, "execute");
        // plpgsql 函数体内的 $1 不是绑定参数, 无参数的语句不走预处理
        if statement.values.is_empty() {
            self.conn.execute_unprepared(&statement.sql).await.map_err(classify)?;
        } else {
            self.conn.execute(self.statement(statement)).await.map_err(classify)?;
        }
        Ok(())
    }

    async fn query_count(&self, statement: &SqlStatement) -> Result<i64, ExecuteError> {
        let Some(row) = self.query_one(statement).await? else {
            return Ok(0);
        };
        row.try_get_by_index::<i64>(0).map_err(classify)
    }

    async fn query_text(&self, statement: &SqlStatement) -> Result<Option<String>, ExecuteError> {
        let Some(row) = self.query_one(statement).await? else {
            return Ok(None);
        };
        row.try_get_by_index::<Option<String>>(0).map_err(classify)
    }
}

fn classify(err: DbErr) -> ExecuteError {
    let message = err.to_string();
    if is_duplicate_object(&err) {
        ExecuteError::DuplicateObject { message }
    } else {
        ExecuteError::Statement { message }
    }
}

fn is_duplicate_object(err: &DbErr) -> bool {
    let (DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db)))) = err
    else {
        return false;
    };
    if let Some(mysql) = db.try_downcast_ref::<MySqlDatabaseError>() {
        return is_duplicate_mysql_error(mysql.number());
    }
    db.code().is_some_and(|code| is_duplicate_sqlstate(&code))
}

pub fn is_duplicate_sqlstate(code: &str) -> bool {
    PG_DUPLICATE_STATES.contains(&code)
}

pub fn is_duplicate_mysql_error(number: u16) -> bool {
    MYSQL_DUPLICATE_ERRORS.contains(&number)
}
