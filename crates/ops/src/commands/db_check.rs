//! 数据库连通性检查

use std::fmt;

use sqlx::PgPool;

use super::CommandError;

/// 迁移创建的业务表
pub const TABLES: &[&str] = &[
    "departments",
    "users",
    "concerns",
    "chat_rooms",
    "chat_messages",
    "announcements",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
    pub table: &'static str,
    /// 表不存在时为 None
    pub rows: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbCheckReport {
    pub server_version: String,
    pub tables: Vec<TableCount>,
}

impl DbCheckReport {
    pub fn missing_tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables
            .iter()
            .filter(|count| count.rows.is_none())
            .map(|count| count.table)
    }
}

impl fmt::Display for DbCheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database connection OK")?;
        writeln!(f, "Server: {}", self.server_version)?;
        for count in &self.tables {
            match count.rows {
                Some(rows) => writeln!(f, "  {:<16} {rows}", count.table)?,
                None => writeln!(f, "  {:<16} missing", count.table)?,
            }
        }
        let missing: Vec<_> = self.missing_tables().collect();
        if !missing.is_empty() {
            writeln!(f, "Run the server once to apply migrations ({} missing)", missing.len())?;
        }
        Ok(())
    }
}

pub async fn run(pool: &PgPool) -> Result<DbCheckReport, CommandError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    let server_version: String = sqlx::query_scalar("SHOW server_version")
        .fetch_one(pool)
        .await?;

    let mut tables = Vec::with_capacity(TABLES.len());
    for &table in TABLES {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(table)
            .fetch_one(pool)
            .await?;
        let rows = if exists {
            // 表名来自固定列表
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(pool)
                .await?;
            Some(count)
        } else {
            None
        };
        tables.push(TableCount { table, rows });
    }

    Ok(DbCheckReport {
        server_version,
        tables,
    })
}
