//! StudentLink 运维命令行
//!
//! # Usage
//!
//! ```bash
//! # 检查数据库连接与各表行数
//! studentlink-ops db-check
//!
//! # 列出 / 导出用户（导出文件不含密码哈希）
//! studentlink-ops list-users
//! studentlink-ops export-users --output exported_users.json
//!
//! # 修复 storage 与 bootstrap/cache 目录权限
//! studentlink-ops fix-permissions --root /srv/studentlink --dry-run
//! ```
//!
//! 数据库地址取自 `--database-url`，其次是 `DATABASE_URL`（会先加载 `.env`）。

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studentlink-ops")]
#[command(author, version, about = "StudentLink developer utilities")]
struct Cli {
    /// PostgreSQL connection string, defaults to `DATABASE_URL`
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check database connectivity and print table row counts
    DbCheck,
    /// Print every user as a table
    ListUsers,
    /// Export users as pretty JSON without password hashes
    ExportUsers {
        #[arg(short, long, default_value = commands::users::DEFAULT_EXPORT_FILE)]
        output: PathBuf,
    },
    /// Create missing writable directories and reset their permissions
    FixPermissions {
        /// Application root directory
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Only report what would change
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::DbCheck => {
            let pool = commands::connect(cli.database_url).await?;
            let report = commands::db_check::run(&pool).await?;
            print!("{report}");
        }
        Commands::ListUsers => {
            let pool = commands::connect(cli.database_url).await?;
            let users = commands::users::load(pool).await?;
            print!("{}", commands::users::format_table(&users));
        }
        Commands::ExportUsers { output } => {
            let pool = commands::connect(cli.database_url).await?;
            let users = commands::users::load(pool).await?;
            let count = commands::users::write_export(&users, &output)?;
            println!("Exported {count} users to {}", output.display());
        }
        Commands::FixPermissions { root, dry_run } => {
            let report = commands::permissions::repair(&root, dry_run)?;
            print!("{report}");
        }
    }
    Ok(())
}
