use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use markscheme_pipeline::orchestrator::store_tasks;
use markscheme_pipeline::utils::logging;
use markscheme_pipeline::{App, Config, LlmService, StoreBackend};

/// 评分标准提取与存储工具
#[derive(Parser)]
#[command(name = "markscheme", version)]
struct Cli {
    /// TOML 配置文件（环境变量仍会覆盖其中的值）
    #[arg(long, global = true, env = "MARKSCHEME_CONFIG")]
    config: Option<PathBuf>,

    /// 文档存储后端: local / firestore
    #[arg(long, global = true, default_value = "local", env = "MARKSCHEME_STORE")]
    store: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 提取输入目录下每个文件夹的评分标准
    Extract,
    /// 把合并输出文件导入评分标准集合
    Import {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// 上传带 docId 的 JSON 数组
    Upload {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// 下载所有集合到一个 JSON 文件
    Download {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// 删除所有集合的所有文档
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    logging::init(config.verbose_logging);

    match cli.command {
        Command::Extract => {
            if config.llm_api_key.is_empty() {
                warn!("⚠️ 未设置 LLM_API_KEY / GEMINI_API_KEY，模型调用可能失败");
            }
            let model = LlmService::new(&config);
            info!("🤖 使用模型: {}", model.model_name());
            App::initialize(config, model).await?.run().await?;
        }
        Command::Import { file } => {
            let store = StoreBackend::from_config(&cli.store, &config)?;
            let path = file.unwrap_or_else(|| config.combined_file_path());
            logging::log_startup("导入合并文件", &store.describe());
            store_tasks::import_combined(&store, &path, &config.collection).await?;
        }
        Command::Upload { file } => {
            let store = StoreBackend::from_config(&cli.store, &config)?;
            let path = file.unwrap_or_else(|| config.upload_file.clone());
            logging::log_startup("上传文档", &store.describe());
            store_tasks::upload_documents(&store, &path, &config.collection).await?;
        }
        Command::Download { file } => {
            let store = StoreBackend::from_config(&cli.store, &config)?;
            let path = file.unwrap_or_else(|| config.download_file.clone());
            logging::log_startup("下载所有集合", &store.describe());
            store_tasks::download_all(&store, &path).await?;
        }
        Command::Clear => {
            let store = StoreBackend::from_config(&cli.store, &config)?;
            logging::log_startup("清空所有集合", &store.describe());
            store_tasks::clear_all(&store).await?;
        }
    }

    Ok(())
}
