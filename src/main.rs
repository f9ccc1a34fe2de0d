use anyhow::Result;
use practicum_client::{PracticumClient, config, logger};
use std::path::Path;
use tracing::{debug, info, trace, warn};

const CONFIG_PATH: &str = "config.toml";
const LOG_PATH: &str = "logs";

#[tokio::main]
async fn main() -> Result<()> {
    if !Path::new(LOG_PATH).is_dir() {
        std::fs::create_dir(LOG_PATH)?;
        eprintln!("不存在日志目录，已创建: {LOG_PATH}");
    }

    if !Path::new(CONFIG_PATH).is_file() {
        let _guard = logger::init_logger(LOG_PATH, tracing::level_filters::LevelFilter::INFO);
        let default_config = config::Config::default();
        config::save_config(CONFIG_PATH, &default_config).await?;
        warn!("不存在配置文件，已创建默认配置: {CONFIG_PATH}，请填写账号后重新运行");
        trace!(?default_config);
        return Ok(());
    }

    let config = config::load_config(CONFIG_PATH).await?;
    let _guard = logger::init_logger(LOG_PATH, config.log_level());
    info!("配置文件加载成功: {CONFIG_PATH}");
    debug!(login = %config.account.login, dump_file = ?config.account.dump_file);

    let client = PracticumClient::connect(config.credentials(), config.client_options()).await?;
    let professions = client.get_professions().await?;

    println!("{}", serde_json::to_string_pretty(&professions)?);

    Ok(())
}
