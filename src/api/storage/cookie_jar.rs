use crate::error::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_COOKIE_DIR: &str = "cookies";

/// 持久化的 Cookie：name -> value
pub type CookieJar = BTreeMap<String, String>;

/// 每个账号一个 JSON 文件，文件存在即视为已登录
#[derive(Debug, Clone)]
pub struct CookieJarStore {
    dir: PathBuf,
}

impl CookieJarStore {
    /// 打开存储目录，不存在时创建
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// `dump_file` 优先，否则使用 `<login>.json`
    pub fn key_for(login: &str, dump_file: Option<&str>) -> String {
        match dump_file {
            Some(name) => name.to_string(),
            None => format!("{login}.json"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub async fn load(&self, key: &str) -> Result<Option<CookieJar>> {
        let path = self.path(key);
        if !tokio::fs::try_exists(&path).await? {
            debug!(path = %path.display(), "没有已保存的 Cookie");
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let jar: CookieJar = serde_json::from_str(&contents)?;
        info!(path = %path.display(), count = jar.len(), "已加载保存的 Cookie");
        Ok(Some(jar))
    }

    pub async fn save(&self, key: &str, jar: &CookieJar) -> Result<()> {
        let path = self.path(key);
        let contents = serde_json::to_string_pretty(jar)?;
        tokio::fs::write(&path, contents).await?;
        info!(path = %path.display(), count = jar.len(), "Cookie 已保存");
        Ok(())
    }

    /// 删除保存的 Cookie，下次连接时重新登录
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "已删除保存的 Cookie");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
