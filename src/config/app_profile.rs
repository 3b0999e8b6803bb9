use serde::Deserialize;
use config::{Config, File};
use anyhow::{Context, Result};
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub poll_interval_sec: u64,
    pub run_timeout_sec: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewsConfig {
    pub base_url: String,
    pub page_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    pub base_url: String,
    pub model: String,
    pub name: String,
    /// 预置已有的远端 id 可以跳过创建
    #[serde(default)]
    pub assistant_id: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppProfile {
    pub default_topic: String,
    pub news: NewsConfig,
    pub assistant: AssistantConfig,
    pub timing: TimingConfig,
}

impl AppProfile {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name("summarizer_config"))
            .build()?;

        let profile: AppProfile = settings.try_deserialize()?;
        profile.validate()?;
        Ok(profile)
    }

    /// 启动时就把配置里的 URL 校验掉
    fn validate(&self) -> Result<()> {
        Url::parse(&self.news.base_url)
            .with_context(|| format!("Invalid news base_url: {}", self.news.base_url))?;
        Url::parse(&self.assistant.base_url)
            .with_context(|| format!("Invalid assistant base_url: {}", self.assistant.base_url))?;
        Ok(())
    }
}
