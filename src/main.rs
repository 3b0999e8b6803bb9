use std::env;
use anyhow::Result;
use chrono::Local;
use dotenvy::dotenv;
use tracing::{info, warn};

use news_summarizer::config::AppProfile;
use news_summarizer::modules::brain::{AssistantSession, OpenAiClient, ToolExecutor};
use news_summarizer::modules::perception::NewsSentinel;
use news_summarizer::utils::HttpClientFactory;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();
    info!("Starting News Summarizer ({})...", Local::now().format("%Y-%m-%d %H:%M:%S"));

    // 1. 基础设施初始化
    let profile = AppProfile::load().expect("Failed to load summarizer config");
    let topic = env::args().nth(1).unwrap_or_else(|| profile.default_topic.clone());
    info!("🔍 Topic: {}", topic);

    let std_client = HttpClientFactory::create()?;
    let direct_client = HttpClientFactory::create_direct()?;

    let news = NewsSentinel::new(std_client, &profile.news);

    // 2. 先把头条打出来，后面没配助手也有产出
    let batch = news.search(&topic).await;
    if batch.degraded {
        warn!("📰 News fetch degraded. Proceeding without articles.");
    }
    match batch.articles.first() {
        Some(top) => info!("📰 Top story:{}", top),
        None => warn!("📰 No articles for '{}'", topic),
    }

    // 3. 助手侧是可选的
    let api = OpenAiClient::new(direct_client, &profile.assistant);
    if !api.is_configured() {
        warn!("🤖 OPENAI_API_KEY not set. Skipping summarization.");
        return Ok(());
    }

    let executor = ToolExecutor::new(news.clone());
    let mut session =
        AssistantSession::new(api, executor, profile.assistant.clone(), profile.timing.clone());

    let outcome = session.summarize(&topic).await?;

    info!("==================== 📝 SUMMARY ====================");
    for line in outcome.summary.lines() {
        info!("{}", line);
    }
    info!("====================================================");

    Ok(())
}
