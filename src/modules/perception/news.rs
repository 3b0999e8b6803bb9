use reqwest::Client;
use std::env;
use tracing::warn;

use crate::config::app_profile::NewsConfig;
use super::structs::{Article, NewsBatch, NewsResponse};

/// NewsAPI 接受的 pageSize 上限
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct NewsSentinel {
    client: Client,
    api_key: String,
    base_url: String,
    page_size: u32,
}

impl NewsSentinel {
    pub fn new(client: Client, profile: &NewsConfig) -> Self {
        Self {
            client,
            api_key: env::var("NEWS_API_KEY").unwrap_or_default(),
            base_url: profile.base_url.trim_end_matches('/').to_string(),
            page_size: profile.page_size,
        }
    }

    pub async fn search(&self, topic: &str) -> NewsBatch {
        self.search_with_page_size(topic, self.page_size).await
    }

    /// 抓取失败一律吞掉并返回 degraded 空结果，绝不向调用方抛错
    pub async fn search_with_page_size(&self, topic: &str, page_size: u32) -> NewsBatch {
        if topic.trim().is_empty() {
            warn!("📰 Empty topic. Skipping news fetch.");
            return NewsBatch::failed();
        }

        let url = format!("{}/v2/everything", self.base_url);
        let params = [
            ("q", topic.to_string()),
            ("apiKey", self.api_key.clone()),
            ("pageSize", clamp_page_size(page_size).to_string()),
        ];

        let resp = match self.client.get(&url)
            .query(&params)
            .header("User-Agent", "news_summarizer/1.2")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("📰 Failed to fetch news (network): {}", e);
                return NewsBatch::failed();
            }
        };

        if !resp.status().is_success() {
            warn!("📰 Failed to fetch news (HTTP {})", resp.status());
            return NewsBatch::failed();
        }

        match resp.json::<NewsResponse>().await {
            Ok(body) => match body.articles {
                Some(raw) => NewsBatch {
                    articles: raw.into_iter().map(Article::from).collect(),
                    degraded: false,
                },
                None => {
                    warn!("📰 News response carries no 'articles' (status: {:?})", body.status);
                    NewsBatch::failed()
                }
            },
            Err(e) => {
                warn!("📰 Failed to decode news response: {}", e);
                NewsBatch::failed()
            }
        }
    }
}

fn clamp_page_size(size: u32) -> u32 {
    size.clamp(1, MAX_PAGE_SIZE)
}
