use serde::{Serialize, Deserialize};

/// 新闻接口返回的单条文章。上游任何字段都可能缺失，缺了就置 None，不报错
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: Option<String>,
    pub author: Option<String>,
    pub source_name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

/// [设计] 带降级标记的抓取结果。degraded=true 表示这次抓取失败被就地吞掉了，
/// 和"真的查不到新闻"区分开
#[derive(Debug, Clone, Default)]
pub struct NewsBatch {
    pub articles: Vec<Article>,
    pub degraded: bool,
}

impl NewsBatch {
    pub fn failed() -> Self {
        Self { articles: Vec::new(), degraded: true }
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

// ---- NewsAPI /v2/everything 返回体 ----

#[derive(Debug, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub articles: Option<Vec<RawArticle>>,
}

#[derive(Debug, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<RawSource>,
}

#[derive(Debug, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub name: Option<String>,
}

impl From<RawArticle> for Article {
    fn from(raw: RawArticle) -> Self {
        Article {
            title: raw.title,
            author: raw.author,
            description: raw.description,
            content: raw.content,
            url: raw.url,
            source_name: raw.source.and_then(|s| s.name),
        }
    }
}
