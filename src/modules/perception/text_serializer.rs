use std::fmt;
use super::structs::{Article, NewsBatch};

impl fmt::Display for Article {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let na = "N/A";
        write!(f,
            "\n--- ARTICLE ---\n\
            Title: {}\n\
            Author: {}\n\
            Source: {}\n\
            Description: {}\n\
            URL: {}\n\
            Content: {}\n\
            ---------------",
            self.title.as_deref().unwrap_or(na),
            self.author.as_deref().unwrap_or(na),
            self.source_name.as_deref().unwrap_or(na),
            self.description.as_deref().unwrap_or(na),
            self.url.as_deref().unwrap_or(na),
            self.content.as_deref().unwrap_or(na),
        )
    }
}

/// 把一批文章拼成给 LLM 阅读的纯文本。抓取失败/空结果也要给出明确说法，
/// 不能让助手拿着空串自由发挥
pub fn render_digest(batch: &NewsBatch) -> String {
    if batch.degraded {
        return "News fetch failed. No articles are available right now.".to_string();
    }
    if batch.articles.is_empty() {
        return "No articles were found for this topic.".to_string();
    }

    let mut output = format!("Fetched {} articles:\n", batch.articles.len());
    for (i, article) in batch.articles.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, article));
    }
    output
}
