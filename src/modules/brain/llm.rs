use async_trait::async_trait;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::env;

use crate::config::app_profile::AssistantConfig;
use super::protocol::{MessageList, ObjectRef, Run, ThreadMessage, ToolOutput};

/// 助手平台的传输层。拆成 trait 之后轮询状态机可以用脚本化的
/// 假实现驱动，不碰网络也不真睡眠
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_assistant(
        &self,
        name: &str,
        instructions: &str,
        tools: &[Value],
        model: &str,
    ) -> Result<String>;

    async fn create_thread(&self) -> Result<String>;

    async fn create_message(&self, thread_id: &str, role: &str, content: &str) -> Result<()>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str, instructions: &str) -> Result<Run>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run>;

    /// 整个消息历史，新的在前 (order=desc 在请求里写死)
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(client: Client, profile: &AssistantConfig) -> Self {
        Self {
            client,
            api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: profile.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("OpenAI-Beta", "assistants=v2")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", path))?;

        Self::decode(path, resp).await
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("OpenAI-Beta", "assistants=v2")
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?;

        Self::decode(path, resp).await
    }

    async fn decode(path: &str, resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!("Assistant API {} on {}: {}", status, path, text));
        }
        serde_json::from_str(&text).with_context(|| format!("Bad JSON from {}", path))
    }
}

#[async_trait]
impl AssistantApi for OpenAiClient {
    async fn create_assistant(
        &self,
        name: &str,
        instructions: &str,
        tools: &[Value],
        model: &str,
    ) -> Result<String> {
        let body = json!({
            "name": name,
            "instructions": instructions,
            "tools": tools,
            "model": model,
        });
        let value = self.post("/assistants", body).await?;
        let obj: ObjectRef = serde_json::from_value(value).context("Assistant response has no id")?;
        Ok(obj.id)
    }

    async fn create_thread(&self) -> Result<String> {
        let value = self.post("/threads", json!({})).await?;
        let obj: ObjectRef = serde_json::from_value(value).context("Thread response has no id")?;
        Ok(obj.id)
    }

    async fn create_message(&self, thread_id: &str, role: &str, content: &str) -> Result<()> {
        let body = json!({ "role": role, "content": content });
        self.post(&format!("/threads/{}/messages", thread_id), body).await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str, instructions: &str) -> Result<Run> {
        let body = json!({ "assistant_id": assistant_id, "instructions": instructions });
        let value = self.post(&format!("/threads/{}/runs", thread_id), body).await?;
        serde_json::from_value(value).context("Bad run object from create")
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let value = self.get(&format!("/threads/{}/runs/{}", thread_id, run_id)).await?;
        serde_json::from_value(value).context("Bad run object from retrieve")
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run> {
        let body = json!({ "tool_outputs": outputs });
        let value = self
            .post(&format!("/threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id), body)
            .await?;
        serde_json::from_value(value).context("Bad run object from submit")
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let value = self.get(&format!("/threads/{}/messages?order=desc&limit=100", thread_id)).await?;
        let list: MessageList = serde_json::from_value(value).context("Bad message list")?;
        Ok(list.data)
    }
}
