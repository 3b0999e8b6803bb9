use anyhow::{bail, Context, Result};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::app_profile::{AssistantConfig, TimingConfig};
use super::llm::AssistantApi;
use super::protocol::Run;
use super::run_loop::{DispatchLoop, RunOutcome};
use super::tools::ToolExecutor;

/// 助手的人设。创建远端定义和每次 run 复用同一份
pub const ASSISTANT_INSTRUCTIONS: &str = "You are a personal news summarizer. \
When asked about a topic, call the get_news function to fetch recent articles, \
then write a short digest: one headline line plus a one or two sentence summary \
per article, followed by an overall takeaway.";

/// 会话内缓存的两个远端 id。不用进程级全局变量，
/// 并发跑多个会话时各自持有自己的 id
#[derive(Debug, Clone, Default)]
pub struct SessionIds {
    pub assistant_id: Option<String>,
    pub thread_id: Option<String>,
}

pub struct AssistantSession<A: AssistantApi> {
    api: A,
    executor: ToolExecutor,
    profile: AssistantConfig,
    timing: TimingConfig,
    session_id: Uuid,
    ids: SessionIds,
}

impl<A: AssistantApi> AssistantSession<A> {
    pub fn new(api: A, executor: ToolExecutor, profile: AssistantConfig, timing: TimingConfig) -> Self {
        // 配置里可以预置已有的 assistant/thread id，跳过远端创建
        let ids = SessionIds {
            assistant_id: profile.assistant_id.clone(),
            thread_id: profile.thread_id.clone(),
        };
        Self { api, executor, profile, timing, session_id: Uuid::new_v4(), ids }
    }

    /// 幂等：本会话已持有 id 就不再创建
    pub async fn ensure_assistant(&mut self) -> Result<String> {
        if let Some(id) = &self.ids.assistant_id {
            return Ok(id.clone());
        }
        let id = self.api
            .create_assistant(
                &self.profile.name,
                ASSISTANT_INSTRUCTIONS,
                &self.executor.declared_tools(),
                &self.profile.model,
            )
            .await
            .context("Failed to create assistant definition")?;
        info!("🤖 [{}] Assistant created: {}", self.session_id, id);
        self.ids.assistant_id = Some(id.clone());
        Ok(id)
    }

    pub async fn ensure_thread(&mut self) -> Result<String> {
        if let Some(id) = &self.ids.thread_id {
            return Ok(id.clone());
        }
        let id = self.api.create_thread().await.context("Failed to create thread")?;
        info!("🧵 [{}] Thread created: {}", self.session_id, id);
        self.ids.thread_id = Some(id.clone());
        Ok(id)
    }

    /// 没有 thread 之前禁止发消息，宁可快速报错也不静默吞掉
    pub async fn post_message(&self, role: &str, content: &str) -> Result<()> {
        let Some(thread_id) = &self.ids.thread_id else {
            bail!("Cannot post a message before a thread exists. Call ensure_thread() first.");
        };
        self.api.create_message(thread_id, role, content).await
    }

    pub async fn start_run(&self, instructions: &str) -> Result<Run> {
        let (Some(assistant_id), Some(thread_id)) =
            (&self.ids.assistant_id, &self.ids.thread_id)
        else {
            bail!("Cannot start a run before assistant and thread exist.");
        };
        self.api.create_run(thread_id, assistant_id, instructions).await
    }

    /// 整条链路：确保定义和线程、投递话题、起 run、轮询到终态
    pub async fn summarize(&mut self, topic: &str) -> Result<RunOutcome> {
        self.ensure_assistant().await?;
        self.ensure_thread().await?;

        self.post_message("user", &format!("Summarize today's news on {}.", topic))
            .await?;

        let run = self.start_run(ASSISTANT_INSTRUCTIONS).await?;
        info!("🏃 [{}] Run {} started (status: {})", self.session_id, run.id, run.status);

        let dispatch = DispatchLoop::new(
            &self.api,
            &self.executor,
            Duration::from_secs(self.timing.poll_interval_sec),
            Duration::from_secs(self.timing.run_timeout_sec),
        );
        dispatch.drive(run).await
    }
}
