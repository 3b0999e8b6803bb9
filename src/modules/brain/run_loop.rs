use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::info;

use super::llm::AssistantApi;
use super::protocol::{Run, RunStatus, ToolCall, ToolOutput};
use super::tools::ToolExecutor;

/// classify 之后循环要做的事
#[derive(Debug)]
pub enum LoopAction {
    /// 远端还在干活，睡一个轮询间隔再拉状态
    Wait,
    /// 远端卡在 requires_action，等本地工具喂结果
    Dispatch(Vec<ToolCall>),
    /// 终态成功
    Finish,
    /// 终态失败 (failed / cancelled / expired)
    Abort(RunStatus),
}

/// 状态分类是纯函数，不碰时间也不碰传输层
pub fn classify(run: &Run) -> LoopAction {
    match run.status {
        RunStatus::Completed => LoopAction::Finish,
        RunStatus::RequiresAction => LoopAction::Dispatch(run.pending_tool_calls()),
        s if s.is_terminal() => LoopAction::Abort(s),
        _ => LoopAction::Wait,
    }
}

#[derive(Debug, Clone)]
pub struct TranscriptLine {
    pub role: String,
    pub text: String,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// 消息历史头部 (最新一条) 的文本
    pub summary: String,
    /// 全部消息，按远端返回的顺序，不做二次排序
    pub transcript: Vec<TranscriptLine>,
}

pub struct DispatchLoop<'a, A: AssistantApi> {
    api: &'a A,
    executor: &'a ToolExecutor,
    poll_interval: Duration,
    run_timeout: Duration,
}

impl<'a, A: AssistantApi> DispatchLoop<'a, A> {
    pub fn new(
        api: &'a A,
        executor: &'a ToolExecutor,
        poll_interval: Duration,
        run_timeout: Duration,
    ) -> Self {
        Self { api, executor, poll_interval, run_timeout }
    }

    /// 驱动一个 run 到终态。整个 drive 是一个普通 future，
    /// 调用方可以用 tokio::time::timeout / select! 施加取消
    pub async fn drive(&self, mut run: Run) -> Result<RunOutcome> {
        let thread_id = run.thread_id.clone();
        let started = Instant::now();

        loop {
            match classify(&run) {
                LoopAction::Finish => {
                    info!("✅ Run {} completed.", run.id);
                    return self.collect_outcome(&thread_id).await;
                }
                LoopAction::Abort(status) => {
                    bail!("Run {} ended in terminal status '{}'", run.id, status);
                }
                LoopAction::Dispatch(calls) => {
                    if calls.is_empty() {
                        bail!("Run {} requires action but lists no tool calls", run.id);
                    }
                    info!("🔧 Run {} requires action ({} tool calls)", run.id, calls.len());
                    let mut outputs: Vec<ToolOutput> = Vec::with_capacity(calls.len());
                    for call in &calls {
                        outputs.push(self.executor.execute(call).await?);
                    }
                    // 一次性提交整批输出，run 回到运行态
                    run = self.api.submit_tool_outputs(&thread_id, &run.id, &outputs).await?;
                }
                LoopAction::Wait => {
                    if started.elapsed() >= self.run_timeout {
                        bail!(
                            "Run {} still '{}' after {:?}. Giving up.",
                            run.id, run.status, self.run_timeout
                        );
                    }
                    sleep(self.poll_interval).await;
                    run = self.api.retrieve_run(&thread_id, &run.id).await?;
                }
            }
        }
    }

    /// 消息历史 index 0 是最新一条 (order=desc 在拉取时已固定)
    async fn collect_outcome(&self, thread_id: &str) -> Result<RunOutcome> {
        let messages = self.api.list_messages(thread_id).await?;

        let mut transcript = Vec::with_capacity(messages.len());
        for msg in &messages {
            let line = TranscriptLine {
                role: msg.role.clone(),
                text: msg.text(),
                logged_at: Utc::now(),
            };
            info!("🧾 [{}] {}", line.role, line.text);
            transcript.push(line);
        }

        let summary = match messages.first() {
            Some(head) => head.text(),
            None => bail!("Thread {} has no messages after completion", thread_id),
        };

        Ok(RunOutcome { summary, transcript })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::app_profile::NewsConfig;
    use crate::modules::brain::protocol::{
        FunctionCall, RequiredAction, SubmitToolOutputs, ThreadMessage,
    };
    use crate::modules::perception::NewsSentinel;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use reqwest::Client;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn run(status: RunStatus, calls: Vec<ToolCall>) -> Run {
        Run {
            id: "run_1".to_string(),
            thread_id: "thread_1".to_string(),
            status,
            required_action: if calls.is_empty() {
                None
            } else {
                Some(RequiredAction {
                    submit_tool_outputs: SubmitToolOutputs { tool_calls: calls },
                })
            },
        }
    }

    fn get_news_call() -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            function: FunctionCall {
                name: "get_news".to_string(),
                arguments: "{\"topic\":\"Crypto\"}".to_string(),
            },
        }
    }

    fn assistant_message(text: &str) -> ThreadMessage {
        serde_json::from_value(serde_json::json!({
            "id": "msg_1",
            "role": "assistant",
            "content": [{"type": "text", "text": {"value": text, "annotations": []}}]
        }))
        .unwrap()
    }

    /// 脚本化传输层：retrieve / submit 每次消费时间线上的下一个状态
    struct ScriptedApi {
        timeline: Mutex<VecDeque<Run>>,
        submitted: Mutex<Vec<Vec<ToolOutput>>>,
        messages: Vec<ThreadMessage>,
    }

    impl ScriptedApi {
        fn new(timeline: Vec<Run>, messages: Vec<ThreadMessage>) -> Self {
            Self {
                timeline: Mutex::new(timeline.into()),
                submitted: Mutex::new(Vec::new()),
                messages,
            }
        }

        fn next_state(&self) -> Result<Run> {
            self.timeline
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow!("scripted timeline exhausted"))
        }
    }

    #[async_trait]
    impl AssistantApi for ScriptedApi {
        async fn create_assistant(&self, _: &str, _: &str, _: &[Value], _: &str) -> Result<String> {
            Err(anyhow!("not scripted"))
        }
        async fn create_thread(&self) -> Result<String> {
            Err(anyhow!("not scripted"))
        }
        async fn create_message(&self, _: &str, _: &str, _: &str) -> Result<()> {
            Err(anyhow!("not scripted"))
        }
        async fn create_run(&self, _: &str, _: &str, _: &str) -> Result<Run> {
            Err(anyhow!("not scripted"))
        }
        async fn retrieve_run(&self, _: &str, _: &str) -> Result<Run> {
            self.next_state()
        }
        async fn submit_tool_outputs(&self, _: &str, _: &str, outputs: &[ToolOutput]) -> Result<Run> {
            self.submitted.lock().unwrap().push(outputs.to_vec());
            self.next_state()
        }
        async fn list_messages(&self, _: &str) -> Result<Vec<ThreadMessage>> {
            Ok(self.messages.clone())
        }
    }

    fn executor() -> ToolExecutor {
        let profile = NewsConfig { base_url: "http://127.0.0.1:9".to_string(), page_size: 5 };
        ToolExecutor::new(NewsSentinel::new(Client::new(), &profile))
    }

    fn dispatch_loop<'a>(api: &'a ScriptedApi, executor: &'a ToolExecutor) -> DispatchLoop<'a, ScriptedApi> {
        DispatchLoop::new(api, executor, Duration::ZERO, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn drives_tool_call_cycle_to_completion() {
        let api = ScriptedApi::new(
            vec![
                run(RunStatus::RequiresAction, vec![get_news_call()]),
                run(RunStatus::InProgress, vec![]),
                run(RunStatus::Completed, vec![]),
            ],
            vec![assistant_message("BTC rallied")],
        );
        let executor = executor();

        let outcome = dispatch_loop(&api, &executor)
            .drive(run(RunStatus::InProgress, vec![]))
            .await
            .unwrap();

        assert_eq!(outcome.summary, "BTC rallied");
        let submitted = api.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1, "exactly one tool-output batch");
        assert_eq!(submitted[0].len(), 1);
        assert_eq!(submitted[0][0].tool_call_id, "call_1");
    }

    #[tokio::test]
    async fn terminal_failure_stops_the_loop() {
        let api = ScriptedApi::new(vec![run(RunStatus::Failed, vec![])], vec![]);
        let executor = executor();

        let err = dispatch_loop(&api, &executor)
            .drive(run(RunStatus::Queued, vec![]))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("failed"));
        assert!(api.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_aborts_without_submitting() {
        let bad_call = ToolCall {
            id: "call_9".to_string(),
            function: FunctionCall { name: "get_weather".to_string(), arguments: "{}".to_string() },
        };
        let api = ScriptedApi::new(vec![], vec![]);
        let executor = executor();

        let err = dispatch_loop(&api, &executor)
            .drive(run(RunStatus::RequiresAction, vec![bad_call]))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("get_weather"));
        assert!(api.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_timeout_bounds_the_loop() {
        let api = ScriptedApi::new(vec![], vec![]);
        let executor = executor();
        let dispatch = DispatchLoop::new(&api, &executor, Duration::ZERO, Duration::ZERO);

        let err = dispatch.drive(run(RunStatus::InProgress, vec![])).await.unwrap_err();
        assert!(err.to_string().contains("Giving up"));
    }

    #[tokio::test]
    async fn completed_thread_without_messages_is_an_error() {
        let api = ScriptedApi::new(vec![], vec![]);
        let executor = executor();

        let err = dispatch_loop(&api, &executor)
            .drive(run(RunStatus::Completed, vec![]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no messages"));
    }
}
