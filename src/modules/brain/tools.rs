use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::modules::perception::{render_digest, NewsSentinel};
use super::protocol::{ToolCall, ToolOutput};

/// 助手声明的本地工具。声明列表和派发共用同一个枚举，
/// 不存在"声明了但没人处理"的函数名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantTool {
    GetNews,
}

pub const ALL_TOOLS: &[AssistantTool] = &[AssistantTool::GetNews];

impl AssistantTool {
    pub fn name(self) -> &'static str {
        match self {
            AssistantTool::GetNews => "get_news",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ALL_TOOLS.iter().copied().find(|t| t.name() == name)
    }

    /// OpenAI function-tool 声明体
    pub fn definition(self) -> Value {
        match self {
            AssistantTool::GetNews => json!({
                "type": "function",
                "function": {
                    "name": self.name(),
                    "description": "Fetch recent news articles on a given topic",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "topic": {
                                "type": "string",
                                "description": "The topic to search news for, e.g. 'Crypto'"
                            }
                        },
                        "required": ["topic"]
                    }
                }
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetNewsArgs {
    topic: String,
}

/// 按函数名把远端的工具调用派发到本地实现
pub struct ToolExecutor {
    news: NewsSentinel,
}

impl ToolExecutor {
    pub fn new(news: NewsSentinel) -> Self {
        Self { news }
    }

    pub fn declared_tools(&self) -> Vec<Value> {
        ALL_TOOLS.iter().map(|t| t.definition()).collect()
    }

    /// 未注册的函数名是致命错误，整个派发周期中止，不提交任何输出
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput> {
        let tool = AssistantTool::from_name(&call.function.name).ok_or_else(|| {
            anyhow!("Assistant requested unknown function '{}'", call.function.name)
        })?;

        let output = match tool {
            AssistantTool::GetNews => {
                let args: GetNewsArgs = serde_json::from_str(&call.function.arguments)
                    .with_context(|| format!("Bad arguments for get_news: {}", call.function.arguments))?;
                info!("🔧 [get_news] topic: {}", args.topic);
                let batch = self.news.search(&args.topic).await;
                render_digest(&batch)
            }
        };

        Ok(ToolOutput { tool_call_id: call.id.clone(), output })
    }
}
