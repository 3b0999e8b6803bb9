use reqwest::Client;
use std::time::Duration;
use anyhow::Result;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// 常规短超时 Client，给 NewsAPI 这类普通 REST 接口用
    pub fn create() -> Result<Client> {
        let builder = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(30)));

        let client = builder.build()?;
        Ok(client)
    }

    /// 长超时 Client，给助手平台用 (run 可能要跑很久)
    /// 强制 HTTP/1.1，避免长连接下 HTTP/2 断流
    pub fn create_direct() -> Result<Client> {
        let builder = Client::builder()
            .timeout(Duration::from_secs(600))
            .connect_timeout(Duration::from_secs(30))
            .http1_only()
            .pool_max_idle_per_host(0);

        let client = builder.build()?;
        Ok(client)
    }
}
