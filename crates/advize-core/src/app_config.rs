use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub apify_api_token: String,
    pub apify_base_url: String,
    pub instagram_actor: String,
    pub scrape_timeout_secs: u64,
    pub run_wait_secs: u64,
    pub http_timeout_secs: u64,
    pub proxy_timeout_secs: u64,
    pub proxy_user_agent: String,
    pub proxy_allowed_hosts: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("apify_api_token", &"[redacted]")
            .field("apify_base_url", &self.apify_base_url)
            .field("instagram_actor", &self.instagram_actor)
            .field("scrape_timeout_secs", &self.scrape_timeout_secs)
            .field("run_wait_secs", &self.run_wait_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("proxy_timeout_secs", &self.proxy_timeout_secs)
            .field("proxy_user_agent", &self.proxy_user_agent)
            .field("proxy_allowed_hosts", &self.proxy_allowed_hosts)
            .finish()
    }
}
