use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub exam: ExamConfig,
    pub evaluation: EvaluationConfig,
}

/// 应用设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub system_name: String,
    pub environment: String,
    pub log_level: String,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub unix_socket_path: String,
    pub workers: usize,
    pub max_workers: usize,
    pub timeouts: TimeoutConfig,
    pub limits: LimitConfig,
}

/// 超时配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub client_request: u64,
    pub client_disconnect: u64,
    pub keep_alive: u64,
}

/// 限制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    pub max_payload_size: usize,
}

/// JWT 配置（令牌由身份服务签发，这里只做校验）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    pub secret: String,
    pub access_token_expiry: i64,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,    // 数据库连接 URL（从 scheme 自动推断类型）
    pub pool_size: u32, // 连接池大小
    pub timeout: u64,   // 连接超时 (秒)
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub max_age: usize,
}

/// 考试相关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamConfig {
    /// 启动时导入的考试定义文件（JSON），为空则跳过
    #[serde(default)]
    pub seed_file: String,
    /// 过期会话扫描间隔（秒），0 表示关闭
    pub sweep_interval_secs: u64,
}

/// 评分配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// 自动评分后端名称：openai / disabled
    pub scorer: String,
    /// 提交成功后是否在后台自动评阅主观题
    pub auto_evaluate_on_submit: bool,
    pub openai: OpenAiScorerConfig,
}

/// OpenAI 兼容评分后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiScorerConfig {
    pub base_url: String,
    #[serde(skip_serializing, default)]
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_min_ms: u64,
    pub backoff_max_ms: u64,
}
