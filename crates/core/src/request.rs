//! 请求对象
//!
//! 表示一个正在处理中的请求。请求由 HTTP 层创建并以 `Arc` 共享，
//! 核心查找只返回共享引用，不负责创建或销毁。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// 共享的请求引用
pub type SharedRequest = Arc<Request>;

/// 正在处理中的请求
#[derive(Debug)]
pub struct Request {
    id: Uuid,
    method: String,
    path: String,
    host: String,
    scheme: String,
    /// 小写 header 名 -> 值
    headers: HashMap<String, String>,
    received_at: DateTime<Utc>,
    /// 请求级临时状态（例如事务簿记）
    annotations: Mutex<HashMap<String, serde_json::Value>>,
}

/// 请求摘要（用于日志和接口输出）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSummary {
    pub id: Uuid,
    pub method: String,
    pub path: String,
    pub db_id: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl Request {
    pub fn builder(method: impl Into<String>, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, path)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// 按名称读取 header（大小写不敏感）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// 请求遍历进入的数据库 ID，即路径的第一段
    pub fn db_id(&self) -> Option<&str> {
        self.path
            .trim_start_matches('/')
            .split('/')
            .next()
            .filter(|segment| !segment.is_empty())
    }

    /// 写入请求注解，返回旧值
    pub fn annotate(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.annotations.lock().insert(key.into(), value)
    }

    pub fn annotation(&self, key: &str) -> Option<serde_json::Value> {
        self.annotations.lock().get(key).cloned()
    }

    pub fn take_annotation(&self, key: &str) -> Option<serde_json::Value> {
        self.annotations.lock().remove(key)
    }

    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            id: self.id,
            method: self.method.clone(),
            path: self.path.clone(),
            db_id: self.db_id().map(str::to_string),
            received_at: self.received_at,
        }
    }
}

/// 请求构建器
#[derive(Debug)]
pub struct RequestBuilder {
    id: Option<Uuid>,
    method: String,
    path: String,
    host: String,
    scheme: String,
    headers: HashMap<String, String>,
}

impl RequestBuilder {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: None,
            method: method.into(),
            path: path.into(),
            host: "localhost".to_string(),
            scheme: "http".to_string(),
            headers: HashMap::new(),
        }
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn build(self) -> Request {
        Request {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            method: self.method,
            path: self.path,
            host: self.host,
            scheme: self.scheme,
            headers: self.headers,
            received_at: Utc::now(),
            annotations: Mutex::new(HashMap::new()),
        }
    }

    pub fn shared(self) -> SharedRequest {
        Arc::new(self.build())
    }
}
