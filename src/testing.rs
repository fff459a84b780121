//! In-memory executor for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use url::Url;

use crate::error::{CybsiError, Result};
use crate::executor::{ApiRequest, ApiResponse, Executor};

/// Replays queued responses in order and records every request.
#[derive(Debug, Default)]
pub(crate) struct ScriptedExecutor {
    responses: Mutex<VecDeque<Result<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push(&self, response: Result<ApiResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_json(&self, body: serde_json::Value, headers: &[(&'static str, &str)]) {
        self.push(Ok(json_response(body, headers)));
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CybsiError::InvalidData("no scripted response left".into())))
    }
}

pub(crate) fn json_response(
    body: serde_json::Value,
    headers: &[(&'static str, &str)],
) -> ApiResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(
            HeaderName::from_static(name),
            HeaderValue::from_str(value).unwrap(),
        );
    }

    ApiResponse {
        url: Url::parse("http://cybsi.test/api/replists").unwrap(),
        status: StatusCode::OK,
        headers: map,
        body: serde_json::to_vec(&body).unwrap().into(),
    }
}
