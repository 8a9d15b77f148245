use super::BROKEN_RELEASE_ID;
use mockito::{Mock, Server, ServerGuard};
use serde_json::{json, Value};

/// Mock OpenAI chat endpoint.
///
/// Each batch is answered deterministically from its descriptions the way a
/// sloppy model might: every word is offered as a color, "clear" included.
/// A batch containing [`BROKEN_RELEASE_ID`] gets a body that is not a chat
/// response at all, which fails that request.
pub struct MockOpenAI {
    pub server: ServerGuard,
    pub mock: Mock,
}

impl MockOpenAI {
    pub async fn start() -> Self {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body_from_request(|request| {
                let body: Value = serde_json::from_slice(request.body().unwrap()).unwrap();
                answer_batch(&body).into_bytes()
            })
            .expect_at_least(1)
            .create_async()
            .await;
        Self { server, mock }
    }

    pub fn base_url(&self) -> String {
        self.server.url()
    }
}

fn answer_entry(entry: &Value) -> Value {
    let description = entry["description"].as_str().unwrap_or_default();
    let lower = description.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let pattern = ["swirl", "marbled", "sunburst"]
        .into_iter()
        .find(|p| words.contains(p));
    let texture = words.contains(&"translucent").then_some("Translucent");

    json!({
        "id": entry["id"],
        "description": "model rewrote this",
        "humanReadableColor": description,
        "cssReadableColors": words,
        "pattern": pattern,
        "texture": texture
    })
}

fn answer_batch(request: &Value) -> String {
    let user = request["messages"][1]["content"].as_str().unwrap_or("[]");
    let entries: Vec<Value> = serde_json::from_str(user).unwrap_or_default();

    if entries
        .iter()
        .any(|e| e["id"].as_str() == Some(BROKEN_RELEASE_ID))
    {
        return "<html>upstream error</html>".to_string();
    }

    let records: Vec<Value> = entries.iter().map(answer_entry).collect();
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": request["model"],
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": json!({"records": records}).to_string()},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 100, "completion_tokens": 50, "total_tokens": 150}
    })
    .to_string()
}
