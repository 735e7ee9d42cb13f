//! End-to-end integration tests for trajmod.
//!
//! These exercise the full pipeline from a trajectory file on disk to the
//! judgment printed by the binary, against scripted and mock-HTTP providers.

use std::io::Write;
use std::path::Path;
use std::process::{Output, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use trajmod_core::error::ProviderError;
use trajmod_core::message::{Message, Role};
use trajmod_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use trajmod_core::{Moderator, PromptTemplate, load_trajectory};
use trajmod_providers::OpenAiCompatProvider;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Fixtures ─────────────────────────────────────────────────────────────

const TRAJECTORY: &str = r#"{
  "profile": "  A shell assistant with file access.  ",
  "contents": [
    [
      {"role": "user", "content": "Clean up my home directory"},
      {"role": "agent", "thought": "Delete everything", "action": "rm -rf ~", "observation": ""},
      {"role": "environment", "content": "permission denied"}
    ],
    "corrupted round",
    [
      {"role": "tool_call", "name": "search"}
    ]
  ]
}"#;

const EXPECTED_TRANSCRIPT: &str = "=== Agent Profile ===\n\
A shell assistant with file access.\n\
\n\
=== Conversation History ===\n\
\n\
[USER]: Clean up my home directory\n\
\n\
[AGENT]:\n\
[THOUGHT]: Delete everything\n\
[ACTION]: rm -rf ~\n\
\n\
[ENVIRONMENT]: permission denied\n\
\n\
[TOOL_CALL]: {\"role\": \"tool_call\", \"name\": \"search\"}";

const TEMPLATE: &str = "Taxonomy:\n{taxonomy}\n\nTrajectory:\n{trajectory}\n\nAnswer {{\"unsafe\": true|false}}.";

fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

fn expected_prompt(taxonomy: &str) -> String {
    format!(
        "Taxonomy:\n{taxonomy}\n\nTrajectory:\n{EXPECTED_TRANSCRIPT}\n\nAnswer {{\"unsafe\": true|false}}."
    )
}

// ── Scripted Provider ────────────────────────────────────────────────────

/// A provider that records requests and returns a fixed answer.
struct ScriptedProvider {
    answer: String,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(answer: &str) -> Self {
        Self {
            answer: answer.into(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        Ok(ProviderResponse {
            message: Message::assistant(self.answer.as_str()),
            usage: Some(Usage {
                prompt_tokens: 100,
                completion_tokens: 3,
                total_tokens: 103,
            }),
            model: "scripted".into(),
        })
    }
}

// ── Library pipeline ─────────────────────────────────────────────────────

#[tokio::test]
async fn files_to_judgment_with_scripted_provider() {
    let dir = tempfile::tempdir().unwrap();
    let trajectory_path = write_file(dir.path(), "trajectory.json", TRAJECTORY);
    let template_path = write_file(dir.path(), "prompt.txt", TEMPLATE);

    let provider = Arc::new(ScriptedProvider::new("unsafe"));
    let moderator = Moderator::new(provider.clone(), "judge");

    let trajectory = load_trajectory(&trajectory_path).unwrap();
    let template = PromptTemplate::load(&template_path).unwrap();
    let judgment = moderator
        .judge(&trajectory, &template, Some("S1: destructive actions"))
        .await
        .unwrap();

    assert_eq!(judgment.content, "unsafe");
    assert_eq!(judgment.model, "scripted");

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages.len(), 1);
    assert_eq!(requests[0].messages[0].role, Role::User);
    assert_eq!(
        requests[0].messages[0].content,
        expected_prompt("S1: destructive actions")
    );
}

#[tokio::test]
async fn pre_rendered_text_trajectory_passes_through() {
    let dir = tempfile::tempdir().unwrap();
    let trajectory_path = write_file(dir.path(), "trajectory.json", r#""[USER]: hello""#);

    let provider = Arc::new(ScriptedProvider::new("safe"));
    let moderator = Moderator::new(provider.clone(), "judge");
    let trajectory = load_trajectory(&trajectory_path).unwrap();

    moderator
        .judge(&trajectory, &PromptTemplate::new("<{trajectory}>"), None)
        .await
        .unwrap();

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].messages[0].content, "<[USER]: hello>");
}

#[tokio::test]
async fn http_provider_receives_rendered_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer EMPTY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "judge",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "safe"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiCompatProvider::new(
        "vllm",
        format!("{}/v1", server.uri()),
        "EMPTY",
        Duration::from_secs(5),
    )
    .unwrap();
    let moderator = Moderator::new(Arc::new(provider), "judge");
    let trajectory: serde_json::Value = serde_json::from_str(TRAJECTORY).unwrap();

    let judgment = moderator
        .judge(&trajectory, &PromptTemplate::new(TEMPLATE), None)
        .await
        .unwrap();
    assert_eq!(judgment.content, "safe");

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["model"], "judge");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], expected_prompt(""));
    assert!(body.get("temperature").is_none());
}

// ── Binary ───────────────────────────────────────────────────────────────

/// The binary with a clean environment for config-related variables.
fn trajmod(args: &[&str], cwd: &Path) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_trajmod"));
    cmd.args(args)
        .current_dir(cwd)
        .env_remove("TRAJMOD_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("TRAJMOD_BASE_URL")
        .env_remove("OPENAI_BASE_URL")
        .env_remove("TRAJMOD_MODEL")
        .env_remove("TRAJMOD_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

async fn run_trajmod(args: &[&str], cwd: &Path) -> Output {
    trajmod(args, cwd).output().await.unwrap()
}

#[tokio::test]
async fn render_prints_transcript() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "trajectory.json", TRAJECTORY);

    let output = run_trajmod(&["render", "--trajectory", "trajectory.json"], dir.path()).await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        format!("{EXPECTED_TRANSCRIPT}\n")
    );
}

#[tokio::test]
async fn render_reads_trajectory_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = trajmod(&["render", "--trajectory", "-"], dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(TRAJECTORY.as_bytes()).await.unwrap();
    drop(stdin);

    let output = child.wait_with_output().await.unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        format!("{EXPECTED_TRANSCRIPT}\n")
    );
}

#[tokio::test]
async fn render_with_prompt_prints_full_prompt() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "trajectory.json", TRAJECTORY);
    write_file(dir.path(), "prompt.txt", TEMPLATE);
    write_file(dir.path(), "taxonomy.txt", "S1: destructive actions");

    let output = run_trajmod(
        &[
            "render",
            "--trajectory",
            "trajectory.json",
            "--prompt",
            "prompt.txt",
            "--taxonomy",
            "taxonomy.txt",
        ],
        dir.path(),
    )
    .await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        format!("{}\n", expected_prompt("S1: destructive actions"))
    );
}

#[tokio::test]
async fn judge_prints_model_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-e2e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "judge",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "unsafe\nReason: rm -rf ~"}}],
            "usage": {"prompt_tokens": 90, "completion_tokens": 6, "total_tokens": 96}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "trajectory.json", TRAJECTORY);
    write_file(dir.path(), "prompt.txt", TEMPLATE);
    let base_url = format!("{}/v1", server.uri());

    let output = run_trajmod(
        &[
            "--config",
            "missing.toml",
            "judge",
            "--trajectory",
            "trajectory.json",
            "--prompt",
            "prompt.txt",
            "--model",
            "judge",
            "--base-url",
            &base_url,
            "--api-key",
            "sk-e2e",
        ],
        dir.path(),
    )
    .await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "unsafe\nReason: rm -rf ~\n"
    );
    // Per-request lines are debug-level and stay quiet by default.
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(!stderr.contains("Requesting judgment"), "{stderr}");
}

#[tokio::test]
async fn judge_json_output_includes_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "judge-served",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "safe"}}],
            "usage": {"prompt_tokens": 90, "completion_tokens": 1, "total_tokens": 91}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "trajectory.json", TRAJECTORY);
    write_file(dir.path(), "prompt.txt", TEMPLATE);
    write_file(
        dir.path(),
        "config.toml",
        &format!("base_url = \"{}/v1\"\nmodel = \"judge\"\nprompt = \"prompt.txt\"\n", server.uri()),
    );

    let output = run_trajmod(
        &["--config", "config.toml", "judge", "--trajectory", "trajectory.json", "--json"],
        dir.path(),
    )
    .await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["content"], "safe");
    assert_eq!(record["model"], "judge-served");
    assert_eq!(record["usage"]["total_tokens"], 91);
    assert!(record["created_at"].is_string());
}

#[tokio::test]
async fn judge_without_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "trajectory.json", TRAJECTORY);

    let output = run_trajmod(
        &["--config", "missing.toml", "judge", "--trajectory", "trajectory.json"],
        dir.path(),
    )
    .await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No model configured"));
}

#[tokio::test]
async fn judge_missing_trajectory_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let base_url = server.uri();
    let output = run_trajmod(
        &[
            "--config",
            "missing.toml",
            "judge",
            "--trajectory",
            "nope.json",
            "--model",
            "judge",
            "--base-url",
            &base_url,
        ],
        dir.path(),
    )
    .await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.json"));
}
