//! Integration tests for the GPU agent HTTP surface.
//!
//! Vendor tools are stood in for by shell scripts in a temporary directory
//! that replaces the search path.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use gpu_agent_core::{AgentConfig, BackendOverride};
use gpu_agent_server::{create_app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

const NVIDIA_SMI_OUTPUT: &str = "NVIDIA RTX 4090, 24576, 8192, 16384, 65, 45\n\
                                 NVIDIA RTX 3090, 24576, 12288, 12288, 72, 80";

const ROCM_SMI_OUTPUT: &str = "card series,temperature,gpu use (%),vram total memory (b),vram total used memory (b)\n\
                               AMD Radeon RX 7900 XTX,55,30,25769803776,8589934592";

fn create_test_app(backend: BackendOverride, search_dir: &Path) -> Router {
    create_test_app_with_timeout(backend, search_dir, Duration::from_secs(10))
}

fn create_test_app_with_timeout(
    backend: BackendOverride,
    search_dir: &Path,
    query_timeout: Duration,
) -> Router {
    let config = AgentConfig {
        backend,
        query_timeout,
        search_path: Some(search_dir.as_os_str().to_owned()),
    };
    create_app(Arc::new(AppState::new(config)))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[cfg(unix)]
fn write_tool(dir: &Path, name: &str, body: &str) {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
}

#[cfg(unix)]
fn print_tool(dir: &Path, name: &str, output: &str) {
    write_tool(dir, name, &format!("cat <<'EOF'\n{output}\nEOF"));
}

#[tokio::test]
async fn test_gpu_without_backend_is_503() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(BackendOverride::Auto, dir.path());

    let (status, body) = get_json(app, "/gpu").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body["error"],
        "No GPU backend available. Install nvidia-smi or rocm-smi."
    );
}

#[tokio::test]
async fn test_health_without_backend() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(BackendOverride::Auto, dir.path());

    let (status, body) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "backend": null }));
}

#[tokio::test]
async fn test_health_reports_forced_backend() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(BackendOverride::Amd, dir.path());

    let (status, body) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "amd");
}

#[cfg(unix)]
#[tokio::test]
async fn test_gpu_returns_nvidia_records() {
    let dir = tempfile::tempdir().unwrap();
    print_tool(dir.path(), "nvidia-smi", NVIDIA_SMI_OUTPUT);
    let app = create_test_app(BackendOverride::Auto, dir.path());

    let (status, body) = get_json(app, "/gpu").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {
                "name": "NVIDIA RTX 4090",
                "memoryTotal": 25769803776u64,
                "memoryUsed": 8589934592u64,
                "memoryFree": 17179869184u64,
                "temperature": 65,
                "utilization": 45
            },
            {
                "name": "NVIDIA RTX 3090",
                "memoryTotal": 25769803776u64,
                "memoryUsed": 12884901888u64,
                "memoryFree": 12884901888u64,
                "temperature": 72,
                "utilization": 80
            }
        ])
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_gpu_returns_amd_records() {
    let dir = tempfile::tempdir().unwrap();
    print_tool(dir.path(), "rocm-smi", ROCM_SMI_OUTPUT);
    let app = create_test_app(BackendOverride::Auto, dir.path());

    let (status, body) = get_json(app, "/gpu").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "name": "AMD Radeon RX 7900 XTX",
            "memoryTotal": 25769803776u64,
            "memoryUsed": 8589934592u64,
            "memoryFree": 17179869184u64,
            "temperature": 55,
            "utilization": 30
        }])
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_nvidia_preferred_when_both_present() {
    let dir = tempfile::tempdir().unwrap();
    print_tool(dir.path(), "nvidia-smi", NVIDIA_SMI_OUTPUT);
    print_tool(dir.path(), "rocm-smi", ROCM_SMI_OUTPUT);

    let (_, health) = get_json(create_test_app(BackendOverride::Auto, dir.path()), "/health").await;
    let (status, gpus) = get_json(create_test_app(BackendOverride::Auto, dir.path()), "/gpu").await;

    assert_eq!(health["backend"], "nvidia");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gpus[0]["name"], "NVIDIA RTX 4090");
}

#[cfg(unix)]
#[tokio::test]
async fn test_forced_amd_queries_rocm_smi() {
    let dir = tempfile::tempdir().unwrap();
    print_tool(dir.path(), "nvidia-smi", NVIDIA_SMI_OUTPUT);
    print_tool(dir.path(), "rocm-smi", ROCM_SMI_OUTPUT);
    let app = create_test_app(BackendOverride::Amd, dir.path());

    let (status, body) = get_json(app, "/gpu").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "AMD Radeon RX 7900 XTX");
}

#[cfg(unix)]
#[tokio::test]
async fn test_gpu_tool_failure_is_500_with_stderr() {
    let dir = tempfile::tempdir().unwrap();
    write_tool(
        dir.path(),
        "nvidia-smi",
        "echo 'Failed to initialize NVML: Driver/library version mismatch' >&2\nexit 9",
    );
    let app = create_test_app(BackendOverride::Auto, dir.path());

    let (status, body) = get_json(app, "/gpu").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "nvidia-smi failed: Failed to initialize NVML: Driver/library version mismatch"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_health_ok_when_tool_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_tool(dir.path(), "rocm-smi", "echo 'Failed' >&2\nexit 1");
    let app = create_test_app(BackendOverride::Auto, dir.path());

    let (status, body) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "backend": "amd" }));
}

#[cfg(unix)]
#[tokio::test]
async fn test_gpu_tool_timeout_is_500() {
    let dir = tempfile::tempdir().unwrap();
    write_tool(dir.path(), "rocm-smi", "sleep 5");
    let app = create_test_app_with_timeout(
        BackendOverride::Auto,
        dir.path(),
        Duration::from_millis(200),
    );

    let (status, body) = get_json(app, "/gpu").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("rocm-smi timed out"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_gpu_empty_output_is_empty_array() {
    let dir = tempfile::tempdir().unwrap();
    write_tool(dir.path(), "nvidia-smi", "exit 0");
    let app = create_test_app(BackendOverride::Auto, dir.path());

    let (status, body) = get_json(app, "/gpu").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[cfg(unix)]
#[tokio::test]
async fn test_gpu_reflects_current_tool_output() {
    let dir = tempfile::tempdir().unwrap();
    print_tool(dir.path(), "nvidia-smi", "GPU A, 1024, 0, 1024, 30, 0");
    let state = Arc::new(AppState::new(AgentConfig {
        search_path: Some(dir.path().as_os_str().to_owned()),
        ..AgentConfig::default()
    }));

    let (_, first) = get_json(create_app(state.clone()), "/gpu").await;
    print_tool(dir.path(), "nvidia-smi", "GPU A, 1024, 512, 512, 60, 100");
    let (_, second) = get_json(create_app(state), "/gpu").await;

    assert_eq!(first[0]["utilization"], 0);
    assert_eq!(second[0]["utilization"], 100);
}
