use std::time::Duration;

use glossa_core::{
    build_run_request, ClientConfig, JobStatus, LogId, RunInvocation, Severity, TaskKind,
    UploadOutcome, UploadPolicy,
};
use glossa_engine::{
    FailureKind, JobService, ReqwestJobService, ServiceSettings, UploadFile,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(server: &MockServer) -> ReqwestJobService {
    let settings = ServiceSettings {
        base_url: server.uri(),
        ..ServiceSettings::default()
    };
    ReqwestJobService::new(&settings).expect("client")
}

#[tokio::test]
async fn status_response_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/task/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stats": {
                "status": "running",
                "completed": 40,
                "total": 120,
                "requestsPerMinute": 18.5,
                "tokensPerMinute": 5200.0,
                "successRate": 0.9,
                "errorRate": 0.1,
                "elapsedSeconds": 61.4,
                "currentFile": "chapter2.txt"
            },
            "logs": [
                { "id": 1, "timestamp": "12:00:01", "message": "started", "severity": "info" },
                { "id": 2, "timestamp": "12:00:05", "message": "retrying", "severity": "warn" }
            ],
            "chartData": [ { "time": 1, "rpm": 18.5, "tpm": 5200.0 } ],
            "comparison": { "source": "原文", "translation": "source text" }
        })))
        .mount(&server)
        .await;

    let snapshot = service_for(&server).status().await.expect("status");
    assert_eq!(snapshot.status, JobStatus::Running);
    assert_eq!(snapshot.progress.completed, 40);
    assert_eq!(snapshot.progress.total, 120);
    assert_eq!(snapshot.rate_metrics.requests_per_minute, 18.5);
    assert_eq!(snapshot.rate_metrics.success_rate, 0.9);
    assert_eq!(snapshot.rate_metrics.error_rate, 0.1);
    assert_eq!(snapshot.elapsed_seconds, 61);
    assert_eq!(snapshot.current_file.as_deref(), Some("chapter2.txt"));
    assert_eq!(snapshot.logs.len(), 2);
    assert_eq!(snapshot.logs[1].id, LogId::Remote(2));
    assert_eq!(snapshot.logs[1].severity, Severity::Warning);
    assert_eq!(snapshot.time_series[0].time, "1");
    assert_eq!(
        snapshot.comparison.map(|c| c.translation),
        Some("source text".to_string())
    );
}

#[tokio::test]
async fn rates_outside_the_fraction_range_are_pinned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/task/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stats": { "status": "running", "successRate": 1.5, "errorRate": -0.2 }
        })))
        .mount(&server)
        .await;

    let snapshot = service_for(&server).status().await.expect("status");
    assert_eq!(snapshot.rate_metrics.success_rate, 1.0);
    assert_eq!(snapshot.rate_metrics.error_rate, 0.0);
}

#[tokio::test]
async fn missing_or_null_logs_mean_no_new_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/task/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stats": { "status": "idle" },
            "logs": null
        })))
        .mount(&server)
        .await;

    let snapshot = service_for(&server).status().await.expect("status");
    assert_eq!(snapshot.status, JobStatus::Idle);
    assert!(snapshot.logs.is_empty());
    assert!(snapshot.time_series.is_empty());
    assert!(snapshot.comparison.is_none());
}

#[tokio::test]
async fn malformed_status_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/task/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = service_for(&server).status().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn run_posts_normalized_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/task/run"))
        .and(body_partial_json(json!({
            "task": "translate",
            "platform": "openai",
            "inputPath": "/data/book",
            "lines": 15,
            "resume": true,
            "runAllInOne": false
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "accepted": true, "message": "ok" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig {
        platform: Some("openai".to_string()),
        ..ClientConfig::default()
    };
    let request = build_run_request(
        &config,
        &RunInvocation::new(TaskKind::Translate, "/data/book"),
        true,
    )
    .expect("request");

    let ack = service_for(&server).run(&request).await.expect("run");
    assert!(ack.accepted);
    assert_eq!(ack.message, "ok");
}

#[tokio::test]
async fn run_rejection_carries_the_service_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/task/run"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "task already running" })),
        )
        .mount(&server)
        .await;

    let config = ClientConfig {
        platform: Some("openai".to_string()),
        ..ClientConfig::default()
    };
    let request = build_run_request(
        &config,
        &RunInvocation::new(TaskKind::Polish, "/data/book"),
        false,
    )
    .expect("request");

    let err = service_for(&server).run(&request).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(409));
    assert_eq!(err.message, "task already running");
}

#[tokio::test]
async fn stop_and_breakpoint_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/task/stop"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/task/breakpoint"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "canResume": true,
            "hasIncomplete": true,
            "projectName": "novel",
            "totalLines": 400,
            "completedLines": 100,
            "progressPercent": 25.0
        })))
        .mount(&server)
        .await;

    let service = service_for(&server);
    service.stop().await.expect("stop");
    let breakpoint = service.breakpoint().await.expect("breakpoint");
    assert!(breakpoint.offers_resume());
    assert_eq!(breakpoint.project_name.as_deref(), Some("novel"));
    assert_eq!(breakpoint.percent(), 25.0);
}

#[tokio::test]
async fn upload_sends_policy_and_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(query_param("policy", "buffer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "outcome": "success",
            "path": "temp/book.txt"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = UploadFile::new("book.txt", b"chapter one".to_vec());
    let outcome = service_for(&server)
        .upload(&file, UploadPolicy::Buffer)
        .await
        .expect("upload");
    assert_eq!(
        outcome,
        UploadOutcome::Success {
            path: "temp/book.txt".to_string()
        }
    );

    let requests = server.received_requests().await.expect("recording on");
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("chapter one"));
    assert!(body.contains("filename=\"book.txt\""));
}

#[tokio::test]
async fn unknown_upload_outcome_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "outcome": "maybe" })))
        .mount(&server)
        .await;

    let file = UploadFile::new("book.txt", b"x".to_vec());
    let err = service_for(&server)
        .upload(&file, UploadPolicy::Default)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn slow_status_times_out_when_a_deadline_is_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/task/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({ "stats": { "status": "idle" } })),
        )
        .mount(&server)
        .await;

    let settings = ServiceSettings {
        base_url: server.uri(),
        request_timeout: Some(Duration::from_millis(50)),
        ..ServiceSettings::default()
    };
    let err = ReqwestJobService::new(&settings)
        .expect("client")
        .status()
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn base_url_with_prefix_is_respected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/glossa/api/task/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "stats": { "status": "paused" } })),
        )
        .mount(&server)
        .await;

    let settings = ServiceSettings {
        base_url: format!("{}/glossa", server.uri()),
        ..ServiceSettings::default()
    };
    let snapshot = ReqwestJobService::new(&settings)
        .expect("client")
        .status()
        .await
        .expect("status");
    assert_eq!(snapshot.status, JobStatus::Paused);
}

#[test]
fn invalid_base_url_is_reported() {
    let settings = ServiceSettings {
        base_url: "not a url".to_string(),
        ..ServiceSettings::default()
    };
    let err = ReqwestJobService::new(&settings).unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
