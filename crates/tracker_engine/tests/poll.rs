use std::sync::mpsc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracker_engine::{
    poll_task, ChannelProgressSink, ClientSettings, EngineEvent, FailureKind, PollSettings,
    ReqwestTaskApi, TaskKind, TaskOutcome, TaskProgress, TaskRef,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> ReqwestTaskApi {
    ReqwestTaskApi::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .expect("client")
}

fn fast_polling(max_consecutive_errors: u32) -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(10),
        max_consecutive_errors,
        stale_after: None,
    }
}

fn status_body(status: &str, progress: serde_json::Value) -> serde_json::Value {
    json!({
        "success": true,
        "message": "Success",
        "data": { "task_id": "t1", "status": status, "progress": progress }
    })
}

async fn mount_once(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

async fn run_poll(api: &ReqwestTaskApi, task: &TaskRef, settings: &PollSettings) -> Vec<EngineEvent> {
    let (tx, rx) = mpsc::channel();
    let sink = ChannelProgressSink::new(tx);
    let cancel = CancellationToken::new();
    tokio::time::timeout(
        Duration::from_secs(5),
        poll_task(api, task, settings, &sink, &cancel),
    )
    .await
    .expect("poll finished");
    rx.try_iter().collect()
}

#[tokio::test]
async fn emits_changed_progress_then_resolved_download() {
    let server = MockServer::start().await;
    let route = "/api/tools/pdf-to-pptx/t1";
    let first = json!({"total": 4, "completed": 1, "current_page": 1, "stage": "parsing"});
    mount_once(&server, route, status_body("PENDING", json!({}))).await;
    mount_once(&server, route, status_body("PROCESSING", first.clone())).await;
    mount_once(&server, route, status_body("PROCESSING", first)).await;
    mount_once(
        &server,
        route,
        status_body("PROCESSING", json!({"total": 4, "completed": 2, "stage_name": "第 2 页完成"})),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "task_id": "t1",
                "status": "COMPLETED",
                "progress": {"output_path": "/srv/x.pptx", "text_blocks_count": 42},
                "download_url": "/files/tools/exports/x.pptx"
            }
        })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let task = TaskRef::new(TaskKind::PdfToPptx, "t1");
    let events = run_poll(&api, &task, &fast_polling(3)).await;

    assert_eq!(
        events,
        vec![
            EngineEvent::Progress {
                task_id: "t1".to_string(),
                progress: TaskProgress {
                    total: Some(4),
                    completed: Some(1),
                    current_page: Some(1),
                    stage: Some("parsing".to_string()),
                    ..TaskProgress::default()
                },
            },
            EngineEvent::Progress {
                task_id: "t1".to_string(),
                progress: TaskProgress {
                    total: Some(4),
                    completed: Some(2),
                    stage_name: Some("第 2 页完成".to_string()),
                    ..TaskProgress::default()
                },
            },
            EngineEvent::JobCompleted {
                task_id: "t1".to_string(),
                result: Ok(TaskOutcome {
                    download_url: format!("{}/files/tools/exports/x.pptx", server.uri()),
                    text_blocks_count: Some(42),
                }),
            },
        ]
    );
}

#[tokio::test]
async fn failed_task_reports_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/p9/export/editable-pptx/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"task_id": "t1", "status": "FAILED", "progress": {}, "error": "OCR 服务不可用"}
        })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let task = TaskRef::new(
        TaskKind::EditablePptx {
            project_id: "p9".to_string(),
        },
        "t1",
    );
    let events = run_poll(&api, &task, &fast_polling(3)).await;

    match events.as_slice() {
        [EngineEvent::JobCompleted {
            result: Err(failure),
            ..
        }] => {
            assert_eq!(failure.kind, FailureKind::TaskFailed);
            assert_eq!(failure.user_message(), "OCR 服务不可用");
        }
        other => panic!("unexpected events {other:?}"),
    }
}

#[tokio::test]
async fn completed_without_download_is_a_failure() {
    let server = MockServer::start().await;
    mount_once(
        &server,
        "/api/tools/pdf-to-pptx/t1",
        status_body("COMPLETED", json!({"pages_count": 3})),
    )
    .await;

    let api = api_for(&server);
    let task = TaskRef::new(TaskKind::PdfToPptx, "t1");
    let events = run_poll(&api, &task, &fast_polling(3)).await;

    match events.as_slice() {
        [EngineEvent::JobCompleted {
            result: Err(failure),
            ..
        }] => assert_eq!(failure.kind, FailureKind::MissingDownload),
        other => panic!("unexpected events {other:?}"),
    }
}

#[tokio::test]
async fn gives_up_after_consecutive_transport_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tools/pdf-to-pptx/t1"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let task = TaskRef::new(TaskKind::PdfToPptx, "t1");
    let events = run_poll(&api, &task, &fast_polling(3)).await;

    match events.as_slice() {
        [EngineEvent::JobCompleted {
            result: Err(failure),
            ..
        }] => assert_eq!(failure.kind, FailureKind::GaveUp { attempts: 3 }),
        other => panic!("unexpected events {other:?}"),
    }
}

#[tokio::test]
async fn missing_task_fails_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tools/pdf-to-pptx/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "error": {"code": "TASK_NOT_FOUND", "message": "任务不存在"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let task = TaskRef::new(TaskKind::PdfToPptx, "gone");
    let events = run_poll(&api, &task, &fast_polling(5)).await;

    match events.as_slice() {
        [EngineEvent::JobCompleted {
            result: Err(failure),
            ..
        }] => {
            assert_eq!(failure.kind, FailureKind::NotFound);
            assert_eq!(failure.message, "任务不存在");
        }
        other => panic!("unexpected events {other:?}"),
    }
}

#[tokio::test]
async fn stale_progress_fails_the_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tools/pdf-to-pptx/t1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(status_body("PROCESSING", json!({"total": 3, "completed": 1}))),
        )
        .mount(&server)
        .await;

    let api = api_for(&server);
    let task = TaskRef::new(TaskKind::PdfToPptx, "t1");
    let settings = PollSettings {
        stale_after: Some(Duration::from_millis(60)),
        ..fast_polling(3)
    };
    let events = run_poll(&api, &task, &settings).await;

    assert_eq!(events.len(), 2);
    match events.last() {
        Some(EngineEvent::JobCompleted {
            result: Err(failure),
            ..
        }) => assert_eq!(failure.kind, FailureKind::Stale),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn cancelled_poll_emits_nothing() {
    let server = MockServer::start().await;
    let api = api_for(&server);
    let task = TaskRef::new(TaskKind::PdfToPptx, "t1");
    let (tx, rx) = mpsc::channel();
    let sink = ChannelProgressSink::new(tx);
    let cancel = CancellationToken::new();
    cancel.cancel();

    poll_task(&api, &task, &fast_polling(3), &sink, &cancel).await;

    assert_eq!(rx.try_iter().count(), 0);
}
