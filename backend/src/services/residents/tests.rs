use super::configure_routes;
use crate::importer::ImportServices;
use crate::job_controller::state::{start_job_updater, JobsState};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::jobs::JobStatus;
use common::model::batch::{BatchResult, DispatchMode};
use common::model::resident::ParsedResident;
use common::requests::{DispatchRequest, DispatchStarted, ImporterContext, ResidentsResponse, UploadResponse};
use serde_json::{json, Value};
use std::time::Duration;

const BOUNDARY: &str = "----importer-test-boundary";

fn multipart(filename: &str, contents: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
        b = BOUNDARY,
        f = filename
    )
    .into_bytes();
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(filename: &str, contents: &[u8]) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/residents/upload")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart(filename, contents))
}

macro_rules! app {
    ($jobs:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(ImportServices::in_memory()))
                .app_data(web::Data::new($jobs))
                .service(configure_routes()),
        )
        .await
    };
}

#[actix_web::test]
async fn upload_maps_csv_headers() {
    let (jobs, _rx) = JobsState::new();
    let app = app!(jobs);

    let csv = b"Full Name,E-mail,Apt\nAnn Lee,ann@x.com,4B\nBob Roy,BOB@X.COM,12\n";
    let resp: UploadResponse = test::call_and_read_body_json(&app, upload_request("list.csv", csv).to_request()).await;

    assert!(!resp.interpreted);
    assert_eq!(resp.residents.len(), 2);
    assert_eq!(resp.residents[1].email, "bob@x.com");
    assert_eq!(resp.residents[1].unit, "12");
    assert_eq!(resp.columns.len(), 3);
}

#[actix_web::test]
async fn upload_falls_back_to_the_organizer() {
    let (jobs, _rx) = JobsState::new();
    let app = app!(jobs);

    let csv = b"Contact,Notes\nAnn Lee,ann@x.com unit 4B\n";
    let resp: UploadResponse = test::call_and_read_body_json(&app, upload_request("list.csv", csv).to_request()).await;

    assert!(resp.interpreted);
    assert!(resp.columns.is_empty());
    assert!(resp.residents.iter().any(|r| r.email == "ann@x.com"));
}

#[actix_web::test]
async fn upload_rejects_unknown_extensions() {
    let (jobs, _rx) = JobsState::new();
    let app = app!(jobs);

    let resp = test::call_service(&app, upload_request("residents.pdf", b"%PDF").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
}

#[actix_web::test]
async fn quick_add_splits_addresses() {
    let (jobs, _rx) = JobsState::new();
    let app = app!(jobs);

    let req = test::TestRequest::post()
        .uri("/api/residents/quick-add")
        .set_json(json!({ "emails": "john.doe@x.com; jane_smith@x.com" }))
        .to_request();
    let resp: ResidentsResponse = test::call_and_read_body_json(&app, req).await;
    let names: Vec<_> = resp.residents.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["John Doe", "Jane Smith"]);
}

#[actix_web::test]
async fn blank_organize_text_is_empty_result() {
    let (jobs, _rx) = JobsState::new();
    let app = app!(jobs);

    let req = test::TestRequest::post()
        .uri("/api/residents/organize")
        .set_json(json!({ "text": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn dispatch_runs_in_the_background() {
    let (jobs, rx) = JobsState::new();
    tokio::spawn(start_job_updater(jobs.clone(), rx));
    let app = app!(jobs);

    let request = DispatchRequest {
        context: ImporterContext {
            building_id: "b1".into(),
            actor_id: "manager-1".into(),
            building_name: "Maple Court".into(),
        },
        mode: DispatchMode::Invite,
        residents: vec![
            ParsedResident {
                name: "Ann Lee".into(),
                email: "ann@x.com".into(),
                ..Default::default()
            },
            ParsedResident {
                name: "Cy Dahl".into(),
                ..Default::default()
            },
        ],
    };
    let req = test::TestRequest::post()
        .uri("/api/residents/dispatch")
        .set_json(&request)
        .to_request();
    let started: DispatchStarted = test::call_and_read_body_json(&app, req).await;

    let mut status = JobStatus::Pending;
    for _ in 0..50 {
        let req = test::TestRequest::get()
            .uri(&format!("/api/residents/dispatch/status/{}", started.job_id))
            .to_request();
        status = test::call_and_read_body_json(&app, req).await;
        if status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(
        status,
        JobStatus::Completed(BatchResult {
            total_saved: 2,
            emails_sent: 1,
            emails_failed: 0,
            saved_without_email: 1,
            is_roster: false,
        })
    );
}

#[actix_web::test]
async fn dispatch_without_residents_is_rejected() {
    let (jobs, _rx) = JobsState::new();
    let app = app!(jobs);

    let req = test::TestRequest::post()
        .uri("/api/residents/dispatch")
        .set_json(json!({
            "context": { "building_id": "b1", "actor_id": "m", "building_name": "B" },
            "mode": "Invite",
            "residents": []
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "NOTHING_SELECTED");
}

#[actix_web::test]
async fn unknown_job_is_not_found() {
    let (jobs, _rx) = JobsState::new();
    let app = app!(jobs);

    let req = test::TestRequest::get()
        .uri("/api/residents/dispatch/status/nope")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
