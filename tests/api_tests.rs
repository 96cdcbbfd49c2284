//! End-to-end tests of the HTTP surface over fake platform procedures.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use dataflow::procedures::ProcedureError;
use dataflow::server::create_app;
use serde_json::{Value, json};
use tower::ServiceExt;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{MockCatalog, MockProcedures, setup_test_db, test_state};

async fn app_with(procedures: Arc<MockProcedures>) -> Router {
    let db = setup_test_db().await.expect("test database");
    let catalog = MockCatalog::default().with_table(
        "DB.SCH.CUSTOMERS",
        &[("ID", "NUMBER(38,0)"), ("EMAIL", "VARCHAR(255)"), ("NAME", "TEXT")],
    );
    create_app(test_state(db, procedures, catalog))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn dedup_job() -> Value {
    json!({
        "job_name": "Dedup Customers",
        "source_table": "DB.SCH.CUSTOMERS",
        "target_table": "DB.SCH.CUSTOMERS_DEDUP",
        "transformation_type": "DEDUPLICATE",
        "transformation_config": {"key_columns": ["EMAIL"]},
        "schedule_preset": {"preset": "DAILY", "hour": 2}
    })
}

#[tokio::test]
async fn job_lifecycle_over_http() {
    let app = app_with(MockProcedures::new()).await;

    let (status, job) = send(&app, "POST", "/jobs", Some(dedup_job())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(job["schedule"], "0 2 * * *");
    assert_eq!(job["is_active"], true);
    let job_id = job["job_id"].as_str().unwrap().to_string();

    let (status, report) = send(&app, "POST", &format!("/jobs/{job_id}/run"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["execution"]["status"], "SUCCESS");
    assert_eq!(report["message"], "Job completed");

    let (status, history) = send(&app, "GET", &format!("/executions?job_id={job_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["executions"].as_array().unwrap().len(), 1);
    assert_eq!(history["summary"]["total_executions"], 1);
    assert_eq!(history["summary"]["success_rate"], 100.0);

    let (status, listed) = send(&app, "GET", "/jobs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["counts"]["active"], 1);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/jobs/{job_id}/active"),
        Some(json!({"is_active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &format!("/jobs/{job_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/jobs/{job_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn conflicting_schedule_fields_are_rejected() {
    let app = app_with(MockProcedures::new()).await;
    let mut body = dedup_job();
    body["schedule"] = json!("0 3 * * *");

    let (status, problem) = send(&app, "POST", "/jobs", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn reversed_range_check_is_a_validation_error() {
    let app = app_with(MockProcedures::new()).await;

    let (status, problem) = send(
        &app,
        "POST",
        "/quality/checks",
        Some(json!({
            "check_name": "Age range",
            "table_name": "DB.SCH.CUSTOMERS",
            "column_name": "AGE",
            "check_type": "RANGE_CHECK",
            "check_parameters": {"min_value": 100, "max_value": 0},
            "severity": "ERROR"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["code"], "VALIDATION_FAILED");
    let (_, checks) = send(&app, "GET", "/quality/checks", None).await;
    assert_eq!(checks.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn quality_run_records_results_and_filters_them() {
    let app = app_with(MockProcedures::new()).await;

    let (status, _) = send(
        &app,
        "POST",
        "/quality/checks",
        Some(json!({
            "check_name": "Email present",
            "table_name": "DB.SCH.CUSTOMERS",
            "column_name": "EMAIL",
            "check_type": "NULL_CHECK"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, report) = send(
        &app,
        "POST",
        "/quality/run",
        Some(json!({"table_name": "DB.SCH.CUSTOMERS"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["results"].as_array().unwrap().len(), 1);
    assert_eq!(report["results"][0]["status"], "PASSED");

    let (status, results) = send(&app, "GET", "/quality/results?status=PASSED", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["summary"]["total_checks"], 1);
    assert_eq!(results["summary"]["passed"], 1);

    let (_, failed) = send(&app, "GET", "/quality/results?status=FAILED", None).await;
    assert_eq!(failed["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn profile_then_read_back() {
    let procedures = MockProcedures::new();
    let app = app_with(procedures.clone()).await;

    let (status, _) = send(&app, "GET", "/profiles/DB.SCH.CUSTOMERS", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, report) = send(
        &app,
        "POST",
        "/profiles",
        Some(json!({"table_name": "DB.SCH.CUSTOMERS"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["columns"].as_array().unwrap().len(), 1);
    assert_eq!(
        procedures.calls(),
        vec!["profile_table(DB.SCH.CUSTOMERS, 100)".to_string()]
    );

    let (status, profile) = send(&app, "GET", "/profiles/DB.SCH.CUSTOMERS", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["columns"][0]["column_name"], "ID");

    let (_, overview) = send(&app, "GET", "/profiles", None).await;
    assert_eq!(overview["tables"], json!(["DB.SCH.CUSTOMERS"]));

    let (_, dashboard) = send(&app, "GET", "/dashboard", None).await;
    assert_eq!(dashboard["metrics"]["tables_profiled"], 1);
}

#[tokio::test]
async fn catalog_browsing_and_text_filter() {
    let app = app_with(MockProcedures::new()).await;

    let (_, databases) = send(&app, "GET", "/catalog/databases", None).await;
    assert_eq!(databases, json!(["DB"]));
    let (_, tables) = send(&app, "GET", "/catalog/databases/DB/schemas/SCH/tables", None).await;
    assert_eq!(tables, json!(["CUSTOMERS"]));

    let (status, all) = send(&app, "GET", "/catalog/tables/DB.SCH.CUSTOMERS/columns", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, text) = send(
        &app,
        "GET",
        "/catalog/tables/DB.SCH.CUSTOMERS/columns?text_only=true",
        None,
    )
    .await;
    let names: Vec<_> = text
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["EMAIL", "NAME"]);

    let (status, _) = send(&app, "GET", "/catalog/tables/CUSTOMERS/columns", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn platform_error_surfaces_as_bad_gateway() {
    let procedures = MockProcedures::new();
    procedures.push_status(Err(ProcedureError::failed(
        "deduplicate_table",
        "Object 'DB.SCH.MISSING' does not exist",
    )));
    let app = app_with(procedures).await;

    let (status, problem) = send(
        &app,
        "POST",
        "/transformations",
        Some(json!({
            "source_table": "DB.SCH.MISSING",
            "target_table": "DB.SCH.OUT",
            "transformation_type": "DEDUPLICATE",
            "transformation_config": {"key_columns": ["ID"]}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(problem["message"], "Object 'DB.SCH.MISSING' does not exist");
}
