mod common;

use axum::http::{header, StatusCode};
use goalboard::models::auth::Role;
use serde_json::json;

use common::test_app;

#[tokio::test]
async fn empty_division_has_zero_completion_rate() {
    let app = test_app();
    let division_id = app.division("Engineering").await;
    let (_, manager) = app.user("m@example.com", Role::Manager, Some(division_id)).await;

    let response = app.get("/api/reports/dashboard-stats", &manager).await;
    assert_eq!(response.status, StatusCode::OK);
    let stats = response.json();
    assert_eq!(stats["totalTasks"], 0);
    assert_eq!(stats["completionRate"], 0);
    assert_eq!(stats["overdueTasks"], json!([]));
}

#[tokio::test]
async fn dashboard_counts_completions_and_overdue_tasks() {
    let app = test_app();
    let division_id = app.division("Engineering").await;
    let (_, manager) = app.user("m@example.com", Role::Manager, Some(division_id)).await;
    let (employee, _) = app.user("e@example.com", Role::Employee, Some(division_id)).await;

    let goal = app
        .post(
            "/api/goals",
            &manager,
            json!({ "code": "ENG-1", "title": "x", "startDate": "2024-01-01", "endDate": "2024-12-31" }),
        )
        .await
        .json();
    let goal_id = goal["id"].clone();

    for (title, status, due) in [
        ("done", "COMPLETED", "2020-01-01"),
        ("late", "TODO", "2020-01-02"),
        ("future", "IN_PROGRESS", "2999-01-01"),
    ] {
        let response = app
            .post(
                "/api/tasks",
                &manager,
                json!({
                    "title": title,
                    "goalId": goal_id,
                    "status": status,
                    "dueDate": due,
                    "assigneeId": employee.id
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let stats = app.get("/api/reports/dashboard-stats", &manager).await.json();
    assert_eq!(stats["totalGoals"], 1);
    assert_eq!(stats["totalTasks"], 3);
    assert_eq!(stats["statusCounts"], json!({ "todo": 1, "inProgress": 1, "completed": 1 }));
    assert_eq!(stats["completionRate"], 33);
    assert_eq!(stats["employeeCompletions"][0]["completed"], 1);
    // Concluída não conta como atrasada
    assert_eq!(stats["overdueTasks"].as_array().unwrap().len(), 1);
    assert_eq!(stats["overdueTasks"][0]["title"], "late");

    let per_employee = app.get("/api/reports/employee-stats", &manager).await.json();
    assert_eq!(per_employee[0]["userId"], employee.id);
    assert_eq!(per_employee[0]["totalTasks"], 3);
    assert_eq!(per_employee[0]["completionRate"], 33);
}

#[tokio::test]
async fn excel_download_is_an_attachment() {
    let app = test_app();
    let division_id = app.division("Engineering").await;
    let (_, manager) = app.user("m@example.com", Role::Manager, Some(division_id)).await;

    let response = app.get("/api/reports/download?format=excel&status=ALL", &manager).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = response.headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=tasks-report-"));
    assert!(disposition.ends_with(".xlsx"));
    assert!(response.bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn download_rejects_employees_and_unknown_formats() {
    let app = test_app();
    let division_id = app.division("Engineering").await;
    let (_, manager) = app.user("m@example.com", Role::Manager, Some(division_id)).await;
    let (_, employee) = app.user("e@example.com", Role::Employee, Some(division_id)).await;

    let response = app.get("/api/reports/download?format=excel", &employee).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get("/api/reports/download?format=csv", &manager).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
