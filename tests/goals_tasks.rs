mod common;

use axum::http::StatusCode;
use goalboard::models::auth::Role;
use serde_json::{json, Value};

use common::{test_app, TestApp};

struct Division {
    id: i32,
    manager: String,
    employee_id: i32,
    employee: String,
}

async fn division_with_staff(app: &TestApp, name: &str) -> Division {
    let id = app.division(name).await;
    let slug = name.to_lowercase();
    let (_, manager) = app.user(&format!("manager@{slug}.com"), Role::Manager, Some(id)).await;
    let (employee, token) = app.user(&format!("employee@{slug}.com"), Role::Employee, Some(id)).await;
    Division {
        id,
        manager,
        employee_id: employee.id,
        employee: token,
    }
}

async fn create_goal(app: &TestApp, token: &str, code: &str) -> i64 {
    let response = app
        .post(
            "/api/goals",
            token,
            json!({ "code": code, "title": "Goal", "startDate": "2024-01-01", "endDate": "2024-03-31" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.json()["id"].as_i64().unwrap()
}

async fn create_task(app: &TestApp, token: &str, body: Value) -> Value {
    let response = app.post("/api/tasks", token, body).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.json());
    response.json()
}

#[tokio::test]
async fn goal_board_shows_unassigned_task_created_by_employee() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;

    let goal_id = create_goal(&app, &eng.manager, "Q1-2024").await;
    let task = create_task(
        &app,
        &eng.employee,
        json!({ "title": "Draft plan", "goalId": goal_id, "assigneeId": null }),
    )
    .await;
    assert_eq!(task["status"], "TODO");
    assert_eq!(task["priority"], "MEDIUM");

    let board = app.get("/api/goals", &eng.manager).await.json();
    assert_eq!(board[0]["code"], "Q1-2024");
    assert_eq!(board[0]["tasks"][0]["title"], "Draft plan");
    assert!(board[0]["tasks"][0]["assignee"].is_null());
}

#[tokio::test]
async fn duplicate_goal_code_is_rejected() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;
    create_goal(&app, &eng.manager, "Q1-2024").await;

    let response = app
        .post(
            "/api/goals",
            &eng.manager,
            json!({ "code": "Q1-2024", "title": "Again", "startDate": "2024-01-01", "endDate": "2024-03-31" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["message"].as_str().unwrap().contains("Unique constraint"));
}

#[tokio::test]
async fn goal_period_must_be_ordered() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;

    let response = app
        .post(
            "/api/goals",
            &eng.manager,
            json!({ "code": "BAD", "title": "x", "startDate": "2024-05-01", "endDate": "2024-03-31" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn employees_cannot_manage_goals() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;

    let response = app
        .post(
            "/api/goals",
            &eng.employee,
            json!({ "code": "X", "title": "x", "startDate": "2024-01-01", "endDate": "2024-01-02" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn manager_of_other_division_cannot_touch_goal() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;
    let ops = division_with_staff(&app, "Operations").await;
    let goal_id = create_goal(&app, &eng.manager, "ENG-1").await;

    let response = app.delete(&format!("/api/goals/{goal_id}"), &ops.manager).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get(&format!("/api/goals/{goal_id}"), &ops.manager).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.delete(&format!("/api/goals/{goal_id}"), &eng.manager).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn task_listing_is_isolated_per_division() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;
    let ops = division_with_staff(&app, "Operations").await;

    let eng_goal = create_goal(&app, &eng.manager, "ENG-1").await;
    let ops_goal = create_goal(&app, &ops.manager, "OPS-1").await;
    create_task(&app, &eng.manager, json!({ "title": "eng", "goalId": eng_goal })).await;
    let ops_task = create_task(&app, &ops.manager, json!({ "title": "ops", "goalId": ops_goal })).await;

    let listed = app.get("/api/tasks", &eng.manager).await.json();
    assert_eq!(listed["meta"]["total"], 1);
    assert_eq!(listed["data"][0]["title"], "eng");

    // Filtrar pela meta de outra divisão não vaza nada
    let listed = app.get(&format!("/api/tasks?goalId={ops_goal}"), &eng.manager).await.json();
    assert_eq!(listed["meta"]["total"], 0);

    let response = app.get(&format!("/api/tasks/{}", ops_task["id"]), &eng.manager).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Meta de outra divisão não pode receber tarefas
    let response = app.post("/api/tasks", &eng.manager, json!({ "title": "x", "goalId": ops_goal })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn employee_listing_ignores_assignee_filter() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;
    let (colleague, _) = app.user("colleague@engineering.com", Role::Employee, Some(eng.id)).await;
    let goal_id = create_goal(&app, &eng.manager, "ENG-1").await;

    create_task(
        &app,
        &eng.manager,
        json!({ "title": "mine", "goalId": goal_id, "assigneeId": eng.employee_id }),
    )
    .await;
    create_task(
        &app,
        &eng.manager,
        json!({ "title": "theirs", "goalId": goal_id, "assigneeId": colleague.id }),
    )
    .await;

    let listed = app
        .get(&format!("/api/tasks?assigneeId={}", colleague.id), &eng.employee)
        .await
        .json();
    assert_eq!(listed["meta"]["total"], 1);
    assert_eq!(listed["data"][0]["title"], "mine");
}

#[tokio::test]
async fn bare_due_date_end_covers_the_whole_day() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;
    let goal_id = create_goal(&app, &eng.manager, "ENG-1").await;

    create_task(
        &app,
        &eng.manager,
        json!({ "title": "late evening", "goalId": goal_id, "dueDate": "2024-01-15T23:59:59Z" }),
    )
    .await;
    create_task(
        &app,
        &eng.manager,
        json!({ "title": "next day", "goalId": goal_id, "dueDate": "2024-01-16" }),
    )
    .await;

    let listed = app.get("/api/tasks?dueDateEnd=2024-01-15", &eng.manager).await.json();
    assert_eq!(listed["meta"]["total"], 1);
    assert_eq!(listed["data"][0]["title"], "late evening");
}

#[tokio::test]
async fn malformed_filters_are_bad_requests() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;

    for uri in [
        "/api/tasks?createdAtStart=2024-13-45",
        "/api/tasks?status=DONE",
        "/api/tasks?assigneeId=abc",
    ] {
        let response = app.get(uri, &eng.manager).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
    }

    let response = app.get("/api/tasks?status=ALL&priority=", &eng.manager).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn pagination_meta_reflects_total() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;
    let goal_id = create_goal(&app, &eng.manager, "ENG-1").await;
    for n in 0..5 {
        create_task(&app, &eng.manager, json!({ "title": format!("t{n}"), "goalId": goal_id })).await;
    }

    let listed = app.get("/api/tasks?page=2&limit=2", &eng.manager).await.json();
    assert_eq!(listed["meta"], json!({ "total": 5, "page": 2, "limit": 2, "totalPages": 3 }));
    assert_eq!(listed["data"].as_array().unwrap().len(), 2);
    // Mais recentes primeiro: a página 2 começa na terceira mais nova
    assert_eq!(listed["data"][0]["title"], "t2");
}

#[tokio::test]
async fn status_change_records_history_once() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;
    let goal_id = create_goal(&app, &eng.manager, "ENG-1").await;
    let task = create_task(
        &app,
        &eng.manager,
        json!({ "title": "ship", "goalId": goal_id, "assigneeId": eng.employee_id }),
    )
    .await;
    let uri = format!("/api/tasks/{}", task["id"]);

    let response = app.put(&uri, &eng.employee, json!({ "status": "IN_PROGRESS" })).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "IN_PROGRESS");

    let response = app.put(&uri, &eng.employee, json!({ "status": "IN_PROGRESS" })).await;
    assert_eq!(response.status, StatusCode::OK);

    let history = app.get(&format!("{uri}/history"), &eng.manager).await.json();
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "UPDATED_STATUS");
    assert_eq!(entries[0]["oldValue"], "TODO");
    assert_eq!(entries[0]["newValue"], "IN_PROGRESS");
}

#[tokio::test]
async fn employee_cannot_update_or_delete_foreign_task() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;
    let goal_id = create_goal(&app, &eng.manager, "ENG-1").await;
    let task = create_task(&app, &eng.manager, json!({ "title": "not mine", "goalId": goal_id })).await;
    let uri = format!("/api/tasks/{}", task["id"]);

    let response = app.put(&uri, &eng.employee, json!({ "status": "COMPLETED" })).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.delete(&uri, &eng.employee).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.delete(&uri, &eng.manager).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let response = app.get(&uri, &eng.manager).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_are_listed_with_author() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;
    let goal_id = create_goal(&app, &eng.manager, "ENG-1").await;
    let task = create_task(&app, &eng.manager, json!({ "title": "discuss", "goalId": goal_id })).await;
    let uri = format!("/api/tasks/{}", task["id"]);

    let response = app
        .post(&format!("{uri}/comments"), &eng.employee, json!({ "content": "  on it  " }))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["content"], "on it");

    let detail = app.get(&uri, &eng.manager).await.json();
    assert_eq!(detail["comments"][0]["user"]["id"], eng.employee_id);
}

#[tokio::test]
async fn team_overview_counts_tasks_per_employee() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;
    let goal_id = create_goal(&app, &eng.manager, "ENG-1").await;
    create_task(
        &app,
        &eng.manager,
        json!({ "title": "a", "goalId": goal_id, "assigneeId": eng.employee_id, "status": "COMPLETED" }),
    )
    .await;
    create_task(
        &app,
        &eng.manager,
        json!({ "title": "b", "goalId": goal_id, "assigneeId": eng.employee_id }),
    )
    .await;

    let overview = app.get("/api/goals/team-overview", &eng.manager).await.json();
    assert_eq!(overview[0]["userId"], eng.employee_id);
    assert_eq!(overview[0]["totalTasks"], 2);
    assert_eq!(overview[0]["completed"], 1);
    assert_eq!(overview[0]["todo"], 1);

    let response = app.get("/api/goals/team-overview", &eng.employee).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let employees = app.get("/api/goals/employees", &eng.employee).await.json();
    assert_eq!(employees.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn extreme_pagination_values_do_not_break_listing() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;
    let goal_id = create_goal(&app, &eng.manager, "ENG-1").await;
    create_task(&app, &eng.manager, json!({ "title": "only", "goalId": goal_id })).await;

    let response = app
        .get("/api/tasks?page=9223372036854775807&limit=10", &eng.manager)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let listed = response.json();
    assert_eq!(listed["data"], json!([]));
    assert_eq!(listed["meta"]["totalPages"], 1);

    let listed = app
        .get("/api/tasks?limit=9223372036854775807", &eng.manager)
        .await
        .json();
    assert_eq!(listed["meta"]["limit"], 100);
    assert_eq!(listed["meta"]["totalPages"], 1);
}

#[tokio::test]
async fn whitespace_only_text_fields_are_rejected() {
    let app = test_app();
    let eng = division_with_staff(&app, "Engineering").await;

    let response = app
        .post(
            "/api/goals",
            &eng.manager,
            json!({ "code": "   ", "title": "   ", "startDate": "2024-01-01", "endDate": "2024-03-31" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert!(body["details"]["code"].is_array());
    assert!(body["details"]["title"].is_array());

    let goal_id = create_goal(&app, &eng.manager, "ENG-1").await;
    let response = app
        .post("/api/tasks", &eng.manager, json!({ "title": "   ", "goalId": goal_id }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let task = create_task(&app, &eng.manager, json!({ "title": "real", "goalId": goal_id })).await;
    let uri = format!("/api/tasks/{}", task["id"]);
    let response = app.put(&uri, &eng.manager, json!({ "title": " \t " })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let response = app
        .post(&format!("{uri}/comments"), &eng.manager, json!({ "content": "   " }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .put(&format!("/api/goals/{goal_id}"), &eng.manager, json!({ "title": "  " }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // Nada foi gravado em branco
    let listed = app.get("/api/tasks", &eng.manager).await.json();
    assert_eq!(listed["meta"]["total"], 1);
    assert_eq!(listed["data"][0]["title"], "real");
}
