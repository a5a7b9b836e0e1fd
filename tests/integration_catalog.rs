mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::*;

async fn create_course(app: &axum::Router, token: &str, name: &str, acronym: &str) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/courses",
            Some(token),
            json!({ "name": name, "acronym": acronym, "status": "active" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_course_crud(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, admin()).await;

    let course = create_course(&app, &token, "Computer Science", "CS").await;
    let course_id = course["course_id"].as_str().unwrap().to_string();
    assert_eq!(course["status"], "active");

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/courses/{}", course_id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["acronym"], "CS");

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/courses/{}", course_id),
            Some(&token),
            json!({ "name": "Computing" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // An update without a status deactivates the course.
    let status: String = sqlx::query_scalar("SELECT status FROM courses WHERE course_id::text = $1")
        .bind(&course_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "inactive");

    let response = app
        .clone()
        .oneshot(delete_request(&format!("/api/courses/{}", course_id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request(
            &format!("/api/courses/{}", course_id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_acronym_is_rejected(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, admin()).await;

    create_course(&app, &token, "Computer Science", "CS").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/courses",
            Some(&token),
            json!({ "name": "Cognitive Science", "acronym": "CS", "status": "active" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "The acronym is already in use");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_course_listing_is_paginated(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, admin()).await;

    for (name, acronym) in [
        ("Biology", "BIO"),
        ("Chemistry", "CHE"),
        ("Physics", "PHY"),
    ] {
        create_course(&app, &token, name, acronym).await;
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/courses/all?page=1&limit=2", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["total_pages"], 2);
    assert_eq!(body["meta"]["has_more"], true);

    let response = app
        .oneshot(get_request("/api/courses/all?search=phy", Some(&token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["acronym"], "PHY");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_page_far_past_the_end_is_empty(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, admin()).await;
    create_course(&app, &token, "Geography", "GEO").await;

    let response = app
        .oneshot(get_request(
            "/api/courses/all?page=9223372036854775807",
            Some(&token),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["has_more"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_linked_course_cannot_be_deleted(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, admin()).await;

    let course = create_course(&app, &token, "Mathematics", "MAT").await;
    let course_id = course["course_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/disciplines",
            Some(&token),
            json!({
                "name": "Linear Algebra",
                "workload_hours": 60,
                "course_ids": [course_id]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Discipline created successfully");
    let discipline_id = body["discipline_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(delete_request(&format!("/api/courses/{}", course_id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/disciplines/{}", discipline_id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Linear Algebra");
    assert_eq!(body["data"]["courses"][0]["name"], "Mathematics");

    // The discipline is still referenced by the course.
    let response = app
        .oneshot(delete_request(
            &format!("/api/disciplines/{}", discipline_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_discipline_update_replaces_course_links(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, admin()).await;

    let first = create_course(&app, &token, "Nursing", "NUR").await;
    let second = create_course(&app, &token, "Pharmacy", "PHA").await;
    let first_id = first["course_id"].as_str().unwrap().to_string();
    let second_id = second["course_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/disciplines",
            Some(&token),
            json!({
                "name": "Anatomy",
                "workload_hours": 80,
                "course_ids": [first_id]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let discipline_id = body_json(response).await["discipline_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/disciplines/{}", discipline_id),
            Some(&token),
            json!({ "workload_hours": 90, "course_ids": [second_id] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/disciplines/{}", discipline_id),
            Some(&token),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Anatomy");
    assert_eq!(body["data"]["workload_hours"], 90);
    let courses = body["data"]["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["name"], "Pharmacy");

    // Leaving course_ids out keeps the current links.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/disciplines/{}", discipline_id),
            Some(&token),
            json!({ "syllabus": "Bones and muscles" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let links: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM courses_disciplines WHERE discipline_id = $1")
            .bind(uuid::Uuid::parse_str(&discipline_id).unwrap())
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(links, 1);

    // The first course lost its only link and can be deleted now.
    let response = app
        .oneshot(delete_request(&format!("/api/courses/{}", first_id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_course_search_lists_active_courses(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, admin()).await;
    let (_, student_token) = login_as(&pool, student()).await;

    create_course(&app, &token, "Civil Engineering", "CIV").await;
    create_course(&app, &token, "Electrical Engineering", "ELE").await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/courses",
            Some(&token),
            json!({ "name": "Mining Engineering", "acronym": "MIN", "status": "inactive" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_request("/api/courses/search?q=engineering", Some(&student_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Civil Engineering", "Electrical Engineering"]);

    let response = app
        .oneshot(get_request("/api/courses/search?q=civ", Some(&student_token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert!(body[0]["course_id"].is_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_discipline_search(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, teacher()).await;
    create_discipline(&pool, "Organic Chemistry").await;
    create_discipline(&pool, "Inorganic Chemistry").await;
    create_discipline(&pool, "Statistics").await;

    let response = app
        .clone()
        .oneshot(get_request("/api/disciplines/search?q=chem", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Inorganic Chemistry", "Organic Chemistry"]);

    let response = app
        .oneshot(get_request("/api/disciplines/search", Some(&token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_discipline_with_unknown_course_is_rejected(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, admin()).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/disciplines",
            Some(&token),
            json!({
                "name": "Orphan",
                "workload_hours": 30,
                "course_ids": [uuid::Uuid::new_v4()]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "One or more courses do not exist");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_me_returns_profile_with_avatars(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (email, token) = login_as(&pool, student()).await;

    let response = app
        .oneshot(get_request("/api/users/me", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], email.as_str());
    assert_eq!(body["data"]["is_a_student"], true);
    assert!(body["data"]["users_avatars"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_self_edit_resets_validation(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (email, token) = login_as(&pool, teacher()).await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/users/update-info",
            Some(&token),
            json!({ "name": "Renamed Teacher" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (name, is_validated): (Option<String>, bool) =
        sqlx::query_as("SELECT name, is_validated FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(name.as_deref(), Some("Renamed Teacher"));
    assert!(!is_validated);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_non_admin_role_fields_are_ignored(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (email, token) = login_as(&pool, student()).await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/users/update-info",
            Some(&token),
            json!({
                "name": "New Name",
                "is_a_teacher": true,
                "is_a_admin": true,
                "is_a_student": false,
                "is_validated": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (name, is_a_admin, is_a_teacher, is_a_student, is_validated): (
        Option<String>,
        bool,
        bool,
        bool,
        bool,
    ) = sqlx::query_as(
        "SELECT name, is_a_admin, is_a_teacher, is_a_student, is_validated FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(name.as_deref(), Some("New Name"));
    assert!(!is_a_admin);
    assert!(!is_a_teacher);
    assert!(is_a_student);
    assert!(!is_validated);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_filters_and_deletes_users(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, admin()).await;
    create_user(&pool, "ana.teacher@classhero.test", teacher()).await;
    create_user(&pool, "bruno.student@classhero.test", student()).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/users/all?is_a_teacher=true", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["email"], "ana.teacher@classhero.test");

    let response = app
        .clone()
        .oneshot(delete_request("/api/users/bruno.student@classhero.test", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(delete_request("/api/users/bruno.student@classhero.test", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
