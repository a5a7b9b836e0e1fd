//! Themes, theme materials and quiz questions.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::*;

#[sqlx::test(migrations = "./migrations")]
async fn test_theme_lifecycle(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, teacher()).await;
    let class_discipline_id = create_class_discipline(&pool).await;

    for (title, order) in [("Graphs", 2), ("Sorting", 1)] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/themes",
                Some(&token),
                json!({
                    "title": title,
                    "class_discipline_id": class_discipline_id,
                    "order": order
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/themes/by-class-discipline/{}", class_discipline_id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let themes = body["data"].as_array().unwrap();
    assert_eq!(themes.len(), 2);
    assert_eq!(themes[0]["title"], "Sorting");
    assert_eq!(themes[1]["order"], 2);

    let theme_id = themes[0]["id"].as_str().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/themes/{}", theme_id),
            Some(&token),
            json!({ "title": "Sorting algorithms" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Sorting algorithms");
    assert_eq!(body["data"]["order"], 1);

    let response = app
        .clone()
        .oneshot(delete_request(&format!("/api/themes/{}", theme_id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(delete_request(&format!("/api/themes/{}", theme_id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_theme_order_is_unique_per_class_discipline(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, admin()).await;
    let class_discipline_id = create_class_discipline(&pool).await;
    create_theme(&pool, class_discipline_id, 1).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/themes",
            Some(&token),
            json!({
                "title": "Clash",
                "class_discipline_id": class_discipline_id,
                "order": 1
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "A theme with this order already exists for this discipline"
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_theme_for_unknown_class_discipline(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, admin()).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/themes",
            Some(&token),
            json!({
                "title": "Nowhere",
                "class_discipline_id": Uuid::new_v4(),
                "order": 1
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Class discipline not found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_text_material_lifecycle(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, teacher()).await;
    let theme_id = create_theme(&pool, create_class_discipline(&pool).await, 1).await;
    let theme = theme_id.to_string();

    let body = multipart_body(
        &[
            ("theme_id", theme.as_str()),
            ("type", "link"),
            ("title", "Visualizer"),
            ("content", "https://visualgo.net"),
            ("order", "1"),
        ],
        None,
    );
    let response = app
        .clone()
        .oneshot(multipart_request("POST", "/api/theme-materials", &token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["type"], "link");
    assert_eq!(body["data"]["content"], "https://visualgo.net");
    let material_id = body["data"]["material_id"].as_str().unwrap().to_string();

    let body = multipart_body(&[("title", "Sorting visualizer"), ("order", "3")], None);
    let response = app
        .clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/theme-materials/{}", material_id),
            &token,
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Sorting visualizer");
    assert_eq!(body["order"], 3);
    assert_eq!(body["content"], "https://visualgo.net");

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/theme-materials/by-theme/{}", theme_id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(delete_request(
            &format!("/api/theme-materials/{}", material_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Material deleted successfully");

    let response = app
        .oneshot(delete_request(
            &format!("/api/theme-materials/{}", material_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_pdf_material_is_stored_and_removed(pool: sqlx::PgPool) {
    let config = test_config();
    let storage_dir = config.storage.base_dir.clone();
    let app = setup_app_with_config(pool.clone(), config);
    let (_, token) = login_as(&pool, teacher()).await;
    let theme = create_theme(&pool, create_class_discipline(&pool).await, 1)
        .await
        .to_string();

    let body = multipart_body(
        &[
            ("theme_id", theme.as_str()),
            ("type", "pdf"),
            ("title", "Lecture notes"),
            ("order", "1"),
        ],
        Some(("file", "notes week 1.pdf", "application/pdf", b"%PDF-1.4 test")),
    );
    let response = app
        .clone()
        .oneshot(multipart_request("POST", "/api/theme-materials", &token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let url = body["data"]["content"].as_str().unwrap().to_string();
    let material_id = body["data"]["material_id"].as_str().unwrap().to_string();

    let key = url
        .strip_prefix("http://localhost:3000/files/")
        .unwrap()
        .to_string();
    assert!(key.starts_with("materials/pdfs/"));
    assert!(key.ends_with("_notes_week_1.pdf"));
    assert!(storage_dir.join(&key).exists());

    let response = app
        .clone()
        .oneshot(get_request(&format!("/files/{}", key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(delete_request(
            &format!("/api/theme-materials/{}", material_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!storage_dir.join(&key).exists());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_theme_delete_removes_files_of_any_material_type(pool: sqlx::PgPool) {
    let config = test_config();
    let storage_dir = config.storage.base_dir.clone();
    let app = setup_app_with_config(pool.clone(), config);
    let (_, token) = login_as(&pool, teacher()).await;
    let theme_id = create_theme(&pool, create_class_discipline(&pool).await, 1).await;
    let theme = theme_id.to_string();

    let body = multipart_body(
        &[
            ("theme_id", theme.as_str()),
            ("type", "link"),
            ("title", "Slides"),
            ("content", "https://example.com/slides"),
            ("order", "1"),
        ],
        None,
    );
    let response = app
        .clone()
        .oneshot(multipart_request("POST", "/api/theme-materials", &token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let material_id = body["data"]["material_id"].as_str().unwrap().to_string();

    let body = multipart_body(
        &[("type", "link"), ("order", "1")],
        Some(("file", "slides.pdf", "application/pdf", b"%PDF-1.4 slides")),
    );
    let response = app
        .clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/theme-materials/{}", material_id),
            &token,
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["type"], "link");
    let key = body["content"]
        .as_str()
        .unwrap()
        .strip_prefix("http://localhost:3000/files/")
        .unwrap()
        .to_string();
    assert!(storage_dir.join(&key).exists());

    let response = app
        .oneshot(delete_request(&format!("/api/themes/{}", theme_id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!storage_dir.join(&key).exists());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_non_pdf_upload_is_rejected(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, teacher()).await;
    let theme = create_theme(&pool, create_class_discipline(&pool).await, 1)
        .await
        .to_string();

    let body = multipart_body(
        &[
            ("theme_id", theme.as_str()),
            ("type", "pdf"),
            ("title", "Not a pdf"),
            ("order", "1"),
        ],
        Some(("file", "notes.txt", "text/plain", b"plain text")),
    );
    let response = app
        .oneshot(multipart_request("POST", "/api/theme-materials", &token, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let materials: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM theme_materials")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(materials, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_quiz_generation_failure_leaves_nothing_behind(pool: sqlx::PgPool) {
    let config = test_config();
    let storage_dir = config.storage.base_dir.clone();
    let app = setup_app_with_config(pool.clone(), config);
    let (_, token) = login_as(&pool, teacher()).await;
    let theme = create_theme(&pool, create_class_discipline(&pool).await, 1)
        .await
        .to_string();

    let body = multipart_body(
        &[
            ("theme_id", theme.as_str()),
            ("type", "quiz"),
            ("title", "Week 1 quiz"),
            ("order", "1"),
        ],
        Some(("file", "week1.pdf", "application/pdf", b"%PDF-1.4 quiz")),
    );
    let response = app
        .oneshot(multipart_request("POST", "/api/theme-materials", &token, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let materials: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM theme_materials")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(materials, 0);
    let quiz_dir = storage_dir.join("materials/quizzes");
    let leftover = std::fs::read_dir(&quiz_dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    assert!(!leftover);
}

/// Serves a fixed `/generate-quiz` answer on a random local port.
async fn spawn_curator(answer: serde_json::Value) -> String {
    use axum::{Json, Router, routing::post};

    let router = Router::new().route(
        "/generate-quiz",
        post(move || {
            let answer = answer.clone();
            async move { Json(answer) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generated_questions_are_stored(pool: sqlx::PgPool) {
    let mut config = test_config();
    config.curator.base_url = spawn_curator(json!({
        "title": "Week 2 quiz",
        "questions": [
            {
                "type": "single",
                "question": "Which structure is LIFO?",
                "options": ["Queue", "Stack"],
                "correct_answers": ["Stack"]
            },
            {
                "type": "single",
                "question": "Which structure is FIFO?",
                "options": ["Queue", "Stack"],
                "correct_answers": ["Queue"],
                "status": "approved",
                "times_used": 4
            }
        ]
    }))
    .await;
    let app = setup_app_with_config(pool.clone(), config);
    let (_, token) = login_as(&pool, teacher()).await;
    let theme = create_theme(&pool, create_class_discipline(&pool).await, 1)
        .await
        .to_string();

    let body = multipart_body(
        &[
            ("theme_id", theme.as_str()),
            ("type", "quiz"),
            ("title", "Week 2 quiz"),
            ("order", "1"),
        ],
        Some(("file", "week2.pdf", "application/pdf", b"%PDF-1.4 quiz")),
    );
    let response = app
        .oneshot(multipart_request("POST", "/api/theme-materials", &token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let rows: Vec<(String, String, i32)> = sqlx::query_as(
        "SELECT question, status, times_used FROM quiz_questions ORDER BY question ASC",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(
        rows,
        vec![
            ("Which structure is FIFO?".to_string(), "approved".to_string(), 4),
            ("Which structure is LIFO?".to_string(), "draft".to_string(), 0),
        ]
    );
}

async fn insert_question(
    pool: &sqlx::PgPool,
    material_id: Uuid,
    question: &str,
    question_type: &str,
    status: &str,
) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        r#"INSERT INTO quiz_questions (material_id, type, level, question, options, correct_answers, status)
           VALUES ($1, $2, 'easy', $3, '["A", "B"]'::jsonb, '["A"]'::jsonb, $4)
           RETURNING question_id"#,
    )
    .bind(material_id)
    .bind(question_type)
    .bind(question)
    .bind(status)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_quiz_questions_are_filtered(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    let (_, token) = login_as(&pool, student()).await;
    let theme_id = create_theme(&pool, create_class_discipline(&pool).await, 1).await;

    let material_id: Uuid = sqlx::query_scalar(
        r#"INSERT INTO theme_materials (theme_id, title, type, content, "order")
           VALUES ($1, 'Quiz', 'quiz', 'http://localhost:3000/files/materials/quizzes/q.pdf', 1)
           RETURNING material_id"#,
    )
    .bind(theme_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let first = insert_question(&pool, material_id, "What is a heap?", "single", "approved").await;
    insert_question(&pool, material_id, "Pick the stable sorts", "multiple", "draft").await;
    insert_question(&pool, material_id, "What is a stack?", "single", "draft").await;

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/quizzes?material_id={}", material_id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["limit"], 10);

    let response = app
        .clone()
        .oneshot(get_request(
            &format!(
                "/api/quizzes?material_id={}&type=single&status=draft",
                material_id
            ),
            Some(&token),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["question"], "What is a stack?");

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/quizzes?material_id={}&search=heap", material_id),
            Some(&token),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["meta"]["total"], 1);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/quizzes/{}", first), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["type"], "single");
    assert_eq!(body["options"], json!(["A", "B"]));

    let response = app
        .oneshot(get_request(
            &format!("/api/quizzes/{}", Uuid::new_v4()),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
