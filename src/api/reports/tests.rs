use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::models::{AnswerOption, Question, Subject, User};
use crate::test_support::{self, TestContext};

async fn call(
    ctx: &TestContext,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(method, uri, Some(token), body))
        .await
        .expect("request");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

/// Starts and submits `subject`, answering the first `correct` questions
/// right and the rest wrong. Returns the session id.
async fn sit_exam(
    ctx: &TestContext,
    token: &str,
    subject: &Subject,
    questions: &[(Question, Vec<AnswerOption>)],
    correct: usize,
) -> String {
    let (status, started) = call(
        ctx,
        Method::POST,
        &format!("/api/v1/student/subjects/{}/start", subject.id),
        token,
        None,
    )
    .await;
    assert!(status.is_success(), "start: {started}");
    let session_id = started["session_id"].as_str().expect("session id").to_string();

    let mut answers = serde_json::Map::new();
    for (index, (question, options)) in questions.iter().enumerate() {
        let pick = if index < correct { &options[0] } else { &options[1] };
        answers.insert(question.id.clone(), json!(pick.id));
    }

    let (status, report) = call(
        ctx,
        Method::POST,
        &format!("/api/v1/student/sessions/{session_id}/submit"),
        token,
        Some(json!({ "answers": answers })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "submit: {report}");
    session_id
}

async fn subject_with_questions(
    ctx: &TestContext,
    teacher: &User,
    name: &str,
    count: usize,
) -> (Subject, Vec<(Question, Vec<AnswerOption>)>) {
    let subject = test_support::insert_subject(ctx.state.db(), teacher, name, 30, None).await;
    let mut questions = Vec::with_capacity(count);
    for index in 0..count {
        questions.push(
            test_support::insert_question_with_options(
                ctx.state.db(),
                &subject,
                &format!("{name} question {}", index + 1),
                2,
                0,
            )
            .await,
        );
    }
    (subject, questions)
}

#[tokio::test]
async fn report_card_uses_latest_completed_session_per_subject() {
    let ctx = test_support::setup_test_context().await;
    let teacher = test_support::insert_teacher(ctx.state.db(), "report@school.ng").await;
    let student = test_support::insert_student(ctx.state.db(), "tunde@school.ng", None).await;
    let token = test_support::bearer_token(&student, ctx.state.settings());

    let (maths, maths_questions) = subject_with_questions(&ctx, &teacher, "Maths", 4).await;
    let (english, english_questions) = subject_with_questions(&ctx, &teacher, "English", 2).await;
    subject_with_questions(&ctx, &teacher, "French", 2).await;

    sit_exam(&ctx, &token, &maths, &maths_questions, 1).await;
    let latest_maths = sit_exam(&ctx, &token, &maths, &maths_questions, 3).await;
    sit_exam(&ctx, &token, &english, &english_questions, 1).await;

    let (status, card) = call(&ctx, Method::GET, "/api/v1/student/report-card", &token, None).await;
    assert_eq!(status, StatusCode::OK, "response: {card}");

    let rows = card["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["subject_name"], "Maths");
    assert_eq!(rows[0]["session_id"], latest_maths.as_str());
    assert_eq!(rows[0]["percentage"], 75.0);
    assert_eq!(rows[0]["grade"], "A1");
    assert_eq!(rows[1]["subject_name"], "English");
    assert_eq!(rows[1]["percentage"], 50.0);
    assert_eq!(rows[1]["grade"], "C6");
    assert_eq!(card["overall_percentage"], 62.5);
    assert_eq!(card["overall_grade"], "C4");
}

#[tokio::test]
async fn empty_report_card_has_zero_overall() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_student(ctx.state.db(), "uche@school.ng", None).await;
    let token = test_support::bearer_token(&student, ctx.state.settings());

    let (status, card) = call(&ctx, Method::GET, "/api/v1/student/report-card", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(card["rows"].as_array().expect("rows").is_empty());
    assert_eq!(card["overall_percentage"], 0.0);
    assert_eq!(card["overall_grade"], "F9");
}

#[tokio::test]
async fn session_report_visible_to_owner_and_teachers_only() {
    let ctx = test_support::setup_test_context().await;
    let teacher = test_support::insert_teacher(ctx.state.db(), "viewer@school.ng").await;
    let other_teacher = test_support::insert_teacher(ctx.state.db(), "guest@school.ng").await;
    let student = test_support::insert_student(ctx.state.db(), "vic@school.ng", None).await;
    let classmate = test_support::insert_student(ctx.state.db(), "wale@school.ng", None).await;
    let token = test_support::bearer_token(&student, ctx.state.settings());

    let (subject, questions) = subject_with_questions(&ctx, &teacher, "Geography", 2).await;
    let session_id = sit_exam(&ctx, &token, &subject, &questions, 2).await;
    let uri = format!("/api/v1/reports/sessions/{session_id}");

    let (status, report) = call(&ctx, Method::GET, &uri, &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["correct"], 2);
    assert_eq!(report["results"][0]["correct_option_text"], "A");

    let other_token = test_support::bearer_token(&other_teacher, ctx.state.settings());
    let (status, _) = call(&ctx, Method::GET, &uri, &other_token, None).await;
    assert_eq!(status, StatusCode::OK);

    let classmate_token = test_support::bearer_token(&classmate, ctx.state.settings());
    let (status, _) = call(&ctx, Method::GET, &uri, &classmate_token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        call(&ctx, Method::GET, "/api/v1/reports/sessions/missing", &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
