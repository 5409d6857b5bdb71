use bson::doc;
use serde_json::{Value, json};

use crate::fixtures::seed::oid;
use crate::fixtures::test_app::TestApp;

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn workshop_code_quick_enrolls_and_normalizes_case() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("wc@atelier.test", "wc_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(&instructor.access_token, "Code Workshop", json!({}))
        .await;

    let student = app
        .register_user("wcs@atelier.test", "wc_student", "Student123!")
        .await;

    // Lower-cased with stray whitespace still resolves
    let sloppy = format!("  {}  ", workshop.join_code.to_lowercase());
    let resp = app
        .auth_post("/api/join", &student.access_token)
        .json(&json!({ "code": sloppy }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "workshop");
    assert_eq!(body["redirect_url"], format!("/workshops/{}", workshop.id));
    assert_eq!(body["enrollment"]["status"], "confirmed");
    assert_eq!(oid(&body["workshop"]["_id"]), workshop.id);

    // Quick enrollment grants the reduced XP award
    let resp = app
        .auth_get("/api/auth/me", &student.access_token)
        .send()
        .await
        .unwrap();
    let me: Value = resp.json().await.unwrap();
    assert_eq!(me["xp"], 25);

    // A second join reuses the enrollment instead of double-enrolling
    let resp = app
        .auth_post("/api/join", &student.access_token)
        .json(&json!({ "code": workshop.join_code }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let resp = app
        .auth_get("/api/auth/me", &student.access_token)
        .send()
        .await
        .unwrap();
    let me: Value = resp.json().await.unwrap();
    assert_eq!(me["xp"], 25);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn session_code_join_records_attendance() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("sc@atelier.test", "sc_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(&instructor.access_token, "Session Codes", json!({}))
        .await;

    let resp = app
        .auth_get(
            &format!("/api/workshop/{}/session", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let sessions: Vec<Value> = resp.json().await.unwrap();
    let session_id = oid(&sessions[0]["_id"]);
    let session_code = sessions[0]["join_code"].as_str().unwrap().to_string();

    let student = app
        .register_user("scs@atelier.test", "sc_student", "Student123!")
        .await;
    let resp = app
        .auth_post("/api/join", &student.access_token)
        .json(&json!({ "code": session_code }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "session");
    assert_eq!(oid(&body["session"]["_id"]), session_id);
    assert_eq!(
        body["redirect_url"],
        format!("/workshops/{}/sessions/{}", workshop.id, session_id)
    );

    let attended = body["enrollment"]["progress"]["sessions_attended"]
        .as_array()
        .unwrap();
    assert_eq!(attended.len(), 1);
    assert_eq!(oid(&attended[0]), session_id);

    // Quick enrollment plus first attendance
    let resp = app
        .auth_get("/api/auth/me", &student.access_token)
        .send()
        .await
        .unwrap();
    let me: Value = resp.json().await.unwrap();
    assert_eq!(me["xp"], 50);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn workshop_code_prefers_a_live_session() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("live@atelier.test", "live_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(&instructor.access_token, "Live Workshop", json!({}))
        .await;

    let resp = app
        .auth_get(
            &format!("/api/workshop/{}/session", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let sessions: Vec<Value> = resp.json().await.unwrap();
    let session_id = oid(&sessions[0]["_id"]);

    let resp = app
        .auth_post(
            &format!("/api/session/{session_id}/start"),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let student = app
        .register_user("lives@atelier.test", "live_student", "Student123!")
        .await;
    let resp = app
        .auth_post("/api/join", &student.access_token)
        .json(&json!({ "code": workshop.join_code }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "live_session");
    assert_eq!(oid(&body["session"]["_id"]), session_id);
    assert_eq!(body["session"]["status"], "live");
    assert_eq!(
        body["redirect_url"],
        format!("/workshops/{}/sessions/{}/live", workshop.id, session_id)
    );
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn expired_session_codes_are_gone() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("exp@atelier.test", "exp_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(&instructor.access_token, "Expiring Codes", json!({}))
        .await;

    let resp = app
        .auth_get(
            &format!("/api/workshop/{}/session", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let sessions: Vec<Value> = resp.json().await.unwrap();
    let session_code = sessions[0]["join_code"].as_str().unwrap().to_string();

    // Push the expiry into the past directly
    let past = bson::DateTime::from_millis(bson::DateTime::now().timestamp_millis() - 1_000);
    app.db
        .collection::<bson::Document>("workshop_sessions")
        .update_one(
            doc! { "join_code": &session_code },
            doc! { "$set": { "code_expires_at": past } },
        )
        .await
        .expect("Failed to expire session code");

    let student = app
        .register_user("exps@atelier.test", "exp_student", "Student123!")
        .await;
    let resp = app
        .auth_post("/api/join", &student.access_token)
        .json(&json!({ "code": session_code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 410);

    // A fresh code replaces the expired one
    let session_id = oid(&sessions[0]["_id"]);
    let resp = app
        .auth_post(
            &format!("/api/session/{session_id}/regenerate-code"),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let refreshed: Value = resp.json().await.unwrap();
    let new_code = refreshed["join_code"].as_str().unwrap();
    assert_ne!(new_code, session_code);

    let resp = app
        .auth_post("/api/join", &student.access_token)
        .json(&json!({ "code": new_code }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn codes_for_finished_sessions_stop_resolving() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("fin@atelier.test", "fin_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(&instructor.access_token, "Finished Sessions", json!({}))
        .await;

    let resp = app
        .auth_get(
            &format!("/api/workshop/{}/session", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let sessions: Vec<Value> = resp.json().await.unwrap();
    let session_id = oid(&sessions[0]["_id"]);
    let session_code = sessions[0]["join_code"].as_str().unwrap().to_string();

    for action in ["start", "end"] {
        let resp = app
            .auth_post(
                &format!("/api/session/{session_id}/{action}"),
                &instructor.access_token,
            )
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
    }

    // The code is still within its TTL but the session is over
    let student = app
        .register_user("fins@atelier.test", "fin_student", "Student123!")
        .await;
    let resp = app
        .auth_post("/api/join", &student.access_token)
        .json(&json!({ "code": session_code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // No enrollment was created and no XP was paid out
    let resp = app
        .auth_get("/api/auth/me", &student.access_token)
        .send()
        .await
        .unwrap();
    let me: Value = resp.json().await.unwrap();
    assert_eq!(me["xp"], 0);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn unknown_codes_are_not_found() {
    let app = TestApp::spawn().await;
    let student = app
        .register_user("nf@atelier.test", "nf_student", "Student123!")
        .await;

    let resp = app
        .auth_post("/api/join", &student.access_token)
        .json(&json!({ "code": "ZZZ-ZZZ-ZZZ" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = app
        .auth_post("/api/join", &student.access_token)
        .json(&json!({ "code": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}
