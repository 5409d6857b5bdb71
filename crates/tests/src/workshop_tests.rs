use serde_json::{Value, json};

use crate::fixtures::seed::oid;
use crate::fixtures::test_app::TestApp;

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn create_workshop_mints_code_badges_and_default_sessions() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("ada@atelier.test", "ada", "Instructor123!")
        .await;

    let workshop = app
        .create_workshop(&instructor.access_token, "Rust Bootcamp", json!({}))
        .await;

    // Join code shape: three upper-case base36 triplets
    let parts: Vec<&str> = workshop.join_code.split('-').collect();
    assert_eq!(parts.len(), 3);
    for part in parts {
        assert_eq!(part.len(), 3);
        assert_eq!(part.to_uppercase(), part);
    }

    let resp = app
        .auth_get(
            &format!("/api/workshop/{}", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "draft");
    assert_eq!(json["enrollment_count"], 0);
    let badge_ids: Vec<&str> = json["badges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        badge_ids,
        vec!["workshop-completion", "perfect-attendance", "top-performer"]
    );

    // The three seeded sessions, in sequence order, each with a session code
    let resp = app
        .auth_get(
            &format!("/api/workshop/{}/session", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let sessions: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(sessions.len(), 3);
    for (i, session) in sessions.iter().enumerate() {
        assert_eq!(session["sequence"], i as u64 + 1);
        assert_eq!(session["status"], "scheduled");
        assert!(session["join_code"].as_str().unwrap().starts_with("WORKSHOP-"));
    }
    assert_eq!(sessions[0]["title"], "Opening Session");
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn teams_enabled_workshops_carry_the_team_champion_badge() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("tc@atelier.test", "tc_instructor", "Instructor123!")
        .await;

    let workshop = app
        .create_workshop(
            &instructor.access_token,
            "Team Hackathon",
            json!({ "gamification": { "enable_teams": true } }),
        )
        .await;

    let resp = app
        .auth_get(
            &format!("/api/workshop/{}", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert!(
        json["badges"]
            .as_array()
            .unwrap()
            .iter()
            .any(|b| b["id"] == "team-champion")
    );
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn lifecycle_guards_reject_out_of_order_transitions() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("guard@atelier.test", "guard", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(&instructor.access_token, "Guarded", json!({}))
        .await;

    // Draft cannot start
    let resp = app
        .auth_post(
            &format!("/api/workshop/{}/start", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    app.open_for_enrollment(&instructor.access_token, &workshop.id)
        .await;

    // registration_open cannot start either; it must close first
    let resp = app
        .auth_post(
            &format!("/api/workshop/{}/start", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    for action in ["close-registration", "start"] {
        let resp = app
            .auth_post(
                &format!("/api/workshop/{}/{action}", workshop.id),
                &instructor.access_token,
            )
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success(), "{action} failed");
    }

    let resp = app
        .auth_get(
            &format!("/api/workshop/{}", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "in_progress");
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn enrollment_confirms_waitlists_and_rejects_duplicates() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("enr@atelier.test", "enr_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(
            &instructor.access_token,
            "Tiny Workshop",
            json!({ "max_participants": 1 }),
        )
        .await;
    app.open_for_enrollment(&instructor.access_token, &workshop.id)
        .await;

    let first = app
        .register_user("s1@atelier.test", "student1", "Student123!")
        .await;
    let enrollment = app
        .enroll(&first.access_token, &workshop.id, json!({}))
        .await;
    assert_eq!(enrollment["status"], "confirmed");
    assert_eq!(enrollment["user_id"], json!({ "$oid": first.id }));

    // Enrolling twice conflicts
    let resp = app
        .auth_post(
            &format!("/api/workshop/{}/enroll", workshop.id),
            &first.access_token,
        )
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // Capacity is gone, the next student is waitlisted
    let second = app
        .register_user("s2@atelier.test", "student2", "Student123!")
        .await;
    let enrollment = app
        .enroll(&second.access_token, &workshop.id, json!({}))
        .await;
    assert_eq!(enrollment["status"], "waitlisted");

    // Waitlisted enrollments do not consume a slot
    let resp = app
        .auth_get(
            &format!("/api/workshop/{}", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["enrollment_count"], 1);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn enrollment_honors_minimum_level_prerequisite() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("pre@atelier.test", "pre_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(
            &instructor.access_token,
            "Advanced Workshop",
            json!({ "prerequisites": { "min_level": 5 } }),
        )
        .await;
    app.open_for_enrollment(&instructor.access_token, &workshop.id)
        .await;

    let novice = app
        .register_user("novice@atelier.test", "novice", "Student123!")
        .await;
    let resp = app
        .auth_post(
            &format!("/api/workshop/{}/enroll", workshop.id),
            &novice.access_token,
        )
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("level 5"));
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn prerequisite_failures_outrank_duplicate_enrollment() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("rank@atelier.test", "rank_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(
            &instructor.access_token,
            "Gated Workshop",
            json!({ "prerequisites": { "min_level": 5 } }),
        )
        .await;
    app.open_for_enrollment(&instructor.access_token, &workshop.id)
        .await;

    // Quick join by code skips prerequisites and leaves the user enrolled
    let novice = app
        .register_user("sneaky@atelier.test", "sneaky_novice", "Student123!")
        .await;
    let resp = app
        .auth_post("/api/join", &novice.access_token)
        .json(&json!({ "code": workshop.join_code }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    // A regular enrollment attempt reports the unmet prerequisite, not the
    // existing enrollment
    let resp = app
        .auth_post(
            &format!("/api/workshop/{}/enroll", workshop.id),
            &novice.access_token,
        )
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("level 5"));
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn only_the_instructor_may_update_or_transition() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("own@atelier.test", "owner", "Instructor123!")
        .await;
    let outsider = app
        .register_user("out@atelier.test", "outsider", "Student123!")
        .await;
    let workshop = app
        .create_workshop(&instructor.access_token, "Private Workshop", json!({}))
        .await;

    let resp = app
        .auth_put(
            &format!("/api/workshop/{}", workshop.id),
            &outsider.access_token,
        )
        .json(&json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_post(
            &format!("/api/workshop/{}/publish", workshop.id),
            &outsider.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn team_preference_creates_and_fills_teams_in_palette_order() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("team@atelier.test", "team_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(
            &instructor.access_token,
            "Team Workshop",
            json!({ "gamification": { "enable_teams": true, "team_size": 2 } }),
        )
        .await;
    app.open_for_enrollment(&instructor.access_token, &workshop.id)
        .await;

    // Two students name the same team, a third names a new one
    for (email, username, team) in [
        ("t1@atelier.test", "tm1", "Ferris"),
        ("t2@atelier.test", "tm2", "Ferris"),
        ("t3@atelier.test", "tm3", "Borrowers"),
    ] {
        let user = app.register_user(email, username, "Student123!").await;
        let enrollment = app
            .enroll(
                &user.access_token,
                &workshop.id,
                json!({ "team_preference": team }),
            )
            .await;
        assert!(enrollment["team_id"].is_object(), "missing team for {username}");
    }

    let resp = app
        .auth_get(
            &format!("/api/workshop/{}/team", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let teams: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0]["name"], "Ferris");
    assert_eq!(teams[0]["color"], "red");
    assert_eq!(teams[0]["member_count"], 2);
    assert_eq!(teams[1]["name"], "Borrowers");
    assert_eq!(teams[1]["color"], "blue");

    let _ = oid(&teams[0]["_id"]);
}
