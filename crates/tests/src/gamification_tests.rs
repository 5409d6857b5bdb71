use serde_json::{Value, json};

use crate::fixtures::seed::{SeededUser, SeededWorkshop, oid};
use crate::fixtures::test_app::TestApp;

async fn quiz_activity(
    app: &TestApp,
    instructor: &SeededUser,
    workshop: &SeededWorkshop,
    answers: &[&str],
) -> String {
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
            &format!("/api/session/{session_id}/activity"),
            &instructor.access_token,
        )
        .json(&json!({
            "title": "Ownership Quiz",
            "activity_type": "quiz",
            "config": { "correct_answers": answers },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let activity: Value = resp.json().await.unwrap();
    let activity_id = oid(&activity["_id"]);

    let resp = app
        .auth_post(
            &format!("/api/activity/{activity_id}/start"),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    activity_id
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn quiz_submission_pays_points_and_xp_once() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("qi@atelier.test", "quiz_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(&instructor.access_token, "Quiz Workshop", json!({}))
        .await;
    app.open_for_enrollment(&instructor.access_token, &workshop.id)
        .await;

    let student = app
        .register_user("qs@atelier.test", "quiz_student", "Student123!")
        .await;
    app.enroll(&student.access_token, &workshop.id, json!({}))
        .await;

    let activity_id = quiz_activity(&app, &instructor, &workshop, &["a", "b", "c"]).await;

    let resp = app
        .auth_post(
            &format!("/api/activity/{activity_id}/submit"),
            &student.access_token,
        )
        .json(&json!({ "answers": ["a", "b", "c"] }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let result: Value = resp.json().await.unwrap();
    assert_eq!(result["score"], 100.0);
    assert_eq!(result["points_awarded"], 100);
    assert_eq!(result["xp_awarded"], 150);
    assert_eq!(result["first_completion"], true);

    // Resubmitting overwrites the answer but pays nothing
    let resp = app
        .auth_post(
            &format!("/api/activity/{activity_id}/submit"),
            &student.access_token,
        )
        .json(&json!({ "answers": ["c", "b", "a"] }))
        .send()
        .await
        .unwrap();
    let result: Value = resp.json().await.unwrap();
    assert_eq!(result["first_completion"], false);
    assert_eq!(result["points_awarded"], 0);
    assert_eq!(result["xp_awarded"], 0);

    // Enrollment XP plus the single activity reward
    let resp = app
        .auth_get("/api/auth/me", &student.access_token)
        .send()
        .await
        .unwrap();
    let me: Value = resp.json().await.unwrap();
    assert_eq!(me["xp"], 200);

    let enrollment = app
        .auth_get(
            &format!("/api/workshop/{}/enrollment", workshop.id),
            &student.access_token,
        )
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(enrollment["progress"]["total_points"], 100);
    assert_eq!(
        enrollment["performance"]["quiz_scores"][&activity_id],
        100.0
    );
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn partial_quiz_answers_score_proportionally() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("pq@atelier.test", "pq_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(&instructor.access_token, "Partial Quiz", json!({}))
        .await;
    app.open_for_enrollment(&instructor.access_token, &workshop.id)
        .await;

    let student = app
        .register_user("pqs@atelier.test", "pq_student", "Student123!")
        .await;
    app.enroll(&student.access_token, &workshop.id, json!({}))
        .await;

    let activity_id = quiz_activity(&app, &instructor, &workshop, &["a", "b"]).await;

    let resp = app
        .auth_post(
            &format!("/api/activity/{activity_id}/submit"),
            &student.access_token,
        )
        .json(&json!({ "answers": ["a", "x"] }))
        .send()
        .await
        .unwrap();
    let result: Value = resp.json().await.unwrap();
    assert_eq!(result["score"], 50.0);
    // Points are all-or-nothing per completion, not scaled by score
    assert_eq!(result["points_awarded"], 100);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn leaderboard_assigns_and_persists_positional_ranks() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("lb@atelier.test", "lb_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(&instructor.access_token, "Ranked Workshop", json!({}))
        .await;
    app.open_for_enrollment(&instructor.access_token, &workshop.id)
        .await;

    let scorer = app
        .register_user("lb1@atelier.test", "lb_scorer", "Student123!")
        .await;
    let idle = app
        .register_user("lb2@atelier.test", "lb_idle", "Student123!")
        .await;
    app.enroll(&scorer.access_token, &workshop.id, json!({}))
        .await;
    app.enroll(&idle.access_token, &workshop.id, json!({}))
        .await;

    let activity_id = quiz_activity(&app, &instructor, &workshop, &["a"]).await;
    let resp = app
        .auth_post(
            &format!("/api/activity/{activity_id}/submit"),
            &scorer.access_token,
        )
        .json(&json!({ "answers": ["a"] }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let board = app
        .auth_get(
            &format!("/api/workshop/{}/leaderboard", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();

    let individual = board["individual"].as_array().unwrap();
    assert_eq!(individual.len(), 2);
    assert_eq!(individual[0]["rank"], 1);
    assert_eq!(individual[0]["total_points"], 100);
    assert_eq!(oid(&individual[0]["user_id"]), scorer.id);
    assert_eq!(individual[1]["rank"], 2);
    assert_eq!(individual[1]["total_points"], 0);
    assert!(board["teams"].is_null());

    // Ranks are written back onto the enrollments
    let enrollment = app
        .auth_get(
            &format!("/api/workshop/{}/enrollment", workshop.id),
            &scorer.access_token,
        )
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(enrollment["progress"]["rank"], 1);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn completing_a_workshop_grants_achievements_and_certificates() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("cw@atelier.test", "cw_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(&instructor.access_token, "Graduation Run", json!({}))
        .await;
    app.open_for_enrollment(&instructor.access_token, &workshop.id)
        .await;

    let student = app
        .register_user("cws@atelier.test", "cw_student", "Student123!")
        .await;
    app.enroll(&student.access_token, &workshop.id, json!({}))
        .await;

    let resp = app
        .auth_post(
            &format!("/api/workshop/{}/complete", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let completed: Value = resp.json().await.unwrap();
    assert_eq!(completed["status"], "completed");

    let enrollment = app
        .auth_get(
            &format!("/api/workshop/{}/enrollment", workshop.id),
            &student.access_token,
        )
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(enrollment["status"], "completed");
    assert!(enrollment["certificate_issued_at"].is_object());
    let cert = enrollment["certificate_url"].as_str().unwrap();
    assert!(cert.ends_with(&format!(
        "/workshops/{}/participants/{}",
        workshop.id, student.id
    )));

    let achievements: Vec<&str> = enrollment["achievements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert!(achievements.contains(&"workshop-completion"));
    // Sole confirmed enrollee ranks first, so top-performer unlocks too
    assert!(achievements.contains(&"top-performer"));
    assert!(!achievements.contains(&"perfect-attendance"));

    // Enrollment XP plus the workshop completion reward
    let me = app
        .auth_get("/api/auth/me", &student.access_token)
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(me["xp"], 1050);
    assert_eq!(me["level"], 2);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn completion_ranks_even_when_the_leaderboard_is_hidden() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("nl@atelier.test", "nl_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(
            &instructor.access_token,
            "Quiet Workshop",
            json!({ "gamification": { "enable_leaderboard": false } }),
        )
        .await;
    app.open_for_enrollment(&instructor.access_token, &workshop.id)
        .await;

    let student = app
        .register_user("nls@atelier.test", "nl_student", "Student123!")
        .await;
    app.enroll(&student.access_token, &workshop.id, json!({}))
        .await;

    // The public leaderboard stays off
    let resp = app
        .auth_get(
            &format!("/api/workshop/{}/leaderboard", workshop.id),
            &student.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = app
        .auth_post(
            &format!("/api/workshop/{}/complete", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    // Final standings still ran: the sole enrollee holds rank 1 and the
    // rank-gated achievement
    let enrollment = app
        .auth_get(
            &format!("/api/workshop/{}/enrollment", workshop.id),
            &student.access_token,
        )
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(enrollment["progress"]["rank"], 1);
    let achievements: Vec<&str> = enrollment["achievements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert!(achievements.contains(&"top-performer"));
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn team_champion_goes_to_the_winning_team_only() {
    let app = TestApp::spawn().await;
    let instructor = app
        .register_user("tb@atelier.test", "tb_instructor", "Instructor123!")
        .await;
    let workshop = app
        .create_workshop(
            &instructor.access_token,
            "Team Battle Workshop",
            json!({ "gamification": { "enable_teams": true, "team_size": 1 } }),
        )
        .await;
    app.open_for_enrollment(&instructor.access_token, &workshop.id)
        .await;

    let winner = app
        .register_user("tbw@atelier.test", "tb_winner", "Student123!")
        .await;
    let runner_up = app
        .register_user("tbr@atelier.test", "tb_runner", "Student123!")
        .await;
    app.enroll(
        &winner.access_token,
        &workshop.id,
        json!({ "team_preference": "Alpha" }),
    )
    .await;
    app.enroll(
        &runner_up.access_token,
        &workshop.id,
        json!({ "team_preference": "Beta" }),
    )
    .await;

    // Only Alpha scores, so Alpha takes team rank 1
    let activity_id = quiz_activity(&app, &instructor, &workshop, &["a"]).await;
    let resp = app
        .auth_post(
            &format!("/api/activity/{activity_id}/submit"),
            &winner.access_token,
        )
        .json(&json!({ "answers": ["a"] }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let resp = app
        .auth_post(
            &format!("/api/workshop/{}/complete", workshop.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let ids = |enrollment: &Value| -> Vec<String> {
        enrollment["achievements"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_str().unwrap().to_string())
            .collect()
    };

    let winner_enrollment = app
        .auth_get(
            &format!("/api/workshop/{}/enrollment", workshop.id),
            &winner.access_token,
        )
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert!(ids(&winner_enrollment).contains(&"team-champion".to_string()));

    let runner_enrollment = app
        .auth_get(
            &format!("/api/workshop/{}/enrollment", workshop.id),
            &runner_up.access_token,
        )
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert!(!ids(&runner_enrollment).contains(&"team-champion".to_string()));
}
