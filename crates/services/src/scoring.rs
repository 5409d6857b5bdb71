use atelier_db::models::{ActivityConfig, ActivityResponse, ActivityType};
use rand::Rng;

/// Grade a submission on a 0-100 scale, dispatched on the activity type.
///
/// Polls and discussions award full participation credit. Code challenges
/// have no grader wired up yet, so they draw a uniform placeholder score.
/// Team battles score zero here; their points flow through the team bonus
/// pass at completion instead.
pub fn score_response(
    activity_type: ActivityType,
    config: &ActivityConfig,
    response: &ActivityResponse,
) -> f64 {
    match activity_type {
        ActivityType::Quiz => score_quiz(config, response),
        ActivityType::CodeChallenge => rand::rng().random_range(70..=100) as f64,
        ActivityType::Poll | ActivityType::Discussion => 100.0,
        ActivityType::TeamBattle => 0.0,
    }
}

fn score_quiz(config: &ActivityConfig, response: &ActivityResponse) -> f64 {
    let total = config.correct_answers.len();
    if total == 0 {
        return 0.0;
    }
    let correct = config
        .correct_answers
        .iter()
        .zip(response.answers.iter())
        .filter(|(expected, given)| expected == given)
        .count();
    correct as f64 / total as f64 * 100.0
}
