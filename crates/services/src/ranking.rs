use atelier_db::models::{ActivityParticipant, RankBonusTable, TeamResult};
use bson::oid::ObjectId;

/// A ranked leaderboard row. Ranks are strictly positional: ties share a
/// score but not a rank, and earlier entries keep the better rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub id: ObjectId,
    pub points: u64,
    pub rank: u32,
}

/// Sort `(id, points)` pairs by points descending and assign 1-based ranks.
/// The sort is stable, so equal scores keep their input order.
pub fn rank_by_points(entries: Vec<(ObjectId, u64)>) -> Vec<RankedEntry> {
    let mut sorted = entries;
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, (id, points))| RankedEntry {
            id,
            points,
            rank: i as u32 + 1,
        })
        .collect()
}

/// Aggregate team-battle submissions into per-team averages, rank the teams,
/// and attach rank bonuses. Only submitted, scored, team-tagged participants
/// count; teams appear in first-submission order, which also breaks average
/// ties.
pub fn team_battle_results(
    participants: &[ActivityParticipant],
    bonuses: &RankBonusTable,
) -> Vec<TeamResult> {
    let mut grouped: Vec<(ObjectId, Vec<f64>)> = Vec::new();
    for p in participants {
        let (Some(team_id), Some(score), Some(_)) = (p.team_id, p.score, p.submitted_at) else {
            continue;
        };
        match grouped.iter_mut().find(|(id, _)| *id == team_id) {
            Some((_, scores)) => scores.push(score),
            None => grouped.push((team_id, vec![score])),
        }
    }

    let mut averaged: Vec<(ObjectId, f64)> = grouped
        .into_iter()
        .map(|(id, scores)| {
            let avg = scores.iter().sum::<f64>() / scores.len() as f64;
            (id, avg)
        })
        .collect();
    averaged.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    averaged
        .into_iter()
        .enumerate()
        .map(|(i, (team_id, average_score))| {
            let rank = i as u32 + 1;
            TeamResult {
                team_id,
                average_score,
                rank,
                bonus_points: bonuses.for_rank(rank),
            }
        })
        .collect()
}
