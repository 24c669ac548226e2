// src/achievements.rs

//! Achievement catalog and award evaluation.
//!
//! Every rule is a count over the user's passed results compared against a
//! threshold. Awarding runs on the caller's connection, normally inside the
//! transaction that also recorded the result, so a batch of awards and the
//! matching experience updates commit together.

use sqlx::SqliteConnection;

use crate::{
    models::achievement::{ACHIEVEMENT_COLUMNS, Achievement},
    scoring::calculate_level,
};

/// Condition a user's passed results must satisfy to earn an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// At least `min` passed results of any task.
    PassedTasks { min: i64 },
    /// At least `min` passed results in one task category.
    PassedInCategory { category: &'static str, min: i64 },
    /// A passed result completed within `max_seconds`.
    FastPass { max_seconds: i64 },
    /// A passed result scoring the task's full points.
    PerfectScore,
    /// A result that passed on exactly the given attempt number.
    PassedOnAttempt { attempt: i64 },
}

enum RuleArg {
    Text(&'static str),
    Int(i64),
}

impl Criterion {
    /// Aggregate over the user's results; `?1` is the user id, `?4` the rule argument.
    fn count_sql(&self) -> &'static str {
        match self {
            Criterion::PassedTasks { .. } => {
                "SELECT COUNT(*) FROM test_results WHERE user_id = ?1 AND passed = 1"
            }
            Criterion::PassedInCategory { .. } => {
                "SELECT COUNT(*) FROM test_results r \
                 JOIN test_tasks t ON t.id = r.task_id \
                 WHERE r.user_id = ?1 AND r.passed = 1 AND t.category = ?4"
            }
            Criterion::FastPass { .. } => {
                "SELECT COUNT(*) FROM test_results \
                 WHERE user_id = ?1 AND passed = 1 AND time_spent <= ?4"
            }
            Criterion::PerfectScore => {
                "SELECT COUNT(*) FROM test_results \
                 WHERE user_id = ?1 AND passed = 1 AND score = max_score"
            }
            Criterion::PassedOnAttempt { .. } => {
                "SELECT COUNT(*) FROM test_results \
                 WHERE user_id = ?1 AND passed = 1 AND attempts = ?4"
            }
        }
    }

    fn threshold(&self) -> i64 {
        match self {
            Criterion::PassedTasks { min } | Criterion::PassedInCategory { min, .. } => *min,
            _ => 1,
        }
    }

    fn arg(&self) -> Option<RuleArg> {
        match self {
            Criterion::PassedInCategory { category, .. } => Some(RuleArg::Text(*category)),
            Criterion::FastPass { max_seconds } => Some(RuleArg::Int(*max_seconds)),
            Criterion::PassedOnAttempt { attempt } => Some(RuleArg::Int(*attempt)),
            Criterion::PassedTasks { .. } | Criterion::PerfectScore => None,
        }
    }
}

/// One catalog entry together with the rule that unlocks it.
#[derive(Debug, Clone, Copy)]
pub struct AchievementRule {
    pub id: i64,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub points: i64,
    pub category: &'static str,
    pub criterion: Criterion,
}

/// Evaluated in declaration order. Ids are stable and seeded into `achievements`.
pub static ACHIEVEMENT_RULES: [AchievementRule; 8] = [
    AchievementRule {
        id: 1,
        name: "First Step",
        description: "Complete your first task",
        icon: "🎯",
        points: 10,
        category: "general",
        criterion: Criterion::PassedTasks { min: 1 },
    },
    AchievementRule {
        id: 2,
        name: "Functional Tester",
        description: "Complete 5 functional testing tasks",
        icon: "🔧",
        points: 50,
        category: "functional",
        criterion: Criterion::PassedInCategory { category: "functional", min: 5 },
    },
    AchievementRule {
        id: 3,
        name: "UI Master",
        description: "Complete 5 UI testing tasks",
        icon: "🎨",
        points: 50,
        category: "ui",
        criterion: Criterion::PassedInCategory { category: "ui", min: 5 },
    },
    AchievementRule {
        id: 4,
        name: "API Expert",
        description: "Complete 5 API testing tasks",
        icon: "🔌",
        points: 50,
        category: "api",
        criterion: Criterion::PassedInCategory { category: "api", min: 5 },
    },
    AchievementRule {
        id: 5,
        name: "Security Specialist",
        description: "Complete 5 security testing tasks",
        icon: "🛡️",
        points: 50,
        category: "security",
        criterion: Criterion::PassedInCategory { category: "security", min: 5 },
    },
    AchievementRule {
        id: 6,
        name: "Speedster",
        description: "Complete a task in under 30 seconds",
        icon: "⚡",
        points: 25,
        category: "performance",
        criterion: Criterion::FastPass { max_seconds: 30 },
    },
    AchievementRule {
        id: 7,
        name: "Perfectionist",
        description: "Complete a task with a 100% score",
        icon: "💯",
        points: 30,
        category: "quality",
        criterion: Criterion::PerfectScore,
    },
    AchievementRule {
        id: 8,
        name: "Persistent",
        description: "Complete a task on the 3rd attempt",
        icon: "💪",
        points: 20,
        category: "persistence",
        criterion: Criterion::PassedOnAttempt { attempt: 3 },
    },
];

/// Awards every achievement the user newly qualifies for.
///
/// For each rule the award row is inserted only when the user does not hold
/// it yet and the rule's aggregate reaches its threshold; the UNIQUE
/// (user_id, achievement_id) constraint makes a concurrent duplicate a no-op.
/// Each inserted award adds the achievement's points to the user's experience
/// and total score and recomputes the level.
///
/// Returns the newly earned achievements in rule order.
pub async fn evaluate_achievements(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<Achievement>, sqlx::Error> {
    let mut earned = Vec::new();

    for rule in ACHIEVEMENT_RULES.iter() {
        let sql = format!(
            "INSERT INTO user_achievements (user_id, achievement_id) \
             SELECT ?1, ?2 \
             WHERE EXISTS (SELECT 1 FROM achievements WHERE id = ?2) \
               AND NOT EXISTS (SELECT 1 FROM user_achievements WHERE user_id = ?1 AND achievement_id = ?2) \
               AND ({}) >= ?3 \
             ON CONFLICT (user_id, achievement_id) DO NOTHING",
            rule.criterion.count_sql()
        );

        let mut query = sqlx::query(&sql)
            .bind(user_id)
            .bind(rule.id)
            .bind(rule.criterion.threshold());
        query = match rule.criterion.arg() {
            Some(RuleArg::Text(text)) => query.bind(text),
            Some(RuleArg::Int(value)) => query.bind(value),
            None => query,
        };

        let inserted = query.execute(&mut *conn).await?.rows_affected();
        if inserted == 0 {
            continue;
        }

        let achievement = sqlx::query_as::<_, Achievement>(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE id = ?"
        ))
        .bind(rule.id)
        .fetch_one(&mut *conn)
        .await?;

        add_experience(conn, user_id, achievement.points).await?;
        tracing::info!(
            "User {} earned achievement '{}' (+{} xp)",
            user_id,
            achievement.name,
            achievement.points
        );
        earned.push(achievement);
    }

    Ok(earned)
}

/// Level change produced by an experience grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChange {
    pub previous: i64,
    pub current: i64,
}

/// Adds `points` to the user's experience and total score, then recomputes the level.
///
/// The increment is relative so concurrent grants never overwrite each other.
pub async fn add_experience(
    conn: &mut SqliteConnection,
    user_id: i64,
    points: i64,
) -> Result<LevelChange, sqlx::Error> {
    let (experience, previous): (i64, i64) = sqlx::query_as(
        "UPDATE users SET experience = experience + ?, total_score = total_score + ? \
         WHERE id = ? RETURNING experience, level",
    )
    .bind(points)
    .bind(points)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    let current = calculate_level(experience).max(previous);
    if current != previous {
        sqlx::query("UPDATE users SET level = ? WHERE id = ?")
            .bind(current)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        tracing::info!("User {} reached level {}", user_id, current);
    }

    Ok(LevelChange { previous, current })
}
