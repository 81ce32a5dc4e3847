use crate::auth::hash_password;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, Goal, QuizAnswer, QuizItem, Resource, Tip, User};
use crate::{utils, Config, Result};
use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info};

pub const DEMO_EMAIL: &str = "demo@edufin.test";
pub const DEMO_PASSWORD: &str = "password123";
const DEMO_NAME: &str = "Demo Student";

const TIPS: [&str; 4] = [
    "Pack your lunch; save about $2 per day",
    "Use a shopping list; avoid impulse buys",
    "Split streaming plans with family",
    "Buy used textbooks; sell old ones",
];

const QUIZ: [(&str, QuizAnswer, &str); 4] = [
    ("Laptop for college", QuizAnswer::Need, "Supports study and coursework"),
    ("Latest branded shoes", QuizAnswer::Want, "Fashion, not essential"),
    ("Internet plan for home", QuizAnswer::Need, "Enables school work"),
    ("Concert VIP tickets", QuizAnswer::Want, "Entertainment upgrade"),
];

const GOALS: [(&str, u32, u32); 2] = [
    ("Gaming Laptop", 1000, 300),
    ("Noise-canceling Headphones", 150, 45),
];

/// What `seed` wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub tips: usize,
    pub quiz_items: usize,
    pub goals: usize,
    pub demo_email: String,
    /// True when a starter resources file was written.
    pub resources_written: bool,
}

/// Loads the demo data. Tips, quiz items and the demo user (with their goals and expenses) are
/// replaced on every run; an existing resources file is left alone.
pub async fn seed(config: Config) -> Result<Out<SeedReport>> {
    let db = config.db();

    let tips: Vec<Tip> = TIPS.iter().map(|text| Tip::new(*text)).collect();
    db.replace_tips(&tips)
        .await
        .pub_result(ErrorType::Database)?;

    let quiz: Vec<QuizItem> = QUIZ
        .iter()
        .map(|(prompt, answer, why)| QuizItem::new(*prompt, *answer, Some(why.to_string())))
        .collect();
    db.replace_quiz_items(&quiz)
        .await
        .pub_result(ErrorType::Database)?;

    if db
        .delete_user_by_email(DEMO_EMAIL)
        .await
        .pub_result(ErrorType::Database)?
    {
        debug!("Removed the previous demo user");
    }
    let hash = tokio::task::spawn_blocking(|| hash_password(DEMO_PASSWORD))
        .await
        .context("The password hashing task failed")
        .and_then(|r| r)
        .pub_result(ErrorType::Internal)?;
    let demo = User::new(DEMO_EMAIL, DEMO_NAME, hash);
    db.insert_user(&demo)
        .await
        .pub_result(ErrorType::Database)?;
    for (name, target, saved) in GOALS {
        let goal = Goal::new(&demo.id, name, Amount::from(target), Amount::from(saved));
        db.insert_goal(&goal)
            .await
            .pub_result(ErrorType::Database)?;
    }

    let resources_path = config.resources_path();
    let resources_written = !resources_path.is_file();
    if resources_written {
        utils::serialize(&resources_path, &starter_resources())
            .await
            .pub_result(ErrorType::Internal)?;
        info!("Wrote starter resources to {}", resources_path.display());
    }

    let report = SeedReport {
        tips: tips.len(),
        quiz_items: quiz.len(),
        goals: GOALS.len(),
        demo_email: DEMO_EMAIL.to_string(),
        resources_written,
    };
    Ok(Out::new(
        format!("Seed complete: {DEMO_EMAIL} / {DEMO_PASSWORD}"),
        report,
    ))
}

fn starter_resources() -> Vec<Resource> {
    let resource = |title: &str, url: &str, category: &str, tags: &[&str], pinned: bool| Resource {
        title: title.to_string(),
        url: url.to_string(),
        category: Some(category.to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        language: Some("en".to_string()),
        pinned,
        ..Default::default()
    };
    vec![
        resource(
            "Budgeting basics",
            "https://www.consumerfinance.gov/consumer-tools/budgeting/",
            "budgeting",
            &["budget", "basics"],
            true,
        ),
        resource(
            "How compound interest works",
            "https://www.investor.gov/financial-tools-calculators/calculators/compound-interest-calculator",
            "saving",
            &["interest", "saving"],
            false,
        ),
        resource(
            "Needs versus wants",
            "https://www.mymoney.gov/",
            "budgeting",
            &["needs", "wants"],
            false,
        ),
    ]
}
