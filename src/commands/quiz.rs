use crate::args::ScoreQuizArgs;
use crate::commands::{count, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::QuizItem;
use crate::{Config, Error, Result};
use serde::Serialize;

/// The outcome of a quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
    /// Correct answers.
    pub score: usize,
    /// Items the caller gave an answer for.
    pub answered: usize,
    /// Items in the quiz.
    pub total: usize,
    /// `score` as a whole percentage of `total`, 0 for an empty quiz.
    pub percentage: u32,
}

pub async fn list_quiz(config: Config) -> Result<Out<Vec<QuizItem>>> {
    let items = config
        .db()
        .quiz_items()
        .await
        .pub_result(ErrorType::Database)?;
    Ok(Out::new(
        format!("Found {}", count(items.len(), "quiz item", "quiz items")),
        items,
    ))
}

/// Scores the submitted answers against the stored quiz. Unanswered items count as wrong.
///
/// # Errors
/// - `Request` if an answer names an item that does not exist
pub async fn score_quiz(config: Config, args: ScoreQuizArgs) -> Result<Out<QuizScore>> {
    let items = config
        .db()
        .quiz_items()
        .await
        .pub_result(ErrorType::Database)?;

    if let Some(unknown) = args
        .answers
        .keys()
        .find(|id| !items.iter().any(|item| &item.id == *id))
    {
        return Err(Error::msg(
            ErrorType::Request,
            format!("Unknown quiz item '{unknown}'"),
        ));
    }

    let score = items
        .iter()
        .filter(|item| args.answers.get(&item.id) == Some(&item.answer))
        .count();
    let total = items.len();
    let percentage = match total {
        0 => 0,
        _ => ((score * 100) as f64 / total as f64).round() as u32,
    };
    let result = QuizScore {
        score,
        answered: args.answers.len(),
        total,
        percentage,
    };
    Ok(Out::new(
        format!("You got {score} of {total} right ({percentage}%)"),
        result,
    ))
}
