use crate::commands::{count, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::Tip;
use crate::rotation::{BagStore, NextTip, Progress, TipRotation};
use crate::{Config, Result};

async fn load_tips(config: &Config) -> Result<Vec<Tip>> {
    config.db().tips().await.pub_result(ErrorType::Database)
}

/// Lists every tip in its stored order.
pub async fn list_tips(config: Config) -> Result<Out<Vec<Tip>>> {
    let tips = load_tips(&config).await?;
    Ok(Out::new(
        format!("Found {}", count(tips.len(), "tip", "tips")),
        tips,
    ))
}

/// Shows the next tip of the rotation kept in `store` under `key`.
///
/// No tip is shown twice before all tips have been shown once. When there are no tips the
/// result carries no tip rather than failing.
pub async fn next_tip<S>(config: Config, store: &S, key: &str) -> Result<Out<NextTip>>
where
    S: BagStore + ?Sized,
{
    let tips = load_tips(&config).await?;
    let next = TipRotation::new(store, key)
        .next(&tips)
        .await
        .pub_result(ErrorType::Database)?;
    let message = match &next.tip {
        Some(tip) => format!(
            "{} ({}/{})",
            tip.text, next.progress.seen, next.progress.total
        ),
        None => "No tips available".to_string(),
    };
    Ok(Out::new(message, next))
}

/// Reports how far through the current cycle the rotation under `key` is, without drawing.
pub async fn tip_progress<S>(config: Config, store: &S, key: &str) -> Result<Out<Progress>>
where
    S: BagStore + ?Sized,
{
    let tips = load_tips(&config).await?;
    let progress = TipRotation::new(store, key)
        .progress(&tips)
        .await
        .pub_result(ErrorType::Database)?;
    Ok(Out::new(
        format!("Seen {} of {} tips", progress.seen, progress.total),
        progress,
    ))
}
