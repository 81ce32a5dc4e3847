use crate::calc::{self, DailyTarget, SavingDuration};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::Amount;
use crate::Result;

/// How much to save per day to reach `target` in `days`.
pub fn daily_target(target: Amount, days: u32) -> Result<Out<DailyTarget>> {
    let result = calc::daily_target(target, days).pub_result(ErrorType::Request)?;
    Ok(Out::new(
        format!(
            "Save {} a day to reach {} in {}",
            result.per_day, result.target, result.timeframe
        ),
        result,
    ))
}

/// How long it takes to reach `target` saving `daily` every day.
pub fn duration(target: Amount, daily: Amount) -> Result<Out<SavingDuration>> {
    let result = calc::duration(target, daily).pub_result(ErrorType::Request)?;
    Ok(Out::new(
        format!(
            "Saving {} a day reaches {} in {}",
            result.daily, result.target, result.text
        ),
        result,
    ))
}
