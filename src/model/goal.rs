use crate::model::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Active,
    Purchased,
    Archived,
}

serde_plain::derive_display_from_serialize!(GoalStatus);
serde_plain::derive_fromstr_from_deserialize!(GoalStatus);

/// A savings goal: an item the user is saving towards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub item_name: String,
    pub target_price: Amount,
    pub saved_amount: Amount,
    pub status: GoalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchased_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(
        user_id: impl Into<String>,
        item_name: impl Into<String>,
        target_price: Amount,
        saved_amount: Amount,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::utils::generate_id(),
            user_id: user_id.into(),
            item_name: item_name.into(),
            target_price,
            saved_amount,
            status: GoalStatus::Active,
            purchase_price: None,
            purchased_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// How far along the goal is. A zero target counts as nothing saved, and a ratio too large
    /// for `Decimal` counts as fully funded.
    pub fn progress(&self) -> GoalProgress {
        let target = self.target_price.value();
        let ratio = if target.is_zero() {
            Some(Decimal::ZERO)
        } else {
            self.saved_amount.value().checked_div(target)
        };
        let percent = ratio
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(Decimal::ONE_HUNDRED, |p| p.round())
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
            .to_u8()
            .unwrap_or_default();
        GoalProgress {
            percent,
            remaining: self.target_price.saturating_sub(self.saved_amount),
            fully_funded: !target.is_zero() && ratio.map_or(true, |r| r >= Decimal::ONE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    /// Whole percent saved, 0 to 100.
    pub percent: u8,
    pub remaining: Amount,
    pub fully_funded: bool,
}

/// A goal together with its computed progress, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub progress: GoalProgress,
}

impl From<Goal> for GoalView {
    fn from(goal: Goal) -> Self {
        let progress = goal.progress();
        Self { goal, progress }
    }
}

/// The editable fields of a goal. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalPatch {
    pub item_name: Option<String>,
    pub target_price: Option<Amount>,
    pub saved_amount: Option<Amount>,
    pub status: Option<GoalStatus>,
}

impl GoalPatch {
    pub(crate) fn apply(self, goal: &mut Goal) {
        if let Some(item_name) = self.item_name {
            goal.item_name = item_name;
        }
        if let Some(target_price) = self.target_price {
            goal.target_price = target_price;
        }
        if let Some(saved_amount) = self.saved_amount {
            goal.saved_amount = saved_amount;
        }
        if let Some(status) = self.status {
            goal.status = status;
        }
        goal.updated_at = Utc::now();
    }
}
