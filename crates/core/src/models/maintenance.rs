use super::AssetCondition;
use chrono::{DateTime, NaiveDate, Utc};
use rentdesk_types::NonEmptyText;
use rentdesk_uuid::RecordId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    /// Open and in-progress requests are still being worked on.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }

    /// Allowed transitions:
    /// `open → in_progress | completed | cancelled`, `in_progress → completed | cancelled`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::InProgress)
                | (Self::Open, Self::Completed)
                | (Self::Open, Self::Cancelled)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Cancelled)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceRequest {
    pub id: RecordId,
    pub rental_unit_id: RecordId,
    pub asset_id: Option<RecordId>,
    pub tenant_id: Option<RecordId>,
    pub title: NonEmptyText,
    pub description: NonEmptyText,
    pub priority: Priority,
    pub status: MaintenanceStatus,
    /// While open, the unit is held in `under_maintenance` and cannot be let.
    pub blocks_occupancy: bool,
    pub cost: Option<Decimal>,
    /// Asset condition before this request put it under maintenance; restored on cancel.
    pub asset_prior_condition: Option<AssetCondition>,
    pub reported_on: NaiveDate,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MaintenanceInput {
    pub rental_unit_id: RecordId,
    #[serde(default)]
    pub asset_id: Option<RecordId>,
    #[serde(default)]
    pub tenant_id: Option<RecordId>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub blocks_occupancy: bool,
    #[serde(default)]
    pub reported_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct MaintenanceChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub cost: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StatusChange {
    pub status: MaintenanceStatus,
    #[serde(default)]
    pub cost: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MaintenanceFilter {
    pub rental_unit_id: Option<RecordId>,
    pub asset_id: Option<RecordId>,
    pub status: Option<MaintenanceStatus>,
    pub priority: Option<Priority>,
}

impl MaintenanceFilter {
    pub fn matches(&self, request: &MaintenanceRequest) -> bool {
        self.rental_unit_id
            .map_or(true, |id| request.rental_unit_id == id)
            && self.asset_id.map_or(true, |id| request.asset_id == Some(id))
            && self.status.map_or(true, |s| request.status == s)
            && self.priority.map_or(true, |p| request.priority == p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MaintenanceStatus::*;

    #[test]
    fn closed_statuses_are_terminal() {
        for next in [Open, InProgress, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn work_can_start_finish_or_be_cancelled() {
        assert!(Open.can_transition_to(InProgress));
        assert!(Open.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));
        assert!(!InProgress.can_transition_to(Open));
        assert!(!Open.can_transition_to(Open));
    }
}
