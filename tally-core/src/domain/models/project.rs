use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{ProjectId, TeamMemberId};

/// How a project charges its client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BillingType {
    Hourly,
    Fixed,
    /// Fixed recurring fee with a monthly hour allotment in `budget_hours`.
    Retainer,
    Internal,
}

/// Billing context for time entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    #[serde(default)]
    pub name: String,
    pub billing_type: BillingType,
    /// Client-facing rate.
    #[serde(default)]
    pub hourly_rate: f64,
    /// Monthly cap, only meaningful for retainer billing.
    #[serde(default)]
    pub budget_hours: f64,
    #[serde(default)]
    pub is_internal: bool,
}

impl Project {
    pub fn new(id: impl Into<ProjectId>, billing_type: BillingType) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            billing_type,
            hourly_rate: 0.0,
            budget_hours: 0.0,
            is_internal: billing_type == BillingType::Internal,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_hourly_rate(mut self, rate: f64) -> Self {
        self.hourly_rate = rate;
        self
    }

    pub fn with_budget_hours(mut self, hours: f64) -> Self {
        self.budget_hours = hours;
        self
    }

    pub fn with_internal(mut self, is_internal: bool) -> Self {
        self.is_internal = is_internal;
        self
    }

    /// Whether time on this project may ever be charged to a client.
    pub fn is_billable_to_client(&self) -> bool {
        !self.is_internal && self.billing_type != BillingType::Internal
    }

    pub fn is_retainer(&self) -> bool {
        self.billing_type == BillingType::Retainer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
}

/// Cost context for time entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: TeamMemberId,
    #[serde(default)]
    pub name: String,
    /// Internal cost rate, distinct from the project's client rate.
    #[serde(default)]
    pub hourly_rate: f64,
    #[serde(default)]
    pub status: MemberStatus,
}

impl TeamMember {
    pub fn new(id: impl Into<TeamMemberId>, hourly_rate: f64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            hourly_rate,
            status: MemberStatus::Active,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_status(mut self, status: MemberStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_projects_are_not_billable_to_client() {
        assert!(!Project::new("p", BillingType::Internal).is_billable_to_client());
        assert!(!Project::new("p", BillingType::Hourly)
            .with_internal(true)
            .is_billable_to_client());
        assert!(Project::new("p", BillingType::Retainer).is_billable_to_client());
    }

    #[test]
    fn billing_type_parses_case_insensitively() {
        assert_eq!("Retainer".parse::<BillingType>().ok(), Some(BillingType::Retainer));
        assert_eq!(BillingType::Fixed.to_string(), "fixed");
    }

    #[test]
    fn project_deserializes_from_camel_case() {
        let json = r#"{"id":"p-1","billingType":"retainer","hourlyRate":120.0,"budgetHours":40}"#;
        let project: Project = serde_json::from_str(json).expect("deserialize project");
        assert!(project.is_retainer());
        assert_eq!(project.budget_hours, 40.0);
        assert!(!project.is_internal);
    }
}
