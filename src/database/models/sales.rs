use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::api::format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum SalesStage {
    Prospect,
    Qualified,
    Negotiation,
    #[serde(rename = "Closed Won")]
    #[sqlx(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    #[sqlx(rename = "Closed Lost")]
    ClosedLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum SalesPriority {
    High,
    Medium,
    Low,
}

impl SalesStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesStage::Prospect => "Prospect",
            SalesStage::Qualified => "Qualified",
            SalesStage::Negotiation => "Negotiation",
            SalesStage::ClosedWon => "Closed Won",
            SalesStage::ClosedLost => "Closed Lost",
        }
    }
}

impl SalesPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesPriority::High => "High",
            SalesPriority::Medium => "Medium",
            SalesPriority::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SalesOpportunity {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub stage: SalesStage,
    pub value: Decimal,
    #[serde(with = "format::date")]
    pub expected_close_date: DateTime<Utc>,
    pub priority: SalesPriority,
    pub created_by: Uuid,
    #[serde(rename = "user")]
    pub owner: Uuid,
    #[serde(with = "format::date")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "format::date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSalesOpportunity {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stage: SalesStage,
    pub value: Decimal,
    #[serde(with = "format::date")]
    pub expected_close_date: DateTime<Utc>,
    pub priority: SalesPriority,
    /// Defaults to the caller when omitted
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SalesOpportunityPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub stage: Option<SalesStage>,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default, with = "format::date_opt")]
    pub expected_close_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<SalesPriority>,
}

impl SalesOpportunity {
    pub fn from_new(owner: Uuid, new: NewSalesOpportunity) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: new.title.trim().to_string(),
            description: new.description.map(|d| d.trim().to_string()),
            stage: new.stage,
            value: new.value,
            expected_close_date: new.expected_close_date,
            priority: new.priority,
            created_by: new.created_by.unwrap_or(owner),
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: SalesOpportunityPatch) {
        if let Some(v) = patch.title {
            self.title = v.trim().to_string();
        }
        if let Some(v) = patch.description {
            self.description = v.map(|d| d.trim().to_string());
        }
        if let Some(v) = patch.stage {
            self.stage = v;
        }
        if let Some(v) = patch.value {
            self.value = v;
        }
        if let Some(v) = patch.expected_close_date {
            self.expected_close_date = v;
        }
        if let Some(v) = patch.priority {
            self.priority = v;
        }
        self.updated_at = Utc::now();
    }
}

/// Fields opportunities can be grouped on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesField {
    Stage,
    Priority,
    Owner,
}

/// Count and value of the caller's opportunities in one stage
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StageSummary {
    pub stage: SalesStage,
    pub count: i64,
    pub total_value: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stages_use_display_names_on_the_wire() {
        let stage: SalesStage = serde_json::from_value(json!("Closed Won")).unwrap();
        assert_eq!(stage, SalesStage::ClosedWon);
        assert_eq!(serde_json::to_value(SalesStage::ClosedLost).unwrap(), json!("Closed Lost"));
        assert_eq!(SalesStage::ClosedWon.as_str(), "Closed Won");
    }

    #[test]
    fn created_by_defaults_to_owner() {
        let new: NewSalesOpportunity = serde_json::from_value(json!({
            "title": "  Renewal  ",
            "stage": "Prospect",
            "value": 1500.5,
            "expectedCloseDate": "2025-09-30",
            "priority": "High"
        }))
        .unwrap();
        let owner = Uuid::new_v4();
        let opp = SalesOpportunity::from_new(owner, new);
        assert_eq!(opp.created_by, owner);
        assert_eq!(opp.title, "Renewal");
        assert_eq!(opp.value, Decimal::new(15005, 1));
    }

    #[test]
    fn missing_stage_is_rejected() {
        let res = serde_json::from_value::<NewSalesOpportunity>(json!({
            "title": "Renewal",
            "value": 10,
            "expectedCloseDate": "2025-09-30",
            "priority": "High"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn description_patch_trims_or_clears() {
        let new: NewSalesOpportunity = serde_json::from_value(json!({
            "title": "Renewal",
            "description": "annual",
            "stage": "Prospect",
            "value": 10,
            "expectedCloseDate": "2025-09-30",
            "priority": "High"
        }))
        .unwrap();
        let mut opp = SalesOpportunity::from_new(Uuid::new_v4(), new);

        opp.apply(serde_json::from_value(json!({ "description": "  multi-year " })).unwrap());
        assert_eq!(opp.description.as_deref(), Some("multi-year"));

        opp.apply(serde_json::from_value(json!({ "stage": "Qualified" })).unwrap());
        assert_eq!(opp.description.as_deref(), Some("multi-year"));

        opp.apply(serde_json::from_value(json!({ "description": null })).unwrap());
        assert_eq!(opp.description, None);
    }
}
