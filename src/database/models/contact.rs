use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::api::format;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub notes: Option<String>,
    #[serde(rename = "user")]
    pub owner: Uuid,
    #[serde(with = "format::date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContactPatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub notes: Option<Option<String>>,
}

impl Contact {
    pub fn from_new(owner: Uuid, new: NewContact) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            company: new.company,
            notes: new.notes,
            owner,
            updated_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, patch: ContactPatch) {
        if let Some(v) = patch.first_name {
            self.first_name = v;
        }
        if let Some(v) = patch.last_name {
            self.last_name = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
        if let Some(v) = patch.phone {
            self.phone = v;
        }
        if let Some(v) = patch.company {
            self.company = v;
        }
        if let Some(v) = patch.notes {
            self.notes = v;
        }
        self.updated_at = Utc::now();
    }
}

/// Projection used by the recent-activity feed
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactActivity {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "format::date_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Contact> for ContactActivity {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id,
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            company: contact.company.clone(),
            notes: contact.notes.clone(),
            updated_at: Some(contact.updated_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactBrief {
    pub first_name: String,
    pub last_name: String,
    pub notes: Option<String>,
}

/// Contacts of one company, as listed on the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct CompanySummary {
    pub company: Option<String>,
    pub count: i64,
    pub contacts: Vec<ContactBrief>,
}
