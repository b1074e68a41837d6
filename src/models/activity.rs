use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Sightseeing,
    Food,
    Adventure,
    Culture,
    Nightlife,
    Shopping,
    Nature,
    Sports,
    Relaxation,
    Other,
}

/// Catalog entry a traveler can pick from. Read-only reference data.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ActivityOption {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: Option<String>,
    pub category: ActivityCategory,
    pub cost: f64,
    pub duration_hours: f64,
    pub city_id: Option<ObjectId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Activity attached to a stop. Name, category, cost and duration are
/// copied from the catalog entry when the activity is added, so later
/// catalog edits do not change what a trip was priced against.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StopActivity {
    pub id: ObjectId,
    pub activity_id: ObjectId,
    pub name: String,
    pub category: ActivityCategory,
    pub cost: f64,
    pub duration_hours: f64,
}

impl StopActivity {
    pub fn from_option(option: &ActivityOption) -> Self {
        StopActivity {
            id: ObjectId::new(),
            activity_id: option.id.unwrap_or_else(ObjectId::new),
            name: option.name.clone(),
            category: option.category,
            cost: option.cost,
            duration_hours: option.duration_hours,
        }
    }
}
