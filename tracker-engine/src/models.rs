use auth_identity::NotificationEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: Uuid,
    pub project_id: Uuid,
    pub subject: String,
    pub tracker: String,
    pub priority: String,
    pub category_id: Option<Uuid>,
    pub fixed_version_id: Option<Uuid>,
    pub author_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub created_on: DateTime<Utc>,
}

impl Issue {
    pub fn new(project_id: Uuid, author_id: Uuid, subject: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            subject: subject.to_string(),
            tracker: "Bug".to_string(),
            priority: "Normal".to_string(),
            category_id: None,
            fixed_version_id: None,
            author_id,
            assigned_to_id: None,
            created_on: Utc::now(),
        }
    }

    pub fn notification_event(&self) -> NotificationEvent {
        NotificationEvent::Issue {
            author_id: Some(self.author_id),
            assigned_to_id: self.assigned_to_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wiki {
    pub id: Uuid,
    pub project_id: Uuid,
    pub start_page: String,
}

impl Wiki {
    pub fn new(project_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            start_page: "Wiki".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiPage {
    pub id: Uuid,
    pub wiki_id: Uuid,
    pub title: String,
    pub protected: bool,
}

impl WikiPage {
    pub fn new(wiki_id: Uuid, title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            wiki_id,
            title: title.to_string(),
            protected: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiContent {
    pub id: Uuid,
    pub page_id: Uuid,
    pub author_id: Option<Uuid>,
    pub text: String,
    pub comments: String,
    pub version: u32,
    pub updated_on: DateTime<Utc>,
}

impl WikiContent {
    pub fn new(page_id: Uuid, author_id: Uuid, text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            page_id,
            author_id: Some(author_id),
            text: text.to_string(),
            comments: String::new(),
            version: 1,
            updated_on: Utc::now(),
        }
    }

    /// Next version with new text
    pub fn revise(&self, author_id: Uuid, text: &str) -> Self {
        Self {
            author_id: Some(author_id),
            text: text.to_string(),
            version: self.version + 1,
            updated_on: Utc::now(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct News {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub author_id: Uuid,
}

impl News {
    pub fn new(project_id: Uuid, author_id: Uuid, title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            title: title.to_string(),
            author_id,
        }
    }
}

/// A recorded change; `changed_data` maps attribute names to `[old, new]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    /// Monotonic, assigned by the repository
    pub id: u64,
    pub journaled_id: Uuid,
    pub user_id: Uuid,
    pub notes: String,
    pub changed_data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Journal {
    pub fn new(journaled_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: 0,
            journaled_id,
            user_id,
            notes: String::new(),
            changed_data: Map::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_change(mut self, attribute: &str, old: Value, new: Value) -> Self {
        self.changed_data
            .insert(attribute.to_string(), Value::Array(vec![old, new]));
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryActivity {
    pub id: Uuid,
    pub name: String,
    pub position: u32,
    pub is_default: bool,
    pub active: bool,
}

impl TimeEntryActivity {
    pub fn new(name: &str, position: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            position,
            is_default: false,
            active: true,
        }
    }
}
