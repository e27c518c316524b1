use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::{Issue, News, Wiki, WikiPage};

/// Record types that can be watched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WatchableType {
    Issue,
    Wiki,
    WikiPage,
    News,
}

/// Identifies one watched record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WatchableKey {
    pub kind: WatchableType,
    pub id: Uuid,
}

impl WatchableKey {
    pub fn new(kind: WatchableType, id: Uuid) -> Self {
        Self { kind, id }
    }

    pub fn issue(id: Uuid) -> Self {
        Self::new(WatchableType::Issue, id)
    }

    pub fn wiki(id: Uuid) -> Self {
        Self::new(WatchableType::Wiki, id)
    }

    pub fn wiki_page(id: Uuid) -> Self {
        Self::new(WatchableType::WikiPage, id)
    }

    pub fn news(id: Uuid) -> Self {
        Self::new(WatchableType::News, id)
    }
}

impl fmt::Display for WatchableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind, self.id)
    }
}

/// A loaded watched record
#[derive(Debug, Clone)]
pub enum WatchTarget {
    Issue(Issue),
    Wiki(Wiki),
    WikiPage { page: WikiPage, wiki: Wiki },
    News(News),
}

impl WatchTarget {
    pub fn key(&self) -> WatchableKey {
        match self {
            WatchTarget::Issue(issue) => WatchableKey::issue(issue.id),
            WatchTarget::Wiki(wiki) => WatchableKey::wiki(wiki.id),
            WatchTarget::WikiPage { page, .. } => WatchableKey::wiki_page(page.id),
            WatchTarget::News(news) => WatchableKey::news(news.id),
        }
    }

    pub fn project_id(&self) -> Uuid {
        match self {
            WatchTarget::Issue(issue) => issue.project_id,
            WatchTarget::Wiki(wiki) => wiki.project_id,
            WatchTarget::WikiPage { wiki, .. } => wiki.project_id,
            WatchTarget::News(news) => news.project_id,
        }
    }

    /// Permission deciding visibility; `None` when the record cannot tell
    pub fn view_permission(&self) -> Option<&'static str> {
        match self {
            WatchTarget::Issue(_) => Some("view_issues"),
            WatchTarget::Wiki(_) | WatchTarget::WikiPage { .. } => Some("view_wiki_pages"),
            WatchTarget::News(_) => None,
        }
    }
}
