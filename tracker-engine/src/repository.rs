use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Result, TrackerEngineError};
use crate::models::{Issue, Journal, News, TimeEntryActivity, Wiki, WikiContent, WikiPage};
use crate::time_entry::TimeEntry;
use crate::watchables::{WatchTarget, WatchableKey, WatchableType};
use crate::watcher::Watcher;

/// Storage for the tracker records the engine works on
#[async_trait]
pub trait TrackerRepository: Send + Sync {
    async fn save_issue(&self, issue: Issue) -> Result<Issue>;
    async fn find_issue(&self, id: Uuid) -> Result<Option<Issue>>;
    async fn list_issues(&self) -> Result<Vec<Issue>>;
    async fn delete_issue(&self, id: Uuid) -> Result<()>;

    async fn save_wiki(&self, wiki: Wiki) -> Result<Wiki>;
    async fn find_wiki(&self, id: Uuid) -> Result<Option<Wiki>>;
    async fn save_wiki_page(&self, page: WikiPage) -> Result<WikiPage>;
    async fn find_wiki_page(&self, id: Uuid) -> Result<Option<WikiPage>>;
    async fn save_wiki_content(&self, content: WikiContent) -> Result<WikiContent>;
    async fn find_wiki_content(&self, id: Uuid) -> Result<Option<WikiContent>>;

    async fn save_news(&self, news: News) -> Result<News>;
    async fn find_news(&self, id: Uuid) -> Result<Option<News>>;

    /// Stores the journal under the next id
    async fn insert_journal(&self, journal: Journal) -> Result<Journal>;
    async fn update_journal(&self, journal: Journal) -> Result<Journal>;
    /// Journals with an id above `after_id`, ascending, at most `limit`
    async fn journals_after(&self, after_id: u64, limit: usize) -> Result<Vec<Journal>>;

    async fn save_activity(&self, activity: TimeEntryActivity) -> Result<TimeEntryActivity>;
    async fn find_activity(&self, id: Uuid) -> Result<Option<TimeEntryActivity>>;
    /// Ordered by position
    async fn list_activities(&self) -> Result<Vec<TimeEntryActivity>>;

    /// Recomputes the entry's derived date fields, then stores it
    async fn save_time_entry(&self, entry: TimeEntry) -> Result<TimeEntry>;
    async fn find_time_entry(&self, id: Uuid) -> Result<Option<TimeEntry>>;
    async fn list_time_entries(&self) -> Result<Vec<TimeEntry>>;
    async fn delete_time_entry(&self, id: Uuid) -> Result<()>;

    /// Points records authored or logged by `from` at `to`
    async fn reassign_user(&self, from: Uuid, to: Uuid) -> Result<usize>;
    /// Clears the assignee of issues assigned to `user_id`
    async fn unassign_user(&self, user_id: Uuid) -> Result<usize>;

    async fn default_activity(&self) -> Result<Option<TimeEntryActivity>> {
        Ok(self
            .list_activities()
            .await?
            .into_iter()
            .find(|a| a.active && a.is_default))
    }

    async fn find_watch_target(&self, key: WatchableKey) -> Result<Option<WatchTarget>> {
        Ok(match key.kind {
            WatchableType::Issue => self.find_issue(key.id).await?.map(WatchTarget::Issue),
            WatchableType::Wiki => self.find_wiki(key.id).await?.map(WatchTarget::Wiki),
            WatchableType::WikiPage => match self.find_wiki_page(key.id).await? {
                Some(page) => self
                    .find_wiki(page.wiki_id)
                    .await?
                    .map(|wiki| WatchTarget::WikiPage { page, wiki }),
                None => None,
            },
            WatchableType::News => self.find_news(key.id).await?.map(WatchTarget::News),
        })
    }
}

/// Storage for watchers
#[async_trait]
pub trait WatcherRepository: Send + Sync {
    async fn insert(&self, watcher: Watcher) -> Result<Watcher>;
    /// `false` when nothing was stored under `id`
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn find(&self, user_id: Uuid, key: WatchableKey) -> Result<Option<Watcher>>;
    async fn for_user(&self, user_id: Uuid) -> Result<Vec<Watcher>>;
    async fn for_watchable(&self, key: WatchableKey) -> Result<Vec<Watcher>>;
    /// Distinct ids of users watching anything
    async fn user_ids(&self) -> Result<Vec<Uuid>>;
    async fn remove_for_user(&self, user_id: Uuid) -> Result<usize>;
}

pub struct InMemoryTrackerRepository {
    issues: Arc<DashMap<Uuid, Issue>>,
    wikis: Arc<DashMap<Uuid, Wiki>>,
    wiki_pages: Arc<DashMap<Uuid, WikiPage>>,
    wiki_contents: Arc<DashMap<Uuid, WikiContent>>,
    news: Arc<DashMap<Uuid, News>>,
    journals: Arc<DashMap<u64, Journal>>,
    activities: Arc<DashMap<Uuid, TimeEntryActivity>>,
    time_entries: Arc<DashMap<Uuid, TimeEntry>>,
    next_journal_id: AtomicU64,
}

impl InMemoryTrackerRepository {
    pub fn new() -> Self {
        Self {
            issues: Arc::new(DashMap::new()),
            wikis: Arc::new(DashMap::new()),
            wiki_pages: Arc::new(DashMap::new()),
            wiki_contents: Arc::new(DashMap::new()),
            news: Arc::new(DashMap::new()),
            journals: Arc::new(DashMap::new()),
            activities: Arc::new(DashMap::new()),
            time_entries: Arc::new(DashMap::new()),
            next_journal_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryTrackerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackerRepository for InMemoryTrackerRepository {
    async fn save_issue(&self, issue: Issue) -> Result<Issue> {
        self.issues.insert(issue.id, issue.clone());
        Ok(issue)
    }

    async fn find_issue(&self, id: Uuid) -> Result<Option<Issue>> {
        Ok(self.issues.get(&id).map(|e| e.value().clone()))
    }

    async fn list_issues(&self) -> Result<Vec<Issue>> {
        Ok(self.issues.iter().map(|e| e.value().clone()).collect())
    }

    async fn delete_issue(&self, id: Uuid) -> Result<()> {
        self.issues.remove(&id);
        Ok(())
    }

    async fn save_wiki(&self, wiki: Wiki) -> Result<Wiki> {
        self.wikis.insert(wiki.id, wiki.clone());
        Ok(wiki)
    }

    async fn find_wiki(&self, id: Uuid) -> Result<Option<Wiki>> {
        Ok(self.wikis.get(&id).map(|e| e.value().clone()))
    }

    async fn save_wiki_page(&self, page: WikiPage) -> Result<WikiPage> {
        self.wiki_pages.insert(page.id, page.clone());
        Ok(page)
    }

    async fn find_wiki_page(&self, id: Uuid) -> Result<Option<WikiPage>> {
        Ok(self.wiki_pages.get(&id).map(|e| e.value().clone()))
    }

    async fn save_wiki_content(&self, content: WikiContent) -> Result<WikiContent> {
        self.wiki_contents.insert(content.id, content.clone());
        Ok(content)
    }

    async fn find_wiki_content(&self, id: Uuid) -> Result<Option<WikiContent>> {
        Ok(self.wiki_contents.get(&id).map(|e| e.value().clone()))
    }

    async fn save_news(&self, news: News) -> Result<News> {
        self.news.insert(news.id, news.clone());
        Ok(news)
    }

    async fn find_news(&self, id: Uuid) -> Result<Option<News>> {
        Ok(self.news.get(&id).map(|e| e.value().clone()))
    }

    async fn insert_journal(&self, mut journal: Journal) -> Result<Journal> {
        journal.id = self.next_journal_id.fetch_add(1, Ordering::SeqCst);
        self.journals.insert(journal.id, journal.clone());
        Ok(journal)
    }

    async fn update_journal(&self, journal: Journal) -> Result<Journal> {
        match self.journals.get_mut(&journal.id) {
            Some(mut stored) => {
                *stored = journal.clone();
                Ok(journal)
            }
            None => Err(TrackerEngineError::NotFound(format!("journal {}", journal.id))),
        }
    }

    async fn journals_after(&self, after_id: u64, limit: usize) -> Result<Vec<Journal>> {
        let mut journals: Vec<Journal> = self
            .journals
            .iter()
            .filter(|e| *e.key() > after_id)
            .map(|e| e.value().clone())
            .collect();
        journals.sort_by_key(|j| j.id);
        journals.truncate(limit);
        Ok(journals)
    }

    async fn save_activity(&self, activity: TimeEntryActivity) -> Result<TimeEntryActivity> {
        if activity.is_default {
            for mut other in self.activities.iter_mut() {
                if other.id != activity.id {
                    other.is_default = false;
                }
            }
        }
        self.activities.insert(activity.id, activity.clone());
        Ok(activity)
    }

    async fn find_activity(&self, id: Uuid) -> Result<Option<TimeEntryActivity>> {
        Ok(self.activities.get(&id).map(|e| e.value().clone()))
    }

    async fn list_activities(&self) -> Result<Vec<TimeEntryActivity>> {
        let mut activities: Vec<TimeEntryActivity> =
            self.activities.iter().map(|e| e.value().clone()).collect();
        activities.sort_by_key(|a| a.position);
        Ok(activities)
    }

    async fn save_time_entry(&self, mut entry: TimeEntry) -> Result<TimeEntry> {
        entry.recompute_derived_fields();
        entry.updated_on = chrono::Utc::now();
        self.time_entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn find_time_entry(&self, id: Uuid) -> Result<Option<TimeEntry>> {
        Ok(self.time_entries.get(&id).map(|e| e.value().clone()))
    }

    async fn list_time_entries(&self) -> Result<Vec<TimeEntry>> {
        Ok(self.time_entries.iter().map(|e| e.value().clone()).collect())
    }

    async fn delete_time_entry(&self, id: Uuid) -> Result<()> {
        self.time_entries.remove(&id);
        Ok(())
    }

    async fn reassign_user(&self, from: Uuid, to: Uuid) -> Result<usize> {
        let mut changed = 0;
        for mut issue in self.issues.iter_mut() {
            if issue.author_id == from {
                issue.author_id = to;
                changed += 1;
            }
        }
        for mut content in self.wiki_contents.iter_mut() {
            if content.author_id == Some(from) {
                content.author_id = Some(to);
                changed += 1;
            }
        }
        for mut news in self.news.iter_mut() {
            if news.author_id == from {
                news.author_id = to;
                changed += 1;
            }
        }
        for mut entry in self.time_entries.iter_mut() {
            if entry.user_id == Some(from) {
                entry.user_id = Some(to);
                changed += 1;
            }
        }
        for mut journal in self.journals.iter_mut() {
            if journal.user_id == from {
                journal.user_id = to;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn unassign_user(&self, user_id: Uuid) -> Result<usize> {
        let mut cleared = 0;
        for mut issue in self.issues.iter_mut() {
            if issue.assigned_to_id == Some(user_id) {
                issue.assigned_to_id = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

pub struct InMemoryWatcherRepository {
    watchers: Arc<DashMap<Uuid, Watcher>>,
}

impl InMemoryWatcherRepository {
    pub fn new() -> Self {
        Self {
            watchers: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryWatcherRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WatcherRepository for InMemoryWatcherRepository {
    async fn insert(&self, watcher: Watcher) -> Result<Watcher> {
        let duplicate = self
            .watchers
            .iter()
            .any(|e| e.value().user_id == watcher.user_id && e.value().watchable == watcher.watchable);
        if duplicate {
            return Err(TrackerEngineError::RepositoryError(format!(
                "user {} already watches {}",
                watcher.user_id, watcher.watchable
            )));
        }
        self.watchers.insert(watcher.id, watcher.clone());
        Ok(watcher)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.watchers.remove(&id).is_some())
    }

    async fn find(&self, user_id: Uuid, key: WatchableKey) -> Result<Option<Watcher>> {
        Ok(self
            .watchers
            .iter()
            .find(|e| e.value().user_id == user_id && e.value().watchable == key)
            .map(|e| e.value().clone()))
    }

    async fn for_user(&self, user_id: Uuid) -> Result<Vec<Watcher>> {
        let mut watchers: Vec<Watcher> = self
            .watchers
            .iter()
            .filter(|e| e.value().user_id == user_id)
            .map(|e| e.value().clone())
            .collect();
        watchers.sort_by_key(|w| w.created_on);
        Ok(watchers)
    }

    async fn for_watchable(&self, key: WatchableKey) -> Result<Vec<Watcher>> {
        let mut watchers: Vec<Watcher> = self
            .watchers
            .iter()
            .filter(|e| e.value().watchable == key)
            .map(|e| e.value().clone())
            .collect();
        watchers.sort_by_key(|w| w.created_on);
        Ok(watchers)
    }

    async fn user_ids(&self) -> Result<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self.watchers.iter().map(|e| e.value().user_id).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn remove_for_user(&self, user_id: Uuid) -> Result<usize> {
        let before = self.watchers.len();
        self.watchers.retain(|_, w| w.user_id != user_id);
        Ok(before - self.watchers.len())
    }
}
