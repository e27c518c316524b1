use auth_allowance::{Action, AllowanceOptions, MembershipRepository, PermissionResolver, Project};
use auth_identity::{MailNotification, PrincipalRepository};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{TrackerSettings, WIKI_CONTENT_ADDED, WIKI_CONTENT_UPDATED};
use crate::error::{Result, TrackerEngineError};
use crate::mailer::{MailMessage, Mailer};
use crate::models::{Wiki, WikiContent, WikiPage};
use crate::repository::TrackerRepository;
use crate::watchables::WatchableKey;
use crate::watcher::WatcherService;

/// Mails wiki changes to the project and to watchers
pub struct WikiContentObserver {
    tracker: Arc<dyn TrackerRepository>,
    watchers: Arc<WatcherService>,
    resolver: Arc<PermissionResolver>,
    mailer: Arc<dyn Mailer>,
    settings: TrackerSettings,
}

struct PageContext {
    page: WikiPage,
    wiki: Wiki,
    project: Project,
}

impl WikiContentObserver {
    pub fn new(
        tracker: Arc<dyn TrackerRepository>,
        watchers: Arc<WatcherService>,
        resolver: Arc<PermissionResolver>,
        mailer: Arc<dyn Mailer>,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            tracker,
            watchers,
            resolver,
            mailer,
            settings,
        }
    }

    /// Returns the number of messages handed to the mailer
    pub async fn after_create(&self, content: &WikiContent) -> Result<usize> {
        if !self.settings.notifies(WIKI_CONTENT_ADDED) {
            return Ok(0);
        }
        let context = self.page_context(content).await?;
        let mut mails = self.project_recipients(&context.project).await?;
        mails.extend(self.watchers.watcher_recipients(WatchableKey::wiki(context.wiki.id)).await?);

        let subject = format!("[{}] Wiki: {}", context.project.name, context.page.title);
        let body = format!("The '{}' wiki page has been added.", context.page.title);
        self.deliver_all(mails, &subject, &body).await
    }

    /// Only text changes are announced
    pub async fn after_update(&self, before: &WikiContent, after: &WikiContent) -> Result<usize> {
        if before.text == after.text || !self.settings.notifies(WIKI_CONTENT_UPDATED) {
            return Ok(0);
        }
        let context = self.page_context(after).await?;
        let mut mails = self.project_recipients(&context.project).await?;
        mails.extend(self.watchers.watcher_recipients(WatchableKey::wiki(context.wiki.id)).await?);
        mails.extend(
            self.watchers
                .watcher_recipients(WatchableKey::wiki_page(context.page.id))
                .await?,
        );

        let subject = format!("[{}] Wiki: {}", context.project.name, context.page.title);
        let mut body = format!(
            "The '{}' wiki page has been updated to version {}.",
            context.page.title, after.version
        );
        if !after.comments.is_empty() {
            body.push_str(&format!("\n\n{}", after.comments));
        }
        self.deliver_all(mails, &subject, &body).await
    }

    async fn page_context(&self, content: &WikiContent) -> Result<PageContext> {
        let page = self
            .tracker
            .find_wiki_page(content.page_id)
            .await?
            .ok_or_else(|| TrackerEngineError::NotFound(format!("wiki page {}", content.page_id)))?;
        let wiki = self
            .tracker
            .find_wiki(page.wiki_id)
            .await?
            .ok_or_else(|| TrackerEngineError::NotFound(format!("wiki {}", page.wiki_id)))?;
        let project = self
            .resolver
            .memberships()
            .find_project(wiki.project_id)
            .await?
            .ok_or_else(|| TrackerEngineError::NotFound(format!("project {}", wiki.project_id)))?;
        Ok(PageContext { page, wiki, project })
    }

    /// Mails of members notified about everything who can read the wiki
    async fn project_recipients(&self, project: &Project) -> Result<Vec<String>> {
        let principals = self.resolver.principals();
        let view = Action::permission("view_wiki_pages");
        let mut mails = Vec::new();

        for membership in self.resolver.memberships().memberships_of_project(project.id).await? {
            let user = match principals.find_user(membership.principal_id).await? {
                Some(user) if user.is_active() => user,
                _ => continue,
            };
            let wants_all = membership.mail_notification
                || user.mail_notification == Some(MailNotification::All);
            if !wants_all {
                continue;
            }
            let can_read = self
                .resolver
                .try_allowed_to_in_project(&user, &view, project, &AllowanceOptions::default())
                .await?;
            if let (true, Some(mail)) = (can_read, user.mail()) {
                mails.push(mail.to_string());
            }
        }
        Ok(mails)
    }

    async fn deliver_all(&self, mails: Vec<String>, subject: &str, body: &str) -> Result<usize> {
        let unique: Vec<String> = mails
            .into_iter()
            .map(|m| m.to_lowercase())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let users = self.resolver.principals().find_all_by_mails(&unique).await?;

        let mut delivered = 0;
        for user in users {
            let to = match user.mail() {
                Some(mail) => mail.to_string(),
                None => continue,
            };
            match self.mailer.deliver(MailMessage::new(&to, subject, body)).await {
                Ok(_) => delivered += 1,
                Err(error) => warn!(user_id = %user.id, %error, "Wiki notification not delivered"),
            }
        }
        debug!(recipients = unique.len(), delivered, "Wiki notifications sent");
        Ok(delivered)
    }
}
