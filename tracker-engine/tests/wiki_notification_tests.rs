//! Wiki content notifications against a mocked mailer

use auth_allowance::{AccessControl, Membership, MembershipRepository, Project, Role};
use auth_identity::{MailNotification, PrincipalRepository, User};
use mockall::mock;
use std::sync::{Arc, Mutex};
use tracker_engine::mailer::Mailer as MailerTrait;
use tracker_engine::{
    MailMessage, Repositories, TrackerConfig, TrackerEngine, TrackerEngineError, TrackerRepository,
    WatchableKey, Wiki, WikiContent, WikiPage,
};

mock! {
    pub Mailer {}

    #[async_trait::async_trait]
    impl MailerTrait for Mailer {
        async fn deliver(&self, message: MailMessage) -> tracker_engine::Result<String>;
    }
}

type Outbox = Arc<Mutex<Vec<String>>>;

fn capturing_mailer(expected: usize) -> (MockMailer, Outbox) {
    let outbox: Outbox = Arc::new(Mutex::new(Vec::new()));
    let sink = outbox.clone();
    let mut mailer = MockMailer::new();
    mailer
        .expect_deliver()
        .times(expected)
        .returning(move |message| {
            sink.lock().unwrap().push(message.to.clone());
            Ok(format!("delivery-{}", message.to))
        });
    (mailer, outbox)
}

struct Site {
    engine: TrackerEngine,
    project: Project,
    reader: Role,
    wiki: Wiki,
    page: WikiPage,
}

impl Site {
    async fn new(mailer: MockMailer, config: TrackerConfig) -> Self {
        let engine = TrackerEngine::new(
            config,
            Repositories::in_memory(),
            AccessControl::tracker_default(),
            Arc::new(mailer),
        );
        let project = engine
            .repositories
            .memberships
            .insert_project(Project::new("Docs", "docs").with_modules(["wiki"]).private())
            .await
            .unwrap();
        let mut reader = Role::new("Reader", 1);
        engine
            .resolver
            .access_control()
            .set_role_permissions(&mut reader, &["view_wiki_pages"]);
        let reader = engine.repositories.memberships.insert_role(reader).await.unwrap();
        let wiki = engine
            .repositories
            .tracker
            .save_wiki(Wiki::new(project.id))
            .await
            .unwrap();
        let page = engine
            .repositories
            .tracker
            .save_wiki_page(WikiPage::new(wiki.id, "Install"))
            .await
            .unwrap();
        Self {
            engine,
            project,
            reader,
            wiki,
            page,
        }
    }

    async fn member(&self, login: &str, preference: MailNotification, notify_all: bool) -> User {
        let mut user = User::new(login, "Test", login, &format!("{}@example.net", login));
        user.mail_notification = Some(preference);
        let user = self.engine.repositories.principals.insert_user(user).await.unwrap();
        let mut membership = Membership::new(user.id, self.project.id, vec![self.reader.id]);
        membership.mail_notification = notify_all;
        self.engine
            .repositories
            .memberships
            .insert_membership(membership)
            .await
            .unwrap();
        user
    }

    /// alice: project flag, bob: `all` preference, carol: watches the wiki,
    /// dan: watches the page, erin: no reason to be notified
    async fn populate(&self) {
        let alice = self.member("alice", MailNotification::OnlyMyEvents, true).await;
        self.member("bob", MailNotification::All, false).await;
        let carol = self.member("carol", MailNotification::OnlyMyEvents, false).await;
        let dan = self.member("dan", MailNotification::OnlyMyEvents, false).await;
        self.member("erin", MailNotification::OnlyMyEvents, false).await;

        let watchers = &self.engine.watchers;
        watchers.add_watcher(alice.id, WatchableKey::wiki(self.wiki.id)).await.unwrap();
        watchers.add_watcher(carol.id, WatchableKey::wiki(self.wiki.id)).await.unwrap();
        watchers.add_watcher(dan.id, WatchableKey::wiki_page(self.page.id)).await.unwrap();
    }

    async fn content(&self) -> WikiContent {
        let author = self.engine.repositories.principals.find_by_login("alice").await.unwrap();
        let author_id = author.map(|u| u.id).unwrap_or_default();
        self.engine
            .repositories
            .tracker
            .save_wiki_content(WikiContent::new(self.page.id, author_id, "h1. Install"))
            .await
            .unwrap()
    }
}

fn sorted(outbox: &Outbox) -> Vec<String> {
    let mut mails = outbox.lock().unwrap().clone();
    mails.sort();
    mails
}

#[tokio::test]
async fn test_added_content_reaches_project_and_wiki_watchers() {
    let (mailer, outbox) = capturing_mailer(3);
    let site = Site::new(mailer, TrackerConfig::default()).await;
    site.populate().await;
    let content = site.content().await;

    let delivered = site.engine.wiki_notifications.after_create(&content).await.unwrap();
    assert_eq!(delivered, 3);
    assert_eq!(
        sorted(&outbox),
        vec!["alice@example.net", "bob@example.net", "carol@example.net"]
    );
}

#[tokio::test]
async fn test_updated_text_also_reaches_page_watchers() {
    let (mailer, outbox) = capturing_mailer(4);
    let site = Site::new(mailer, TrackerConfig::default()).await;
    site.populate().await;
    let before = site.content().await;
    let after = before.revise(before.author_id.unwrap_or_default(), "h1. Installation");

    let delivered = site
        .engine
        .wiki_notifications
        .after_update(&before, &after)
        .await
        .unwrap();
    assert_eq!(delivered, 4);
    assert_eq!(
        sorted(&outbox),
        vec![
            "alice@example.net",
            "bob@example.net",
            "carol@example.net",
            "dan@example.net"
        ]
    );
}

#[tokio::test]
async fn test_unchanged_text_is_not_announced() {
    let (mailer, _) = capturing_mailer(0);
    let site = Site::new(mailer, TrackerConfig::default()).await;
    site.populate().await;
    let before = site.content().await;
    let mut after = before.clone();
    after.comments = "typo".to_string();

    let delivered = site
        .engine
        .wiki_notifications
        .after_update(&before, &after)
        .await
        .unwrap();
    assert_eq!(delivered, 0);
}

#[tokio::test]
async fn test_disabled_event_sends_nothing() {
    let (mailer, _) = capturing_mailer(0);
    let mut config = TrackerConfig::default();
    config.tracker.notified_events = vec!["issue_added".to_string()];
    let site = Site::new(mailer, config).await;
    site.populate().await;
    let content = site.content().await;

    assert_eq!(site.engine.wiki_notifications.after_create(&content).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delivery_failures_are_not_fatal() {
    let mut mailer = MockMailer::new();
    mailer
        .expect_deliver()
        .times(3)
        .returning(|_| Err(TrackerEngineError::DeliveryFailed("smtp down".to_string())));
    let site = Site::new(mailer, TrackerConfig::default()).await;
    site.populate().await;
    let content = site.content().await;

    assert_eq!(site.engine.wiki_notifications.after_create(&content).await.unwrap(), 0);
}
