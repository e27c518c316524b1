//! User deletion with reassignment, and principal search

use auth_allowance::{Membership, MembershipRepository, Project, Role};
use auth_identity::{Group, IdentityError, Principal, PrincipalRepository, User, UserStatus};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tracker_engine::*;

fn engine_with(batch_size: usize, page_limit: usize) -> TrackerEngine {
    let mut config = TrackerConfig::default();
    config.tracker.user_deletion_batch_size = batch_size;
    config.tracker.principal_search_page_limit = page_limit;
    TrackerEngine::in_memory(config, Arc::new(LoggingMailer::new()))
}

async fn user(engine: &TrackerEngine, login: &str, lastname: &str, status: UserStatus) -> User {
    let mut user = User::new(login, "Test", lastname, &format!("{}@example.org", login));
    user.status = status;
    engine.repositories.principals.insert_user(user).await.unwrap()
}

async fn project(engine: &TrackerEngine) -> Project {
    engine
        .repositories
        .memberships
        .insert_project(Project::new("Alpha", "alpha").with_modules(["issue_tracking", "time_tracking"]))
        .await
        .unwrap()
}

async fn join(engine: &TrackerEngine, principal_id: uuid::Uuid, project: &Project) {
    let mut role = Role::new("Developer", 1);
    engine
        .resolver
        .access_control()
        .set_role_permissions(&mut role, &["view_issues", "log_time"]);
    let role = engine.repositories.memberships.insert_role(role).await.unwrap();
    engine
        .repositories
        .memberships
        .insert_membership(Membership::new(principal_id, project.id, vec![role.id]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_builtin_users_are_not_destroyed() {
    let engine = engine_with(1000, 10);
    let anonymous = engine.identity.anonymous().await.unwrap();
    let deleted = engine.identity.deleted_user().await.unwrap();

    assert!(!engine.user_deletion.destroy(anonymous.id).await.unwrap());
    assert!(!engine.user_deletion.destroy(deleted.id).await.unwrap());
    assert!(engine
        .repositories
        .principals
        .find_user(anonymous.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_unknown_user() {
    let engine = engine_with(1000, 10);
    let result = engine.user_deletion.destroy(uuid::Uuid::new_v4()).await;
    assert!(matches!(
        result,
        Err(TrackerEngineError::Identity(IdentityError::UserNotFound))
    ));
}

#[tokio::test]
async fn test_destroy_reassigns_authored_records() {
    let engine = engine_with(2, 10);
    let tracker = &engine.repositories.tracker;
    let project = project(&engine).await;
    let alice = user(&engine, "alice", "Smith", UserStatus::Active).await;
    let bob = user(&engine, "bob", "Jones", UserStatus::Active).await;
    join(&engine, alice.id, &project).await;

    let mut issue = Issue::new(project.id, alice.id, "Written by alice");
    issue.assigned_to_id = Some(bob.id);
    let issue = tracker.save_issue(issue).await.unwrap();
    let mut for_alice = Issue::new(project.id, bob.id, "Assigned to alice");
    for_alice.assigned_to_id = Some(alice.id);
    let for_alice = tracker.save_issue(for_alice).await.unwrap();
    let news = tracker.save_news(News::new(project.id, alice.id, "Hello")).await.unwrap();
    let wiki = tracker.save_wiki(Wiki::new(project.id)).await.unwrap();
    let page = tracker.save_wiki_page(WikiPage::new(wiki.id, "Home")).await.unwrap();
    let content = tracker
        .save_wiki_content(WikiContent::new(page.id, alice.id, "text"))
        .await
        .unwrap();

    let mut entry = TimeEntry::new();
    entry.project_id = Some(project.id);
    entry.user_id = Some(alice.id);
    entry.set_hours(Some(1.0));
    entry.set_spent_on(NaiveDate::from_ymd_opt(2024, 2, 1));
    let entry = tracker.save_time_entry(entry).await.unwrap();

    for _ in 0..4 {
        tracker
            .insert_journal(Journal::new(issue.id, bob.id).with_change(
                "assigned_to_id",
                json!(bob.id.to_string()),
                json!(alice.id.to_string()),
            ))
            .await
            .unwrap();
    }
    let by_alice = tracker
        .insert_journal(Journal::new(issue.id, alice.id))
        .await
        .unwrap();

    engine
        .watchers
        .add_watcher(alice.id, WatchableKey::issue(issue.id))
        .await
        .unwrap();

    let summary = engine
        .user_deletion
        .destroy_with_summary(alice.id)
        .await
        .unwrap()
        .unwrap();
    let substitute = engine.identity.deleted_user().await.unwrap();

    assert_eq!(summary.rewritten_journals, 4);
    assert_eq!(summary.removed_memberships, 1);
    assert_eq!(summary.removed_watchers, 1);
    // issue, news, wiki content, time entry and one journal
    assert_eq!(summary.reassigned_records, 5);
    assert_eq!(summary.unassigned_issues, 1);

    assert!(engine.repositories.principals.find_user(alice.id).await.unwrap().is_none());
    assert_eq!(tracker.find_issue(issue.id).await.unwrap().unwrap().author_id, substitute.id);
    let for_alice = tracker.find_issue(for_alice.id).await.unwrap().unwrap();
    assert_eq!(for_alice.assigned_to_id, None);
    assert_eq!(for_alice.author_id, bob.id);
    assert_eq!(tracker.find_issue(issue.id).await.unwrap().unwrap().assigned_to_id, Some(bob.id));
    assert_eq!(tracker.find_news(news.id).await.unwrap().unwrap().author_id, substitute.id);
    assert_eq!(
        tracker.find_wiki_content(content.id).await.unwrap().unwrap().author_id,
        Some(substitute.id)
    );
    assert_eq!(
        tracker.find_time_entry(entry.id).await.unwrap().unwrap().user_id,
        Some(substitute.id)
    );

    let journals = tracker.journals_after(0, 100).await.unwrap();
    for journal in &journals {
        if journal.id == by_alice.id {
            assert_eq!(journal.user_id, substitute.id);
        } else {
            assert_eq!(
                journal.changed_data["assigned_to_id"],
                json!([bob.id.to_string(), substitute.id.to_string()])
            );
        }
    }
    assert!(engine
        .repositories
        .memberships
        .memberships_for(alice.id)
        .await
        .unwrap()
        .is_empty());
}

async fn directory(engine: &TrackerEngine) -> Group {
    user(engine, "alice", "Smith", UserStatus::Active).await;
    user(engine, "bob", "Alison", UserStatus::Registered).await;
    user(engine, "carol", "Smith", UserStatus::Locked).await;
    engine.identity.anonymous().await.unwrap();
    engine.identity.create_group("Developers").await.unwrap()
}

fn names(principals: &[Principal]) -> Vec<String> {
    principals
        .iter()
        .map(|p| match p {
            Principal::User(user) => user.login.clone(),
            Principal::Group(group) => group.name.clone(),
        })
        .collect()
}

#[tokio::test]
async fn test_search_lists_groups_then_users() {
    let engine = engine_with(1000, 10);
    directory(&engine).await;

    let all = engine.principal_search.search("").await.unwrap();
    assert_eq!(names(&all), vec!["Developers", "alice", "bob"]);

    let ali = engine.principal_search.search("ALI").await.unwrap();
    assert_eq!(names(&ali), vec!["alice", "bob"]);

    let smiths = engine.principal_search.search("smith").await.unwrap();
    assert_eq!(names(&smiths), vec!["alice"]);

    let devs = engine.principal_search.search("dev").await.unwrap();
    assert_eq!(names(&devs), vec!["Developers"]);

    let by_mail = engine.principal_search.search("bob@example").await.unwrap();
    assert_eq!(names(&by_mail), vec!["bob"]);
}

#[tokio::test]
async fn test_search_without_project_and_paging() {
    let engine = engine_with(1000, 2);
    let group = directory(&engine).await;
    let project = project(&engine).await;
    join(&engine, group.id, &project).await;

    let outside = engine
        .principal_search
        .search_without_project("", project.id)
        .await
        .unwrap();
    assert_eq!(names(&outside), vec!["alice", "bob"]);

    let limited = engine.principal_search.possible_members("", 1).await.unwrap();
    assert_eq!(names(&limited), vec!["Developers"]);

    let first = engine.principal_search.paginate("", None, 1).await.unwrap();
    assert_eq!(names(&first.items), vec!["Developers", "alice"]);
    assert_eq!(first.total, 3);
    assert_eq!(first.total_pages, 2);

    let second = engine.principal_search.paginate("", None, 2).await.unwrap();
    assert_eq!(names(&second.items), vec!["bob"]);

    let scoped = engine
        .principal_search
        .paginate("", Some(project.id), 1)
        .await
        .unwrap();
    assert_eq!(scoped.total, 2);
}
