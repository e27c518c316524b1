use uuid::Uuid;

use crate::models::{MailNotification, User};

/// An event a user might be mailed about
///
/// Only issue events carry enough context to be classified; anything else is
/// delivered to users who want everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    Issue {
        author_id: Option<Uuid>,
        assigned_to_id: Option<Uuid>,
    },
    Other,
}

impl NotificationEvent {
    fn is_authored_by(&self, user: &User) -> bool {
        matches!(self, NotificationEvent::Issue { author_id: Some(id), .. } if *id == user.id)
    }

    fn is_assigned_to(&self, user: &User) -> bool {
        matches!(self, NotificationEvent::Issue { assigned_to_id: Some(id), .. } if *id == user.id)
    }
}

/// Should `user` be notified about `event` according to their preference
pub fn notify_about(user: &User, event: &NotificationEvent) -> bool {
    match user.mail_notification {
        Some(MailNotification::All) => true,
        // selected projects are filtered by the caller; own issues always notify
        Some(MailNotification::Selected) | Some(MailNotification::OnlyMyEvents) => {
            event.is_authored_by(user) || event.is_assigned_to(user)
        }
        Some(MailNotification::OnlyAssigned) => event.is_assigned_to(user),
        Some(MailNotification::OnlyOwner) => event.is_authored_by(user),
        Some(MailNotification::None) | None => false,
    }
}

/// Options a user may choose from
///
/// Only users that belong to at least one project can select projects.
pub fn valid_notification_options(membership_count: usize) -> Vec<MailNotification> {
    MailNotification::OPTIONS
        .iter()
        .map(|(option, _)| *option)
        .filter(|option| membership_count > 0 || *option != MailNotification::Selected)
        .collect()
}
