use serde::{Deserialize, Serialize};

use crate::models::{MailNotification, UserStatus};
use crate::name_format::UserFormat;

/// How accounts created through self-registration are activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfRegistration {
    Disabled,
    /// Activated by following a mailed link
    ByEmail,
    /// Activated by an administrator
    #[default]
    Manual,
    Automatic,
}

impl SelfRegistration {
    /// Status given to a freshly self-registered account, `None` when registration is closed
    pub fn initial_status(self) -> Option<UserStatus> {
        match self {
            SelfRegistration::Disabled => None,
            SelfRegistration::ByEmail | SelfRegistration::Manual => Some(UserStatus::Registered),
            SelfRegistration::Automatic => Some(UserStatus::Active),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub user_format: UserFormat,
    pub default_notification_option: MailNotification,
    pub password_min_length: usize,
    pub self_registration: SelfRegistration,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_format: UserFormat::FirstnameLastname,
            default_notification_option: MailNotification::OnlyMyEvents,
            password_min_length: 4,
            self_registration: SelfRegistration::Manual,
        }
    }
}
