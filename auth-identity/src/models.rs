use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::kind::KindTraits;
use crate::name_format::UserFormat;

/// Account status of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Builtin,
    Active,
    Registered,
    Locked,
}

impl UserStatus {
    /// Numeric code stored by the relational schema
    pub fn code(self) -> u8 {
        match self {
            UserStatus::Builtin => 0,
            UserStatus::Active => 1,
            UserStatus::Registered => 2,
            UserStatus::Locked => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(UserStatus::Builtin),
            1 => Some(UserStatus::Active),
            2 => Some(UserStatus::Registered),
            3 => Some(UserStatus::Locked),
            _ => None,
        }
    }
}

/// Regular account or one of the two built-in sentinels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserKind {
    Regular,
    Anonymous,
    Deleted,
}

/// Which events a user wants to be mailed about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailNotification {
    All,
    Selected,
    OnlyMyEvents,
    OnlyAssigned,
    OnlyOwner,
    None,
}

impl MailNotification {
    /// Options in display order, with their label keys
    pub const OPTIONS: [(MailNotification, &'static str); 6] = [
        (MailNotification::All, "label_user_mail_option_all"),
        (MailNotification::Selected, "label_user_mail_option_selected"),
        (MailNotification::OnlyMyEvents, "label_user_mail_option_only_my_events"),
        (MailNotification::OnlyAssigned, "label_user_mail_option_only_assigned"),
        (MailNotification::OnlyOwner, "label_user_mail_option_only_owner"),
        (MailNotification::None, "label_user_mail_option_none"),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MailNotification::All => "all",
            MailNotification::Selected => "selected",
            MailNotification::OnlyMyEvents => "only_my_events",
            MailNotification::OnlyAssigned => "only_assigned",
            MailNotification::OnlyOwner => "only_owner",
            MailNotification::None => "none",
        }
    }
}

impl FromStr for MailNotification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MailNotification::OPTIONS
            .iter()
            .map(|(option, _)| *option)
            .find(|option| option.as_str() == s)
            .ok_or_else(|| format!("unknown mail notification option: {}", s))
    }
}

impl fmt::Display for MailNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentsSorting {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreference {
    pub comments_sorting: CommentsSorting,
    pub impaired: bool,
    pub hide_mail: bool,
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub kind: UserKind,
    pub login: String,
    pub firstname: String,
    pub lastname: String,
    mail: String,
    pub admin: bool,
    pub status: UserStatus,
    pub language: Option<String>,
    /// Unset until the identity service applies the configured default
    pub mail_notification: Option<MailNotification>,
    #[serde(default, skip_serializing)]
    pub hashed_password: String,
    pub preference: UserPreference,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    pub last_login_on: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(login: &str, firstname: &str, lastname: &str, mail: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind: UserKind::Regular,
            login: login.to_string(),
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
            mail: mail.trim().to_string(),
            admin: false,
            status: UserStatus::Active,
            language: None,
            mail_notification: None,
            hashed_password: String::new(),
            preference: UserPreference::default(),
            created_on: now,
            updated_on: now,
            last_login_on: None,
        }
    }

    /// Unsaved sentinel record of the given kind
    pub fn sentinel(kind: UserKind) -> Self {
        let mut user = Self::new("", "", "", "");
        user.kind = kind;
        user.status = UserStatus::Builtin;
        if kind == UserKind::Anonymous {
            user.lastname = "Anonymous".to_string();
        }
        user
    }

    pub fn traits(&self) -> &'static KindTraits {
        self.kind.traits()
    }

    pub fn is_sentinel(&self) -> bool {
        self.kind != UserKind::Regular
    }

    pub fn is_logged(&self) -> bool {
        self.traits().logged
    }

    pub fn is_anonymous(&self) -> bool {
        !self.is_logged()
    }

    pub fn is_admin(&self) -> bool {
        self.traits().may_be_admin && self.admin
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn is_registered(&self) -> bool {
        self.status == UserStatus::Registered
    }

    pub fn is_locked(&self) -> bool {
        self.status == UserStatus::Locked
    }

    pub fn activate(&mut self) {
        self.status = UserStatus::Active;
    }

    pub fn register(&mut self) {
        self.status = UserStatus::Registered;
    }

    pub fn lock(&mut self) {
        self.status = UserStatus::Locked;
    }

    /// Mail address, hidden for sentinels
    pub fn mail(&self) -> Option<&str> {
        if self.traits().exposes_mail {
            Some(self.mail.as_str())
        } else {
            None
        }
    }

    /// Raw stored mail address, used by validation and uniqueness checks
    pub fn raw_mail(&self) -> &str {
        &self.mail
    }

    pub fn set_mail(&mut self, mail: &str) {
        self.mail = mail.trim().to_string();
    }

    pub fn name(&self, format: UserFormat) -> String {
        match self.traits().display_name {
            Some(name) => name.to_string(),
            None => format.render(self),
        }
    }

    pub fn impaired(&self) -> bool {
        self.is_anonymous() || self.preference.impaired
    }

    pub fn wants_comments_in_reverse_order(&self) -> bool {
        self.preference.comments_sorting == CommentsSorting::Desc
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

/// A named collection of users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub user_ids: BTreeSet<Uuid>,
    pub created_on: DateTime<Utc>,
}

impl Group {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            user_ids: BTreeSet::new(),
            created_on: Utc::now(),
        }
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.user_ids.contains(&user_id)
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Group {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrincipalType {
    Group,
    User,
}

impl PrincipalType {
    pub fn as_str(self) -> &'static str {
        match self {
            PrincipalType::Group => "Group",
            PrincipalType::User => "User",
        }
    }
}

/// A user or group capable of holding permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Principal {
    User(User),
    Group(Group),
}

impl Principal {
    pub fn id(&self) -> Uuid {
        match self {
            Principal::User(user) => user.id,
            Principal::Group(group) => group.id,
        }
    }

    pub fn principal_type(&self) -> PrincipalType {
        match self {
            Principal::User(_) => PrincipalType::User,
            Principal::Group(_) => PrincipalType::Group,
        }
    }

    pub fn name(&self, format: UserFormat) -> String {
        match self {
            Principal::User(user) => user.name(format),
            Principal::Group(group) => group.name.clone(),
        }
    }

    /// Groups count as active
    pub fn is_active(&self) -> bool {
        match self {
            Principal::User(user) => user.is_active(),
            Principal::Group(_) => true,
        }
    }

    pub fn is_active_or_registered(&self) -> bool {
        match self {
            Principal::User(user) => user.is_active() || user.is_registered(),
            Principal::Group(_) => true,
        }
    }

    /// Users before groups, then case-insensitive by display name
    pub fn compare(&self, other: &Principal, format: UserFormat) -> Ordering {
        if self.principal_type() == other.principal_type() {
            self.name(format)
                .to_lowercase()
                .cmp(&other.name(format).to_lowercase())
        } else {
            other.principal_type().cmp(&self.principal_type())
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub login: String,
    pub firstname: String,
    pub lastname: String,
    pub mail: String,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub language: Option<String>,
    /// Raw option name; blank means the configured default
    pub mail_notification: Option<String>,
    pub admin: bool,
    pub status: Option<UserStatus>,
}
