use serde::{Deserialize, Serialize};

use crate::models::User;

/// A user attribute that can appear in a display name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    Firstname,
    Lastname,
    Login,
}

impl NameField {
    fn value(self, user: &User) -> &str {
        match self {
            NameField::Firstname => &user.firstname,
            NameField::Lastname => &user.lastname,
            NameField::Login => &user.login,
        }
    }
}

/// How user names are displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserFormat {
    #[default]
    FirstnameLastname,
    Firstname,
    LastnameFirstname,
    LastnameComaFirstname,
    Username,
}

impl UserFormat {
    pub const ALL: [UserFormat; 5] = [
        UserFormat::FirstnameLastname,
        UserFormat::Firstname,
        UserFormat::LastnameFirstname,
        UserFormat::LastnameComaFirstname,
        UserFormat::Username,
    ];

    /// Ordered fields and the delimiter joining them
    pub fn structure(self) -> (&'static [NameField], &'static str) {
        match self {
            UserFormat::FirstnameLastname => (&[NameField::Firstname, NameField::Lastname], " "),
            UserFormat::Firstname => (&[NameField::Firstname], " "),
            UserFormat::LastnameFirstname => (&[NameField::Lastname, NameField::Firstname], " "),
            UserFormat::LastnameComaFirstname => (&[NameField::Lastname, NameField::Firstname], ", "),
            UserFormat::Username => (&[NameField::Login], " "),
        }
    }

    pub fn render(self, user: &User) -> String {
        let (fields, delimiter) = self.structure();
        fields
            .iter()
            .map(|field| field.value(user))
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}
