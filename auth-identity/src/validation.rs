use error_common::{ErrorKind, ValidationErrors};
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{Group, MailNotification, User};

pub const LOGIN_MAX_LENGTH: usize = 256;
pub const NAME_MAX_LENGTH: usize = 30;
pub const MAIL_MAX_LENGTH: usize = 60;

lazy_static! {
    static ref LOGIN_REGEX: Regex = Regex::new(r"(?i)^[a-z0-9_\-@.]*$").expect("login pattern compiles");
    static ref MAIL_REGEX: Regex =
        Regex::new(r"(?i)^([^@\s]+)@((?:[-a-z0-9]+\.)+[a-z]{2,})$").expect("mail pattern compiles");
}

/// A clear-text password being set, with its optional confirmation
#[derive(Debug, Clone, Copy)]
pub struct PasswordInput<'a> {
    pub password: &'a str,
    pub confirmation: Option<&'a str>,
}

/// Field-level checks that need no repository access
pub fn validate_user(
    user: &User,
    password: Option<PasswordInput<'_>>,
    password_min_length: usize,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if user.traits().requires_identity_fields {
        for (field, value) in [
            ("login", user.login.as_str()),
            ("firstname", user.firstname.as_str()),
            ("lastname", user.lastname.as_str()),
            ("mail", user.raw_mail()),
        ] {
            if value.trim().is_empty() {
                errors.add(field, ErrorKind::Blank);
            }
        }
    }

    if !LOGIN_REGEX.is_match(&user.login) {
        errors.add("login", ErrorKind::Invalid);
    }
    if user.login.chars().count() > LOGIN_MAX_LENGTH {
        errors.add("login", ErrorKind::TooLong { max: LOGIN_MAX_LENGTH });
    }

    for (field, value) in [("firstname", &user.firstname), ("lastname", &user.lastname)] {
        if value.chars().count() > NAME_MAX_LENGTH {
            errors.add(field, ErrorKind::TooLong { max: NAME_MAX_LENGTH });
        }
    }

    let mail = user.raw_mail();
    if !mail.is_empty() && !MAIL_REGEX.is_match(mail) {
        errors.add("mail", ErrorKind::Invalid);
    }
    if mail.chars().count() > MAIL_MAX_LENGTH {
        errors.add("mail", ErrorKind::TooLong { max: MAIL_MAX_LENGTH });
    }

    if let Some(input) = password {
        if let Some(confirmation) = input.confirmation {
            if confirmation != input.password {
                errors.add("password", ErrorKind::Confirmation);
            }
        }
        if input.password.chars().count() < password_min_length {
            errors.add("password", ErrorKind::TooShort { min: password_min_length });
        }
    }

    errors
}

pub fn validate_group(group: &Group) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if group.name.trim().is_empty() {
        errors.add("name", ErrorKind::Blank);
    }
    if group.name.chars().count() > NAME_MAX_LENGTH {
        errors.add("name", ErrorKind::TooLong { max: NAME_MAX_LENGTH });
    }
    errors
}

/// Parse a submitted notification option; blank means "use the default"
pub fn parse_mail_notification(value: Option<&str>) -> Result<Option<MailNotification>, ValidationErrors> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            let mut errors = ValidationErrors::new();
            errors.add("mail_notification", ErrorKind::Inclusion);
            errors
        }),
    }
}
