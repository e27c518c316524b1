use crate::models::UserKind;

/// Behaviour that differs between regular users and the built-in sentinels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindTraits {
    /// Counts as a logged-in user for role resolution
    pub logged: bool,
    /// The admin flag is honoured
    pub may_be_admin: bool,
    /// Fixed display name overriding the configured user format
    pub display_name: Option<&'static str>,
    pub exposes_mail: bool,
    pub destroyable: bool,
    /// Login, names and mail must be present
    pub requires_identity_fields: bool,
    /// Base error reported when a second record of this kind is created
    pub duplicate_message: Option<&'static str>,
}

const REGULAR: KindTraits = KindTraits {
    logged: true,
    may_be_admin: true,
    display_name: None,
    exposes_mail: true,
    destroyable: true,
    requires_identity_fields: true,
    duplicate_message: None,
};

const ANONYMOUS: KindTraits = KindTraits {
    logged: false,
    may_be_admin: false,
    display_name: Some("Anonymous"),
    exposes_mail: false,
    destroyable: false,
    requires_identity_fields: false,
    duplicate_message: Some("An anonymous user already exists."),
};

const DELETED: KindTraits = KindTraits {
    logged: false,
    may_be_admin: false,
    display_name: Some("Deleted user"),
    exposes_mail: false,
    destroyable: false,
    requires_identity_fields: false,
    duplicate_message: Some("A DeletedUser already exists."),
};

impl UserKind {
    pub fn traits(self) -> &'static KindTraits {
        match self {
            UserKind::Regular => &REGULAR,
            UserKind::Anonymous => &ANONYMOUS,
            UserKind::Deleted => &DELETED,
        }
    }

    pub fn is_singleton(self) -> bool {
        self.traits().duplicate_message.is_some()
    }
}
