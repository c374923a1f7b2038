use serde::{Deserialize, Serialize};

pub const GUEST_EMAIL: &str = "Guest";
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Verified identity handed over by the external identity provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl Identity {
    pub fn is_moderator(&self, moderator_name: &str) -> bool {
        self.name.as_deref() == Some(moderator_name)
    }
}

/// Authorship stamped onto a comment when it is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub email: String,
    pub display_name: String,
}

impl Author {
    pub fn guest() -> Self {
        Self {
            email: GUEST_EMAIL.to_string(),
            display_name: ANONYMOUS_NAME.to_string(),
        }
    }

    /// Each field falls back to its sentinel on its own.
    pub fn from_identity(identity: Option<&Identity>) -> Self {
        let pick = |value: Option<&String>, fallback: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| fallback.to_string())
        };

        Self {
            email: pick(identity.and_then(|i| i.email.as_ref()), GUEST_EMAIL),
            display_name: pick(identity.and_then(|i| i.name.as_ref()), ANONYMOUS_NAME),
        }
    }
}

/// Response body for `GET /api/session`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub author_email: String,
    pub author_display_name: String,
    pub moderator: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_identity_is_guest() {
        assert_eq!(Author::from_identity(None), Author::guest());
    }

    #[test]
    fn full_identity_is_used() {
        let identity = Identity {
            email: Some("ada@example.com".into()),
            name: Some("Ada".into()),
        };
        let author = Author::from_identity(Some(&identity));

        assert_eq!(author.email, "ada@example.com");
        assert_eq!(author.display_name, "Ada");
    }

    #[test]
    fn fields_default_independently() {
        let only_email = Identity {
            email: Some("ada@example.com".into()),
            name: None,
        };
        let author = Author::from_identity(Some(&only_email));
        assert_eq!(author.email, "ada@example.com");
        assert_eq!(author.display_name, ANONYMOUS_NAME);

        let only_name = Identity {
            email: Some("  ".into()),
            name: Some("Ada".into()),
        };
        let author = Author::from_identity(Some(&only_name));
        assert_eq!(author.email, GUEST_EMAIL);
        assert_eq!(author.display_name, "Ada");
    }

    #[test]
    fn moderator_is_matched_by_name() {
        let moderator = Identity {
            email: None,
            name: Some("moderator".into()),
        };
        assert!(moderator.is_moderator("moderator"));
        assert!(!Identity::default().is_moderator("moderator"));
    }
}
