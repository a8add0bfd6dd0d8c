//! Local input checks run before anything reaches the collaborator.

use scout_shared::constants::{MAX_GROUP_NAME_CHARS, MAX_MESSAGE_CHARS};
use scout_shared::types::UserId;

use crate::error::ValidationError;

/// Strip control characters (newline and tab survive), trim, and enforce
/// the length limit. Returns the body to send.
pub fn sanitize_message(body: &str) -> Result<String, ValidationError> {
    let cleaned: String = body
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    let len = trimmed.chars().count();
    if len > MAX_MESSAGE_CHARS {
        return Err(ValidationError::MessageTooLong {
            len,
            max: MAX_MESSAGE_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

/// A group chat about to be created.
#[derive(Debug, Clone, Default)]
pub struct GroupDraft {
    pub name: String,
    pub member_ids: Vec<UserId>,
}

impl GroupDraft {
    /// Returns the trimmed group name on success.
    pub fn validate(&self) -> Result<String, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyGroupName);
        }
        let len = name.chars().count();
        if len > MAX_GROUP_NAME_CHARS {
            return Err(ValidationError::GroupNameTooLong {
                len,
                max: MAX_GROUP_NAME_CHARS,
            });
        }
        if self.member_ids.is_empty() {
            return Err(ValidationError::NoMembersSelected);
        }
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_trimmed_and_cleaned() {
        assert_eq!(sanitize_message("  hola\u{0007}  ").unwrap(), "hola");
        assert_eq!(sanitize_message("line one\nline\ttwo").unwrap(), "line one\nline\ttwo");
    }

    #[test]
    fn empty_and_oversized_messages_rejected() {
        assert_eq!(sanitize_message("   \n "), Err(ValidationError::EmptyMessage));
        assert_eq!(sanitize_message("\u{0000}"), Err(ValidationError::EmptyMessage));

        let exact = "é".repeat(MAX_MESSAGE_CHARS);
        assert!(sanitize_message(&exact).is_ok());
        let long = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert_eq!(
            sanitize_message(&long),
            Err(ValidationError::MessageTooLong {
                len: MAX_MESSAGE_CHARS + 1,
                max: MAX_MESSAGE_CHARS
            })
        );
    }

    #[test]
    fn group_draft_rules() {
        let mut draft = GroupDraft {
            name: "  ".into(),
            member_ids: vec![UserId::new("pal")],
        };
        assert_eq!(draft.validate(), Err(ValidationError::EmptyGroupName));

        draft.name = "x".repeat(MAX_GROUP_NAME_CHARS + 1);
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::GroupNameTooLong { .. })
        ));

        draft.name = " Lisbon walkers ".into();
        assert_eq!(draft.validate().unwrap(), "Lisbon walkers");

        draft.member_ids.clear();
        assert_eq!(draft.validate(), Err(ValidationError::NoMembersSelected));
    }
}
