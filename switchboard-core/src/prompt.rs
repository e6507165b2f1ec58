//! Flattens structured chat turns into a single text prompt.
//!
//! Some backends only accept a completion-style prompt rather than a list of
//! turns. Each message becomes a role-prefixed segment and the prompt ends
//! with an open assistant turn:
//!
//! ```text
//! \n\nSystem: {content}\n\nHuman: {content}\n\nAssistant: {content}\n\nAssistant:
//! ```

use crate::provider::{Message, Role};

/// Suffix that hands the turn to the backend.
pub const ASSISTANT_TURN: &str = "\n\nAssistant:";

const MARKERS: [(Role, &str); 3] = [
    (Role::System, "\n\nSystem: "),
    (Role::User, "\n\nHuman: "),
    (Role::Assistant, "\n\nAssistant: "),
];

fn marker(role: Role) -> &'static str {
    match role {
        Role::System => MARKERS[0].1,
        Role::User => MARKERS[1].1,
        Role::Assistant => MARKERS[2].1,
    }
}

/// Converts messages into a completion prompt, preserving their order.
///
/// Content is copied verbatim: no trimming, truncation or escaping.
pub fn format_prompt(messages: &[Message]) -> String {
    let capacity = messages
        .iter()
        .map(|m| m.content.len() + marker(m.role).len())
        .sum::<usize>()
        + ASSISTANT_TURN.len();

    let mut prompt = String::with_capacity(capacity);
    for message in messages {
        prompt.push_str(marker(message.role));
        prompt.push_str(&message.content);
    }
    prompt.push_str(ASSISTANT_TURN);
    prompt
}

/// Recovers the `(role, content)` sequence from a formatted prompt.
///
/// Text before the first role marker is dropped. Content that itself contains
/// a role marker cannot be told apart from a new turn and will be split.
pub fn parse_prompt(prompt: &str) -> Vec<Message> {
    let mut rest = prompt.strip_suffix(ASSISTANT_TURN).unwrap_or(prompt);
    let mut messages = Vec::new();
    let mut current: Option<Role> = None;

    loop {
        match next_marker(rest) {
            Some((index, role, len)) => {
                if let Some(previous) = current {
                    messages.push(Message::new(previous, &rest[..index]));
                }
                current = Some(role);
                rest = &rest[index + len..];
            }
            None => {
                if let Some(previous) = current {
                    messages.push(Message::new(previous, rest));
                }
                break;
            }
        }
    }

    messages
}

fn next_marker(text: &str) -> Option<(usize, Role, usize)> {
    MARKERS
        .iter()
        .filter_map(|(role, marker)| text.find(marker).map(|index| (index, *role, marker.len())))
        .min_by_key(|(index, _, _)| *index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Vec<Message> {
        vec![
            Message::system("Be brief."),
            Message::user("hi"),
            Message::assistant("hello"),
            Message::user("how are you?"),
        ]
    }

    #[test]
    fn test_format_prompt_prefixes_each_role() {
        let prompt = format_prompt(&conversation());
        assert_eq!(
            prompt,
            "\n\nSystem: Be brief.\n\nHuman: hi\n\nAssistant: hello\n\nHuman: how are you?\n\nAssistant:"
        );
    }

    #[test]
    fn test_format_prompt_empty_conversation() {
        assert_eq!(format_prompt(&[]), "\n\nAssistant:");
    }

    #[test]
    fn test_format_prompt_keeps_empty_and_duplicate_messages() {
        let messages = vec![Message::user(""), Message::user("")];
        assert_eq!(format_prompt(&messages), "\n\nHuman: \n\nHuman: \n\nAssistant:");
    }

    #[test]
    fn test_format_prompt_is_deterministic() {
        let messages = conversation();
        assert_eq!(format_prompt(&messages), format_prompt(&messages));
    }

    #[test]
    fn test_format_prompt_does_not_trim() {
        let prompt = format_prompt(&[Message::user("  padded  \n")]);
        assert_eq!(prompt, "\n\nHuman:   padded  \n\n\nAssistant:");
    }

    #[test]
    fn test_parse_prompt_recovers_conversation() {
        let messages = conversation();
        assert_eq!(parse_prompt(&format_prompt(&messages)), messages);
    }

    #[test]
    fn test_parse_prompt_recovers_empty_content() {
        let messages = vec![
            Message::system(""),
            Message::user("q"),
            Message::assistant(""),
        ];
        assert_eq!(parse_prompt(&format_prompt(&messages)), messages);
    }

    #[test]
    fn test_parse_prompt_empty() {
        assert!(parse_prompt(&format_prompt(&[])).is_empty());
        assert!(parse_prompt("").is_empty());
    }
}
