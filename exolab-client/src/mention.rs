//! `@username` autocompletion in comment boxes. Everything here is a pure function
//! of the text and the cursor, and is meant to run again on every keystroke.
//!
//! Cursor positions are counted in characters, not bytes.

use crate::{api::Author, Participant};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Mention {
    pub active: bool,
    pub query: String,
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Index of the `@` opening the token that ends `before`, if that token is a mention
fn mention_start(before: &[char]) -> Option<usize> {
    let start = before
        .iter()
        .rposition(|c| !is_word(*c))
        .map_or(0, |p| p + 1);
    if start == 0 || before[start - 1] != '@' {
        return None;
    }
    // an odd number of backslashes right before the @ escapes it
    let backslashes = before[..start - 1]
        .iter()
        .rev()
        .take_while(|c| **c == '\\')
        .count();
    if backslashes % 2 == 1 {
        return None;
    }
    Some(start - 1)
}

/// Finds the `@token` being typed right before `cursor`, if any
pub fn detect_mention(text: &str, cursor: usize) -> Mention {
    let before = text.chars().take(cursor).collect::<Vec<char>>();
    match mention_start(&before) {
        Some(at) => Mention {
            active: true,
            query: before[at + 1..].iter().collect(),
        },
        None => Mention::default(),
    }
}

/// Replaces the mention `detect_mention` finds before `cursor`, `@` included, by
/// `@username `. Returns the new text and the new cursor position, or the text
/// unchanged if no mention is being typed.
pub fn apply_mention(text: &str, cursor: usize, username: &str) -> (String, usize) {
    let chars = text.chars().collect::<Vec<char>>();
    let cursor = cursor.min(chars.len());
    let at = match mention_start(&chars[..cursor]) {
        Some(at) => at,
        None => return (String::from(text), cursor),
    };
    let inserted = format!("@{username} ");
    let mut res = chars[..at].iter().collect::<String>();
    res.push_str(&inserted);
    res.extend(chars[cursor..].iter());
    (res, at + inserted.chars().count())
}

/// Participants whose name contains `query`, ignoring case
pub fn filter_participants<'a>(people: &'a [Participant], query: &str) -> Vec<&'a Participant> {
    let query = query.to_lowercase();
    people
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&query))
        .collect()
}

/// Initial contents of the box for a reply to `author`
pub fn reply_prefill(author: &Author) -> String {
    format!("@{} ", author.username)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UserId;

    fn at_end(text: &str) -> Mention {
        detect_mention(text, text.chars().count())
    }

    #[test]
    fn detects_token_before_cursor() {
        assert_eq!(
            at_end("hello @ma"),
            Mention {
                active: true,
                query: String::from("ma")
            }
        );
        assert!(!at_end("hello @ma ").active);
        assert_eq!(at_end("@").query, "");
        assert!(at_end("@").active);
        assert!(!at_end("hello").active);
        assert!(!at_end("").active);
        assert_eq!(at_end("a@b@c_1").query, "c_1");
    }

    #[test]
    fn cursor_in_the_middle() {
        let text = "hi @sara and @ami";
        assert_eq!(detect_mention(text, 6).query, "sa");
        assert!(!detect_mention(text, 9).active);
        assert!(!detect_mention(text, 0).active);
        // past the end behaves like at the end
        assert_eq!(detect_mention(text, 1000).query, "ami");
    }

    #[test]
    fn escaped_at_is_ignored() {
        assert!(!at_end("price \\@home").active);
        assert!(at_end("path\\\\@home").active);
    }

    #[test]
    fn non_ascii_names() {
        assert_eq!(at_end("merci @yassín").query, "yassín");
        assert_eq!(detect_mention("é @zé", 4).query, "z");
    }

    #[test]
    fn applying_a_mention() {
        assert_eq!(
            apply_mention("hello @ma", 9, "mahdi"),
            (String::from("hello @mahdi "), 13)
        );
        assert_eq!(
            apply_mention("x @s tail", 4, "sara"),
            (String::from("x @sara  tail"), 8)
        );
        assert_eq!(apply_mention("no at", 5, "sara"), (String::from("no at"), 5));
    }

    #[test]
    fn applying_skips_escaped_and_finished_mentions() {
        assert_eq!(
            apply_mention("a \\@b", 4, "sara"),
            (String::from("a \\@b"), 4)
        );
        assert_eq!(
            apply_mention("@ali said \\@b", 13, "sara"),
            (String::from("@ali said \\@b"), 13)
        );
        assert_eq!(
            apply_mention("cc @ali then", 12, "sara"),
            (String::from("cc @ali then"), 12)
        );
        assert_eq!(
            apply_mention("a\\\\@b", 5, "sara"),
            (String::from("a\\\\@sara "), 9)
        );
    }

    #[test]
    fn filtering() {
        let people = [
            Participant {
                id: UserId::from("1"),
                name: String::from("Mahdi"),
            },
            Participant {
                id: UserId::from("2"),
                name: String::from("sara"),
            },
        ];
        let names = |q| {
            filter_participants(&people, q)
                .into_iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(names("MA"), ["Mahdi"]);
        assert_eq!(names("a"), ["Mahdi", "sara"]);
        assert!(names("z").is_empty());
    }

    #[test]
    fn prefill() {
        assert_eq!(reply_prefill(&Author::new("7", "sara")), "@sara ");
    }
}
