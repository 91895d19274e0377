use chrono::Utc;

pub type Time = chrono::DateTime<Utc>;

/// Identifiers are opaque strings on our side, but the server may send them as
/// JSON numbers
macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<$name, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                #[derive(serde::Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Text(String),
                    Number(i64),
                }
                Ok($name(
                    match <Raw as serde::Deserialize>::deserialize(deserializer)? {
                        Raw::Text(s) => s,
                        Raw::Number(n) => n.to_string(),
                    },
                ))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> $name {
                $name(String::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> $name {
                $name(s)
            }
        }
    };
}

mod comment;
pub use comment::{CastVote, Comment, CommentId, EditComment, NewComment, Vote};

mod error;
pub use error::Error;

mod exercise;
pub use exercise::{Exercise, ExerciseId};

mod order;
pub use order::CommentOrder;

mod user;
pub use user::{Author, UserId};

/// Checked by clients before submitting and by the mock server. Bodies are otherwise
/// opaque, markup and math markers go through untouched.
pub fn validate_content(s: &str) -> Result<(), Error> {
    if s.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_validation() {
        assert_eq!(validate_content("   \n\t"), Err(Error::EmptyContent));
        assert_eq!(validate_content(""), Err(Error::EmptyContent));
        assert!(matches!(
            validate_content("a\0b"),
            Err(Error::NullByteInString(_))
        ));
        validate_content("$\\int_0^1 x\\,dx$ is easy").unwrap();
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        let id: CommentId = serde_json::from_str("42").unwrap();
        assert_eq!(id, CommentId::from("42"));
        let id: UserId = serde_json::from_str("\"u-7\"").unwrap();
        assert_eq!(id.to_string(), "u-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u-7\"");
    }
}
