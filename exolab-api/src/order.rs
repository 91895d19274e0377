use std::{fmt, str::FromStr};

use crate::Error;

/// How the top-level comments of an exercise are listed. The camelCase names are
/// also the values kept in the browser's storage.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentOrder {
    #[default]
    MostUpvoted,
    Recent,
    Oldest,
}

impl CommentOrder {
    pub const ALL: [CommentOrder; 3] = [
        CommentOrder::MostUpvoted,
        CommentOrder::Recent,
        CommentOrder::Oldest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommentOrder::MostUpvoted => "mostUpvoted",
            CommentOrder::Recent => "recent",
            CommentOrder::Oldest => "oldest",
        }
    }
}

impl fmt::Display for CommentOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<CommentOrder, Error> {
        CommentOrder::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| Error::UnknownOrder(String::from(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_serde() {
        for o in CommentOrder::ALL {
            let json = serde_json::to_string(&o).unwrap();
            assert_eq!(json, format!("\"{o}\""));
            assert_eq!(o.as_str().parse::<CommentOrder>(), Ok(o));
        }
        assert_eq!(CommentOrder::default(), CommentOrder::MostUpvoted);
        assert!("newest".parse::<CommentOrder>().is_err());
    }
}
