use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    api::{self, CastVote, Comment, CommentId, EditComment, Exercise, ExerciseId, NewComment, Vote},
    CommentApi, Error,
};

/// `CommentApi` over the server's REST endpoints
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    host: String,
    token: Option<String>,
}

impl HttpApi {
    /// `host` is eg. `https://exolab.example.org`, without trailing slash
    pub fn new(host: impl Into<String>, token: Option<String>) -> HttpApi {
        HttpApi {
            client: reqwest::Client::new(),
            host: host.into(),
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self
            .client
            .request(method, format!("{}/api/{}", self.host, path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, Error> {
        let resp = req
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(error_from_response(resp).await)
        }
    }

    async fn send_json<R: DeserializeOwned>(&self, req: RequestBuilder) -> Result<R, Error> {
        self.send(req)
            .await?
            .json()
            .await
            .map_err(|e| Error::Network(format!("failed to parse server response: {e}")))
    }
}

async fn error_from_response(resp: Response) -> Error {
    let status = resp.status();
    let body = resp.bytes().await.unwrap_or_default();
    classify(status, &body)
}

/// Turns an error response into an `Error`.
///
/// Typed bodies are trusted. Anything else, like the `{"error": "..."}` bodies the
/// server's views send or a proxy's HTML page, is classified by status.
pub fn classify(status: StatusCode, body: &[u8]) -> Error {
    if let Ok(err) = api::Error::parse(body) {
        return Error::from(err);
    }
    let text = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.as_str().map(String::from))
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
    tracing::debug!(%status, body = %text, "untyped error from server");
    match status {
        StatusCode::BAD_REQUEST => Error::Validation(text),
        StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::NOT_FOUND
        | StatusCode::CONFLICT => Error::Conflict(format!("{status}: {text}")),
        _ => Error::Network(format!("{status}: {text}")),
    }
}

#[async_trait(?Send)]
impl CommentApi for HttpApi {
    async fn fetch_comments(&self, exercise: &ExerciseId) -> Result<Vec<Comment>, Error> {
        let ex: Exercise = self
            .send_json(self.request(Method::GET, &format!("exercises/{exercise}/")))
            .await?;
        Ok(ex.comments)
    }

    async fn add_comment(
        &self,
        exercise: &ExerciseId,
        text: &str,
        parent: Option<&CommentId>,
    ) -> Result<Comment, Error> {
        let body = NewComment {
            content: String::from(text),
            parent: parent.cloned(),
        };
        body.validate()?;
        self.send_json(
            self.request(Method::POST, &format!("exercises/{exercise}/comment/"))
                .json(&body),
        )
        .await
    }

    async fn edit_comment(&self, id: &CommentId, text: &str) -> Result<Comment, Error> {
        let body = EditComment {
            content: String::from(text),
        };
        body.validate()?;
        self.send_json(
            self.request(Method::PUT, &format!("comments/{id}/"))
                .json(&body),
        )
        .await
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<(), Error> {
        self.send(self.request(Method::DELETE, &format!("comments/{id}/")))
            .await?;
        Ok(())
    }

    async fn vote_comment(&self, id: &CommentId, vote: Vote) -> Result<Comment, Error> {
        self.send_json(
            self.request(Method::POST, &format!("comments/{id}/vote/"))
                .json(&CastVote { vote }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_errors_are_classified_by_status() {
        assert_eq!(
            classify(
                StatusCode::BAD_REQUEST,
                br#"{"error": "Comment content is required"}"#
            ),
            Error::Validation(String::from("Comment content is required"))
        );
        for status in [
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
        ] {
            let err = classify(status, br#"{"detail": "Not found."}"#);
            assert!(matches!(err, Error::Conflict(_)), "{status}: {err:?}");
        }
    }

    #[test]
    fn gateway_pages_are_network_errors() {
        let err = classify(
            StatusCode::BAD_GATEWAY,
            b"<html><body>502 Bad Gateway</body></html>",
        );
        assert!(matches!(&err, Error::Network(m) if m.contains("Bad Gateway")));
        assert!(err.is_retryable());
    }

    #[test]
    fn typed_bodies_win_over_status() {
        let body = api::Error::CommentNotFound(CommentId::from("8")).contents();
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, &body),
            Error::Conflict(_)
        ));
        let body = api::Error::EmptyContent.contents();
        assert!(matches!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, &body),
            Error::Validation(_)
        ));
    }
}
