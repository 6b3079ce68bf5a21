use crate::error::{AcademyResult, B64Snafu, RmpSerdeDecodeSnafu, RmpSerdeEncodeSnafu};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use maud::{Markup, Render, html};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// A one-shot status message, carried to the next page inside the redirect itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Danger, message)
    }

    pub fn encode(&self) -> AcademyResult<String> {
        Ok(BASE64_URL_SAFE_NO_PAD.encode(rmp_serde::to_vec(self).context(RmpSerdeEncodeSnafu)?))
    }

    pub fn decode(encoded: &str) -> AcademyResult<Self> {
        rmp_serde::from_slice(&BASE64_URL_SAFE_NO_PAD.decode(encoded).context(B64Snafu)?)
            .context(RmpSerdeDecodeSnafu)
    }
}

impl Render for Flash {
    fn render(&self) -> Markup {
        let colours = match self.level {
            FlashLevel::Success => "bg-green-100 border-green-400 text-green-800",
            FlashLevel::Info => "bg-blue-100 border-blue-400 text-blue-800",
            FlashLevel::Warning => "bg-yellow-100 border-yellow-400 text-yellow-800",
            FlashLevel::Danger => "bg-red-100 border-red-400 text-red-700",
        };

        html! {
            div role="alert" class={"border px-4 py-3 rounded relative mb-4 w-full max-w-4xl " (colours)} {
                span {(self.message)}
            }
        }
    }
}

#[derive(Deserialize, Default)]
pub struct FlashQuery {
    pub flash: Option<String>,
}

impl FlashQuery {
    pub fn into_flash(self) -> AcademyResult<Option<Flash>> {
        self.flash
            .filter(|encoded| !encoded.is_empty())
            .map(|encoded| Flash::decode(&encoded))
            .transpose()
    }
}

/// What a handler hands back to axum: a page, a form rejected with a message, or a redirect
/// whose location already carries the flash for the page it points at.
#[derive(Debug)]
pub enum Reply {
    Page(Markup),
    Rejected(Markup),
    Redirect(String),
}

impl Reply {
    pub fn redirect(to: &str, flash: &Flash) -> AcademyResult<Self> {
        Ok(Self::Redirect(format!("{to}?flash={}", flash.encode()?)))
    }

    #[cfg(test)]
    pub fn into_markup(self) -> String {
        match self {
            Self::Page(markup) | Self::Rejected(markup) => markup.into_string(),
            Self::Redirect(location) => panic!("expected a page, got a redirect to {location}"),
        }
    }

    #[cfg(test)]
    pub fn redirect_flash(&self) -> (String, Flash) {
        let Self::Redirect(location) = self else {
            panic!("expected a redirect, got {self:?}");
        };
        let (path, query) = location
            .split_once("?flash=")
            .expect("redirects always carry a flash");
        (
            path.to_string(),
            Flash::decode(query).expect("flash should round-trip"),
        )
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Self::Page(markup) => markup.into_response(),
            Self::Rejected(markup) => (StatusCode::UNPROCESSABLE_ENTITY, markup).into_response(),
            Self::Redirect(location) => Redirect::to(&location).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_carries_flash_in_query() {
        let flash = Flash::danger("Student \"Ana Lee\" deleted! & gone?");
        let reply = Reply::redirect("/", &flash).expect("encodes");
        let (path, decoded) = reply.redirect_flash();
        assert_eq!(path, "/");
        assert_eq!(decoded, flash);
    }

    #[test]
    fn empty_or_missing_flash_query_is_nothing() {
        assert_eq!(FlashQuery::default().into_flash().expect("no flash"), None);
        assert_eq!(
            FlashQuery {
                flash: Some(String::new())
            }
            .into_flash()
            .expect("no flash"),
            None
        );
    }

    #[test]
    fn garbage_flash_is_bad_input() {
        let err = FlashQuery {
            flash: Some("!!not base64!!".into()),
        }
        .into_flash()
        .expect_err("should not decode");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rendered_flash_is_escaped() {
        let html = Flash::info("<b>hi</b>").render().into_string();
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(html.contains("bg-blue-100"));
    }

    #[test]
    fn redirect_replies_are_see_other() {
        let response = Reply::redirect("/teachers", &Flash::success("ok"))
            .expect("encodes")
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
