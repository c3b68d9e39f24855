//! Server-rendered pages: landing, verifier form and demo feed.

use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::{self, CurrentSession};
use crate::session::Session;
use crate::ui::feed::{DemoPost, FeedView, DEMO_POSTS};
use crate::ui::verifier::{LocalAnalysisClient, Verifier, VerifierView};
use crate::AppState;

pub struct HeaderView {
    pub display_name: Option<String>,
    /// Where "Sign In" points. No link is shown when unset.
    pub sign_in_url: Option<String>,
}

impl HeaderView {
    pub fn new(state: &AppState, session: Option<&Session>) -> Self {
        Self {
            display_name: session.map(|s| s.display_name().to_string()),
            sign_in_url: state.config.sign_in_url.clone(),
        }
    }
}

pub struct PostView {
    pub post: &'static DemoPost,
    pub open: bool,
    pub toggle_href: String,
}

pub struct FeedPanel {
    pub posts: Vec<PostView>,
}

impl FeedPanel {
    pub fn new(view: &FeedView, base: &str) -> Self {
        let posts = DEMO_POSTS
            .iter()
            .map(|post| PostView {
                post,
                open: view.is_open(post.id),
                toggle_href: view.toggle_href(base, post.id),
            })
            .collect();
        Self { posts }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub header: HeaderView,
    pub signed_in: bool,
    pub verify_action: &'static str,
    pub verifier: VerifierView,
    pub feed: FeedPanel,
}

#[derive(Template)]
#[template(path = "verify.html")]
pub struct VerifyTemplate {
    pub header: HeaderView,
    pub verify_action: &'static str,
    pub verifier: VerifierView,
}

#[derive(Template)]
#[template(path = "feed.html")]
pub struct FeedTemplate {
    pub header: HeaderView,
    pub feed: FeedPanel,
}

fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub open: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    #[serde(default)]
    pub url: String,
}

async fn run_verifier(state: &AppState, url: String) -> VerifierView {
    let mut verifier = Verifier::new(LocalAnalysisClient::new(state.clone()));
    verifier.set_url(url);
    verifier.submit().await;
    verifier.view()
}

fn index_page(state: &AppState, session: Option<&Session>, verifier: VerifierView, open: Option<&str>) -> Response {
    render(IndexTemplate {
        header: HeaderView::new(state, session),
        signed_in: session.is_some(),
        verify_action: "/",
        verifier,
        feed: FeedPanel::new(&FeedView::from_query(open), "/"),
    })
}

pub async fn index(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<FeedQuery>,
) -> Response {
    index_page(&state, session.as_ref(), VerifierView::default(), query.open.as_deref())
}

/// Verifier submitted from the signed-in landing page; the feed stays below it.
pub async fn index_submit(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<VerifyForm>,
) -> Response {
    let verifier = match session {
        Some(_) => run_verifier(&state, form.url).await,
        None => VerifierView::default(),
    };
    index_page(&state, session.as_ref(), verifier, None)
}

pub async fn verify_form(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> Response {
    render(VerifyTemplate {
        header: HeaderView::new(&state, session.as_ref()),
        verify_action: "/verify",
        verifier: VerifierView::default(),
    })
}

pub async fn verify_submit(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<VerifyForm>,
) -> Response {
    let header = HeaderView::new(&state, session.as_ref());
    let verifier = run_verifier(&state, form.url).await;

    render(VerifyTemplate {
        header,
        verify_action: "/verify",
        verifier,
    })
}

pub async fn feed(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<FeedQuery>,
) -> Response {
    render(FeedTemplate {
        header: HeaderView::new(&state, session.as_ref()),
        feed: FeedPanel::new(&FeedView::from_query(query.open.as_deref()), "/feed"),
    })
}

/// Landing point after the auth provider's sign-in. Stores the token in the
/// session cookie once the provider confirms it.
pub async fn auth_callback(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> Response {
    let Some(token) = query.access_token.filter(|t| !t.trim().is_empty()) else {
        warn!("auth callback without access token");
        return Redirect::to("/").into_response();
    };

    match auth::resolve_session(&state, &token).await {
        Some(session) => {
            info!(user_id = %session.user_id, "signed in");
            ([(header::SET_COOKIE, auth::session_cookie(&token))], Redirect::to("/")).into_response()
        }
        None => {
            warn!("auth callback token rejected");
            Redirect::to("/").into_response()
        }
    }
}

/// Signs the requesting visitor out. Nobody else's session is touched.
pub async fn sign_out(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> Response {
    if let Some(session) = session {
        auth::revoke(&state, &session.access_token).await;
        info!(user_id = %session.user_id, "signed out");
    }
    ([(header::SET_COOKIE, auth::cleared_session_cookie())], Redirect::to("/")).into_response()
}
