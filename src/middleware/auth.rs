use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use crate::error::AppError;
use crate::repositories::{SessionRepository, UserRepository};
use crate::session::get_session_token;

/// Repositories the extractors need, installed as an `Extension` layer.
#[derive(Clone)]
pub struct AuthContext {
    pub session_repo: SessionRepository,
    pub user_repo: UserRepository,
}

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
}

impl AuthUser {
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }

    async fn from_parts(parts: &Parts) -> Result<Option<Self>, AppError> {
        let Some(context) = parts.extensions.get::<AuthContext>() else {
            return Err(AppError::Internal("AuthContext layer missing".to_string()));
        };
        let Some(token) = get_session_token(&parts.headers) else {
            return Ok(None);
        };
        let Some(user_id) = context.session_repo.find_valid(&token).await? else {
            return Ok(None);
        };

        Ok(context.user_repo.find_by_id(&user_id).await?.map(|user| Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
        }))
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let api = parts.uri.path().starts_with("/api/");
        match AuthUser::from_parts(parts).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) if api => Err(AuthRejection::Unauthorized),
            Ok(None) => Err(AuthRejection::Redirect),
            Err(e) => Err(AuthRejection::Error(e)),
        }
    }
}

pub enum AuthRejection {
    /// Page requests go to the login form.
    Redirect,
    /// API requests get a JSON 401.
    Unauthorized,
    Error(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Redirect => Redirect::to("/auth/login").into_response(),
            AuthRejection::Unauthorized => AppError::Unauthorized.into_response(),
            AuthRejection::Error(e) => e.into_response(),
        }
    }
}

// Optional auth - never rejects, just returns None if not logged in
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match AuthUser::from_parts(parts).await {
            Ok(user) => Ok(OptionalAuthUser(user)),
            Err(e) => {
                tracing::warn!("Session lookup failed: {}", e);
                Ok(OptionalAuthUser(None))
            }
        }
    }
}
