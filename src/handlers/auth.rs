use askama::Template;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::extract::ApiForm;
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuthUser;
use crate::models::{CreateUser, LoginCredentials};
use crate::repositories::{SessionRepository, UserRepository};
use crate::session::{create_session_cookie, get_session_token, remove_session_cookie};

#[derive(Clone)]
pub struct AuthState {
    pub user_repo: UserRepository,
    pub session_repo: SessionRepository,
}

// Templates
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    error: Option<String>,
    username: String,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    error: Option<String>,
    username: String,
    display_name: String,
}

fn render<T: Template>(template: T) -> Result<Html<String>> {
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

// Handlers
pub async fn login_page(OptionalAuthUser(auth_user): OptionalAuthUser) -> Result<Response> {
    if auth_user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    Ok(render(LoginTemplate {
        error: None,
        username: String::new(),
    })?
    .into_response())
}

pub async fn login_submit(
    State(state): State<AuthState>,
    jar: CookieJar,
    ApiForm(credentials): ApiForm<LoginCredentials>,
) -> Result<Response> {
    let user = state
        .user_repo
        .verify_password(&credentials.username, &credentials.password)
        .await?;

    match user {
        Some(user) => {
            let token = state.session_repo.create(&user.id).await?;
            tracing::info!("User {} logged in", user.username);
            let jar = jar.add(create_session_cookie(&token));
            Ok((jar, Redirect::to("/")).into_response())
        }
        None => {
            tracing::debug!("Failed login for {}", credentials.username);
            Ok(render(LoginTemplate {
                error: Some("Invalid username or password".to_string()),
                username: credentials.username,
            })?
            .into_response())
        }
    }
}

pub async fn register_page(OptionalAuthUser(auth_user): OptionalAuthUser) -> Result<Response> {
    if auth_user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    Ok(render(RegisterTemplate {
        error: None,
        username: String::new(),
        display_name: String::new(),
    })?
    .into_response())
}

pub async fn register_submit(
    State(state): State<AuthState>,
    jar: CookieJar,
    ApiForm(form): ApiForm<CreateUser>,
) -> Result<Response> {
    match state.user_repo.create(&form).await {
        Ok(user) => {
            let token = state.session_repo.create(&user.id).await?;
            let jar = jar.add(create_session_cookie(&token));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(AppError::Validation(message)) => Ok(render(RegisterTemplate {
            error: Some(message),
            username: form.username,
            display_name: form.display_name.unwrap_or_default(),
        })?
        .into_response()),
        Err(e) => Err(e),
    }
}

pub async fn logout(
    State(state): State<AuthState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Response> {
    if let Some(token) = get_session_token(&headers) {
        state.session_repo.delete(&token).await?;
    }

    let jar = jar.add(remove_session_cookie());
    Ok((jar, Redirect::to("/auth/login")).into_response())
}
