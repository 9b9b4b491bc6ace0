use std::net::AddrParseError;
use std::sync::Arc;

use axum::extract::FromRef;
use axum::{http, Router};
use thiserror::Error;
use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::router::*;
use crate::profile::*;
use devbook_database::basic_db::{SafeDatabase, InnerDatabase};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState<T> {
    pub database: T,
    pub tokens: Arc<TokenVerifier>,
}

impl<T> FromRef<AppState<T>> for Arc<TokenVerifier> {
    fn from_ref(state: &AppState<T>) -> Self {
        Arc::clone(&state.tokens)
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] libmdbx::Error),
    #[error("invalid listen address: {0}")]
    Address(#[from] AddrParseError),
}


pub fn build_app<T: SafeDatabase>(state: AppState<T>) -> Router {
    let components = collect_components::<T>();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
            http::Method::OPTIONS
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    main_router(components, state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}


pub async fn build_server(config: Config) -> Result<(), ServerError> {
    std::fs::create_dir_all(&config.database_path)?;
    let database = InnerDatabase::new(&config.database_path)?;

    let state = AppState {
        database,
        tokens: Arc::new(TokenVerifier::new(config.jwt_secret.as_bytes())),
    };

    let app = build_app(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, database = %config.database_path.display(), "profile service listening");

    axum::serve(listener, app).await?;
    Ok(())
}



fn collect_components<T: SafeDatabase>() -> Vec<(String, Router<AppState<T>>)> {
    // 본인 프로필
    let router_me_get = get_router_builder("/api/profile/me".to_string(), get_current_profile::<T>);
    let router_profile_post = post_router_builder("/api/profile".to_string(), upsert_profile::<T>);
    let router_profile_delete = delete_router_builder("/api/profile".to_string(), delete_account::<T>);

    // 공개 조회
    let router_profile_get_all = get_router_builder("/api/profile".to_string(), get_all_profiles::<T>);
    let router_profile_get_user = get_router_builder("/api/profile/user/{user_id}".to_string(), get_profile_by_user::<T>);

    // 경력 / 학력
    let router_experience_put = put_router_builder("/api/profile/experience".to_string(), add_experience::<T>);
    let router_experience_delete = delete_router_builder("/api/profile/experience/{exp_id}".to_string(), remove_experience::<T>);
    let router_education_put = put_router_builder("/api/profile/education".to_string(), add_education::<T>);
    let router_education_delete = delete_router_builder("/api/profile/education/{edu_id}".to_string(), remove_education::<T>);

    vec![
        router_me_get,
        router_profile_post,
        router_profile_delete,
        router_profile_get_all,
        router_profile_get_user,
        router_experience_put,
        router_experience_delete,
        router_education_put,
        router_education_delete,
    ]

}
