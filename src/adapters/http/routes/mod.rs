pub mod api_keys;
pub mod tools;

use axum::{Router, middleware};

use crate::adapters::http::{
    app_state::AppState,
    middleware::{api_key_auth_middleware, session_auth_middleware},
};

pub fn router(app_state: AppState) -> Router<AppState> {
    Router::new()
        .nest(
            "/keys",
            api_keys::router().layer(middleware::from_fn_with_state(
                app_state.clone(),
                session_auth_middleware,
            )),
        )
        .nest(
            "/tools",
            tools::router().layer(middleware::from_fn_with_state(
                app_state,
                api_key_auth_middleware,
            )),
        )
}
