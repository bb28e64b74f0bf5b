use crate::{config::AuthConfig, db::DbPool};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub auth: AuthConfig,
}
