use crate::{
    config::JwtConfig,
    db::{DbPool, OrmConn, raw_pool},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub jwt: JwtConfig,
}

impl AppState {
    pub fn new(orm: OrmConn, jwt: JwtConfig) -> Self {
        Self {
            pool: raw_pool(&orm),
            orm,
            jwt,
        }
    }
}
