use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::storage::{MediaStore, S3MediaStore};
use crate::users::repo::{PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub media: Arc<dyn MediaStore>,
}

impl AppState {
    pub async fn init(config: Arc<AppConfig>, db: PgPool) -> anyhow::Result<Self> {
        let users = Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>;
        let media = Arc::new(S3MediaStore::new(&config.media).await?) as Arc<dyn MediaStore>;
        Ok(Self::from_parts(config, users, media))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            config,
            users,
            media,
        }
    }
}
