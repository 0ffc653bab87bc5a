use std::path::Path;
use std::sync::Arc;

use crate::auth::repo::{JsonUserStore, UserStore};
use crate::config::AppConfig;
use crate::store::JsonDb;
use crate::upstream::{HttpUpstream, UpstreamClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: JsonDb,
    pub users: Arc<dyn UserStore>,
    pub upstream: Arc<dyn UpstreamClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        tokio::fs::create_dir_all(&config.data_dir).await?;
        let db = JsonDb::new(&config.data_dir);
        let users = Arc::new(JsonUserStore::new(db.clone())) as Arc<dyn UserStore>;
        let upstream =
            Arc::new(HttpUpstream::new(config.upstream.clone())) as Arc<dyn UpstreamClient>;

        Ok(Self {
            config,
            db,
            users,
            upstream,
        })
    }

    /// State for tests: file store rooted at `data_dir`, offline upstream,
    /// fixed JWT settings.
    pub fn fake(data_dir: &Path) -> Self {
        use crate::config::{JwtConfig, UpstreamConfig};
        use crate::upstream::StaticUpstream;

        let config = Arc::new(AppConfig {
            data_dir: data_dir.to_path_buf(),
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_days: 30,
            },
            upstream: UpstreamConfig {
                base_url: String::new(),
                email: String::new(),
                senha: String::new(),
            },
        });

        let db = JsonDb::new(data_dir);
        let users = Arc::new(JsonUserStore::new(db.clone())) as Arc<dyn UserStore>;
        let upstream = Arc::new(StaticUpstream) as Arc<dyn UpstreamClient>;

        Self {
            config,
            db,
            users,
            upstream,
        }
    }
}
