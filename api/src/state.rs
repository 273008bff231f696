use std::sync::Arc;

use common::auth::JwtService;
use common::config::Settings;
use common::registry::JobRegistry;
use common::source::SourceReader;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: JobRegistry,
    pub reader: SourceReader,
    pub jwt: JwtService,
    pub config: Arc<Settings>,
}

impl AppState {
    pub fn new(
        registry: JobRegistry,
        reader: SourceReader,
        jwt: JwtService,
        config: Settings,
    ) -> Self {
        Self {
            registry,
            reader,
            jwt,
            config: Arc::new(config),
        }
    }
}
