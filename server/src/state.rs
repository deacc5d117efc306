use mysql::MysqlManager;

/// State shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub manager: MysqlManager,
}

impl AppState {
    pub fn new(manager: MysqlManager) -> Self {
        Self { manager }
    }
}
