pub mod commands;

use std::path::PathBuf;
use std::time::Duration;

use crate::types::ManagerConfig;

/// Overrides applied on top of the loaded configuration
#[derive(clap::Args, Debug, Default)]
pub struct PathOverrides {
    /// Directory holding the backup directories
    #[clap(long)]
    pub backup_root: Option<PathBuf>,

    /// Directory holding the backup and restore scripts
    #[clap(long)]
    pub scripts_dir: Option<PathBuf>,

    /// Script timeout in seconds
    #[clap(long)]
    pub timeout: Option<u64>,
}

impl PathOverrides {
    pub fn apply(&self, config: &mut ManagerConfig) {
        if let Some(backup_root) = &self.backup_root {
            config.backup_root = backup_root.clone();
        }
        if let Some(scripts_dir) = &self.scripts_dir {
            config.scripts_dir = scripts_dir.clone();
        }
        if let Some(timeout) = self.timeout {
            config.script_timeout = Duration::from_secs(timeout);
        }
    }
}

#[derive(clap::Subcommand, Debug)]
pub enum MysqlCommands {
    /// Check that a MySQL server accepts the given credentials
    TestConnection {
        /// MySQL host
        #[clap(long)]
        host: String,

        /// MySQL port
        #[clap(long, default_value = "3306")]
        port: String,

        /// MySQL user
        #[clap(long)]
        user: String,

        /// MySQL password
        #[clap(long)]
        password: Option<String>,

        /// Also check that this database is accessible
        #[clap(long)]
        database: Option<String>,
    },

    /// Run the backup script
    Backup {
        /// MySQL host
        #[clap(long)]
        host: String,

        /// MySQL port
        #[clap(long, default_value = "3306")]
        port: String,

        /// MySQL user
        #[clap(long)]
        user: String,

        /// MySQL password
        #[clap(long)]
        password: Option<String>,

        /// Database to back up
        #[clap(long)]
        database: String,

        /// Backup root passed to the script, defaults to the configured root
        #[clap(long)]
        backup_dir: Option<String>,

        /// Only back up these tables (comma separated)
        #[clap(long)]
        tables: Option<String>,

        /// Skip these tables (comma separated)
        #[clap(long)]
        ignore_tables: Option<String>,

        /// Remove backups older than this many days
        #[clap(long)]
        clean_days: Option<i64>,
    },

    /// Run the restore script
    Restore {
        /// Backup directory to restore from
        #[clap(long)]
        backup_dir: String,

        /// Database to restore into
        #[clap(long)]
        target_db: String,

        /// MySQL host
        #[clap(long)]
        host: String,

        /// MySQL port
        #[clap(long, default_value = "3306")]
        port: String,

        /// MySQL user
        #[clap(long)]
        user: String,

        /// MySQL password
        #[clap(long)]
        password: Option<String>,

        /// Only restore these tables (comma separated)
        #[clap(long)]
        tables: Option<String>,

        /// Skip these tables (comma separated)
        #[clap(long)]
        ignore_tables: Option<String>,

        /// Drop and recreate these tables (comma separated)
        #[clap(long)]
        overwrite_tables: Option<String>,
    },

    /// List backups under the backup root
    ListBackups {
        /// Only show backups of this database
        #[clap(long)]
        database: Option<String>,
    },

    /// Print the backup or restore log of a backup
    ShowLog {
        /// Backup directory name, e.g. shop_20240115_093000
        dir_name: String,

        /// Which log to show: backup or restore
        #[clap(long = "type", default_value = "backup")]
        kind: String,
    },

    /// List the tables and views contained in a backup
    ListTables {
        /// Backup directory name, e.g. shop_20240115_093000
        dir_name: String,
    },

    /// Delete a backup directory
    DeleteBackup {
        /// Backup directory name, e.g. shop_20240115_093000
        dir_name: String,
    },
}
