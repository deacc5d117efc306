#![cfg(unix)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use mysql::{ManagerConfig, MysqlManager};
use serde_json::{json, Value};
use serial_test::serial;
use server::routes::router;
use server::state::AppState;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    dir: TempDir,
    script_timeout: Duration,
    probe_timeout: Duration,
    mysql_client: Option<String>,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("scripts")).unwrap();
        fs::create_dir_all(dir.path().join("backups")).unwrap();
        Self {
            dir,
            script_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
            mysql_client: None,
        }
    }

    fn backup_root(&self) -> PathBuf {
        self.dir.path().join("backups")
    }

    fn marker(&self) -> PathBuf {
        self.dir.path().join("invoked")
    }

    fn script(&self, name: &str, body: &str) {
        write_executable(&self.dir.path().join("scripts").join(name), body);
    }

    fn backup_dir(&self, name: &str, files: &[(&str, &str)]) {
        let dir = self.backup_root().join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            let path = dir.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    fn router(&self) -> Router {
        let config = ManagerConfig {
            scripts_dir: self.dir.path().join("scripts"),
            backup_root: self.backup_root(),
            script_timeout: self.script_timeout,
            probe_timeout: self.probe_timeout,
            ..ManagerConfig::default()
        };
        let config = match &self.mysql_client {
            Some(client) => ManagerConfig {
                mysql_client: client.clone(),
                ..config
            },
            None => config,
        };
        router(Arc::new(AppState::new(MysqlManager::new(config))))
    }

    async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

fn write_executable(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn backup_body() -> Value {
    json!({
        "host": "db.internal",
        "port": 3306,
        "user": "backup",
        "password": "s3cret",
        "database": "shop"
    })
}

#[tokio::test]
#[serial]
async fn backup_with_missing_fields_never_invokes_the_script() {
    let app = TestApp::new();
    app.script(
        "mysql-backup-schema-data.sh",
        &format!("touch '{}'", app.marker().display()),
    );

    for field in ["host", "user", "password", "database"] {
        let mut body = backup_body();
        body[field] = json!("");

        let (status, response) = app.call("POST", "/db/backup", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(
            response["msg"],
            "Missing required parameters: host, user, password, database"
        );
    }

    assert!(!app.marker().exists());
}

#[tokio::test]
#[serial]
async fn successful_backup_returns_script_output() {
    let app = TestApp::new();
    app.script("mysql-backup-schema-data.sh", "echo done; echo note >&2");

    let (status, response) = app.call("POST", "/db/backup", Some(backup_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["code"], 200);
    assert_eq!(response["msg"], "Backup succeeded");
    assert_eq!(response["data"], json!({"stdout": "done\n", "stderr": "note\n"}));
}

#[tokio::test]
#[serial]
async fn failed_backup_reports_the_exit_code() {
    let app = TestApp::new();
    app.script("mysql-backup-schema-data.sh", "echo 'access denied' >&2; exit 3");

    let (status, response) = app.call("POST", "/db/backup", Some(backup_body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["msg"], "Backup failed");
    assert_eq!(
        response["data"],
        json!({"stdout": "", "stderr": "access denied\n", "returncode": 3})
    );
}

#[tokio::test]
#[serial]
async fn timed_out_backup_is_distinct_from_a_failed_exit() {
    let mut app = TestApp::new();
    app.script_timeout = Duration::from_millis(300);
    app.script("mysql-backup-schema-data.sh", "exec sleep 30");

    let (status, response) = app.call("POST", "/db/backup", Some(backup_body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["msg"], "Backup failed: execution timed out");
    assert_eq!(response["data"]["returncode"], -1);
    assert_eq!(response["data"]["stderr"], "execution timed out");
}

#[tokio::test]
#[serial]
async fn restore_without_script_reports_missing_script() {
    let app = TestApp::new();

    let body = json!({
        "backup_dir": "/data/backup/mysql/shop_20240115_093000",
        "target_db": "shop_copy",
        "host": "db.internal",
        "user": "restore",
        "password": "s3cret"
    });
    let (status, response) = app.call("POST", "/db/restore", Some(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["msg"], "Restore failed");
    assert_eq!(response["data"]["returncode"], -1);
    assert!(response["data"]["stderr"]
        .as_str()
        .unwrap()
        .contains("mysql-restore-schema-data.sh"));
}

#[tokio::test]
#[serial]
async fn restore_requires_its_fields() {
    let app = TestApp::new();
    let (status, response) = app
        .call("POST", "/db/restore", Some(json!({"target_db": "shop"})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response["msg"],
        "Missing required parameters: backup_dir, target_db, host, user, password"
    );
}

#[tokio::test]
async fn connection_test_requires_host_and_user() {
    let app = TestApp::new();
    let (status, response) = app
        .call("POST", "/db/test-connection", Some(json!({"host": "  "})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["msg"], "Missing host or user");
}

#[tokio::test]
#[serial]
async fn unresponsive_client_reports_a_connection_timeout() {
    let mut app = TestApp::new();
    let client = app.dir.path().join("fake-mysql");
    write_executable(&client, "exec sleep 30");
    app.mysql_client = Some(client.display().to_string());
    app.probe_timeout = Duration::from_millis(300);

    let body = json!({"host": "db.internal", "user": "probe", "password": "s3cret"});
    let (status, response) = app.call("POST", "/db/test-connection", Some(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response,
        json!({"code": 500, "msg": "Connection timed out", "data": null})
    );
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/db/backup")
        .header("content-type", "application/json")
        .body(Body::from("{\"host\": "))
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_filters_and_sorts_newest_first() {
    let app = TestApp::new();
    app.backup_dir("shop_20240115_093000", &[("backup.log", "12345")]);
    app.backup_dir("shop_20240301_120000", &[]);
    app.backup_dir("blog_20240201_000000", &[]);
    app.backup_dir("not-a-backup", &[]);
    fs::write(app.backup_root().join("shop_20240401_000000"), "a file").unwrap();

    let (status, response) = app.call("GET", "/db/backups?database=shop", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["total"], 2);
    let items = response["data"]["items"].as_array().unwrap();
    assert_eq!(items[0]["dirName"], "shop_20240301_120000");
    assert_eq!(items[1]["dirName"], "shop_20240115_093000");
    assert_eq!(items[1]["database"], "shop");
    assert_eq!(items[1]["backupTime"], "2024-01-15 09:30:00");
    assert_eq!(items[1]["size"], 5);
    assert_eq!(
        items[1]["backupDir"],
        app.backup_root()
            .join("shop_20240115_093000")
            .display()
            .to_string()
    );

    let (_, response) = app.call("GET", "/db/backups", None).await;
    assert_eq!(response["data"]["total"], 3);
}

#[tokio::test]
async fn logs_are_read_or_reported_missing() {
    let app = TestApp::new();
    app.backup_dir("shop_20240115_093000", &[("backup.log", "dump finished\n")]);

    let (status, response) = app
        .call("GET", "/db/backups/shop_20240115_093000/log", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response["data"],
        json!({"content": "dump finished\n", "exists": true})
    );

    let (status, response) = app
        .call("GET", "/db/backups/shop_20240115_093000/log?type=restore", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response["data"],
        json!({"content": "(log file not generated yet)", "exists": false})
    );

    let (status, _) = app
        .call("GET", "/db/backups/shop_20240115_093000/log?type=archive", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tables_and_views_are_split() {
    let app = TestApp::new();
    app.backup_dir(
        "shop_20240115_093000",
        &[
            ("schema/orders.sql", ""),
            ("schema/users.sql", ""),
            ("schema/order_totals.sql", ""),
            ("schema/.views", "order_totals\n\n"),
            ("schema/notes.txt", ""),
        ],
    );

    let (status, response) = app
        .call("GET", "/db/backups/shop_20240115_093000/tables", None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response["data"],
        json!({"tables": ["orders", "users"], "views": ["order_totals"]})
    );
}

#[tokio::test]
async fn traversal_names_are_rejected() {
    let app = TestApp::new();
    fs::create_dir_all(app.dir.path().join("etc_20240115_093000")).unwrap();

    let (status, response) = app
        .call("DELETE", "/db/backups/..%2Fetc_20240115_093000", None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["msg"], "Invalid backup directory name");
    assert!(app.dir.path().join("etc_20240115_093000").exists());
}

#[tokio::test]
async fn deleted_backups_disappear_from_the_listing() {
    let app = TestApp::new();
    app.backup_dir("shop_20240115_093000", &[("schema/orders.sql", "")]);

    let (status, response) = app
        .call("DELETE", "/db/backups/shop_20240115_093000", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"], Value::Null);

    let (_, response) = app.call("GET", "/db/backups", None).await;
    assert_eq!(response["data"]["total"], 0);

    let (status, _) = app
        .call("DELETE", "/db/backups/shop_20240115_093000", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
