use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::ptr::NonNull;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::serialize::OwnedData;
use rusqlite::{Connection, DatabaseName};

use moodlog_core::storage::encryption::DiaryKey;

const PASSPHRASE: &str = "test-passphrase-secure-123";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_moodlog"))
}

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time")
        .as_nanos()
}

fn temp_diary_path(prefix: &str) -> PathBuf {
    let filename = format!("{}_{}_{}.moodlog", prefix, std::process::id(), unique_suffix());
    std::env::temp_dir().join(filename)
}

fn temp_xdg_dirs(prefix: &str) -> (PathBuf, PathBuf) {
    let base = std::env::temp_dir().join(format!(
        "m{}_{}_{}",
        prefix,
        std::process::id(),
        unique_suffix()
    ));
    let config = base.join("config");
    let data = base.join("data");
    std::fs::create_dir_all(&config).expect("create config dir");
    std::fs::create_dir_all(&data).expect("create data dir");
    (config, data)
}

/// A diary plus isolated XDG homes, so tests never touch the real config.
struct Sandbox {
    diary: PathBuf,
    config_home: PathBuf,
    data_home: PathBuf,
}

impl Sandbox {
    fn new(prefix: &str) -> Self {
        let (config_home, data_home) = temp_xdg_dirs(prefix);
        Self {
            diary: temp_diary_path(prefix),
            config_home,
            data_home,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(bin());
        cmd.env("XDG_CONFIG_HOME", &self.config_home)
            .env("XDG_DATA_HOME", &self.data_home)
            .env("MOODLOG_PASSPHRASE", PASSPHRASE)
            .env("NO_COLOR", "1")
            .env_remove("MOODLOG_PATH")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .arg("--diary")
            .arg(&self.diary)
            .output()
            .expect("run moodlog")
    }

    fn init(&self) {
        let output = self
            .command()
            .arg("init")
            .arg(&self.diary)
            .output()
            .expect("run init");
        assert!(
            output.status.success(),
            "init failed: stdout={}, stderr={}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn add(&self, body: &str) -> String {
        let output = self.run(&["add", "--body", body, "--json"]);
        assert!(
            output.status.success(),
            "add failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let value: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("parse add json");
        value
            .get("id")
            .and_then(|v| v.as_str())
            .expect("entry id")
            .to_string()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn open_sqlite_from_file(path: &Path, passphrase: &str) -> Connection {
    let encrypted = std::fs::read(path).expect("read should succeed");
    let plaintext = DiaryKey::new(passphrase)
        .unseal(&encrypted)
        .expect("unseal should succeed");

    let size: i32 = plaintext
        .len()
        .try_into()
        .expect("payload length should fit in sqlite3_malloc");
    let raw = unsafe { rusqlite::ffi::sqlite3_malloc(size) as *mut u8 };
    if raw.is_null() {
        panic!("sqlite3_malloc returned null");
    }

    let owned = unsafe {
        std::ptr::copy_nonoverlapping(plaintext.as_ptr(), raw, plaintext.len());
        let ptr = NonNull::new(raw).expect("nonnull");
        OwnedData::from_raw_nonnull(ptr, plaintext.len())
    };

    let mut conn = Connection::open_in_memory().expect("open_in_memory should succeed");
    conn.deserialize(DatabaseName::Main, owned, false)
        .expect("deserialize should succeed");
    conn
}

#[test]
fn test_cli_init_add_list_show() {
    let sandbox = Sandbox::new("flow");
    sandbox.init();

    let add = sandbox.run(&["add", "--body", "오늘은 정말 행복해"]);
    assert!(add.status.success());
    let output = stdout(&add);
    assert!(output.contains("Saved entry"));
    assert!(output.contains("[행복]"));
    assert!(output.contains("Happy"));

    let list = sandbox.run(&["list", "--json"]);
    assert!(list.status.success());
    let value: serde_json::Value = serde_json::from_slice(&list.stdout).expect("parse list json");
    let array = value.as_array().expect("list output array");
    assert_eq!(array.len(), 1);
    assert_eq!(array[0]["emotion"], "happy");
    assert_eq!(array[0]["emotion_name"], "행복");
    let entry_id = array[0]["id"].as_str().expect("entry id");

    let show = sandbox.run(&["show", &entry_id[..8]]);
    assert!(show.status.success());
    let output = stdout(&show);
    assert!(output.contains("오늘은 정말 행복해"));
    assert!(output.contains("Emotion: [행복] (happy)"));
}

#[test]
fn test_cli_add_json_reports_classification() {
    let sandbox = Sandbox::new("addjson");
    sandbox.init();

    let output = sandbox.run(&["add", "--body", "짜증나 화나", "--json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("parse json");
    assert_eq!(value["emotion"], "angry");
    assert_eq!(value["emotion_name"], "분노");
}

#[test]
fn test_cli_list_filters_by_emotion() {
    let sandbox = Sandbox::new("filter");
    sandbox.init();
    sandbox.add("너무 슬퍼");
    sandbox.add("좋아");
    sandbox.add("그냥 그런 하루");

    let list = sandbox.run(&["list", "--emotion", "sad", "--json"]);
    assert!(list.status.success());
    let value: serde_json::Value = serde_json::from_slice(&list.stdout).expect("parse json");
    let array = value.as_array().expect("array");
    assert_eq!(array.len(), 1);
    assert_eq!(array[0]["text"], "너무 슬퍼");

    let bad = sandbox.run(&["list", "--emotion", "furious"]);
    assert!(!bad.status.success());
    assert!(String::from_utf8_lossy(&bad.stderr).contains("furious"));
}

#[test]
fn test_cli_list_plain_format() {
    let sandbox = Sandbox::new("plain");
    sandbox.init();
    let id = sandbox.add("졸려");

    let list = sandbox.run(&["list", "--format", "plain"]);
    assert!(list.status.success());
    let output = stdout(&list);
    let line = output.lines().next().expect("one line");
    assert!(line.starts_with(&id));
    assert!(line.contains(" tired "));
    assert!(line.ends_with("졸려"));

    let conflict = sandbox.run(&["list", "--format", "plain", "--json"]);
    assert!(!conflict.status.success());
}

#[test]
fn test_cli_list_empty_message() {
    let sandbox = Sandbox::new("empty");
    sandbox.init();

    let list = sandbox.run(&["list"]);
    assert!(list.status.success());
    assert!(stdout(&list).contains("No entries yet."));
}

#[test]
fn test_cli_search_and_show_json() {
    let sandbox = Sandbox::new("search");
    sandbox.init();
    sandbox.add("주말 여행이 기대돼");
    sandbox.add("산책이 좋아");

    let search = sandbox.run(&["search", "여행", "--json"]);
    assert!(search.status.success());
    let value: serde_json::Value = serde_json::from_slice(&search.stdout).expect("parse json");
    let array = value.as_array().expect("array");
    assert_eq!(array.len(), 1);
    assert_eq!(array[0]["emotion"], "excited");
    let entry_id = array[0]["id"].as_str().expect("entry id");

    let show = sandbox.run(&["show", entry_id, "--json"]);
    assert!(show.status.success());
    let value: serde_json::Value = serde_json::from_slice(&show.stdout).expect("parse json");
    assert_eq!(value["emotion_name"], "신남");
    assert_eq!(value["text"], "주말 여행이 기대돼");
}

#[test]
fn test_cli_show_unknown_id() {
    let sandbox = Sandbox::new("unknown");
    sandbox.init();
    sandbox.add("좋아");

    let show = sandbox.run(&["show", "00000000-0000-0000-0000-000000000000"]);
    assert!(!show.status.success());
    assert!(String::from_utf8_lossy(&show.stderr).contains("Entry not found"));
}

#[test]
fn test_cli_analyze_does_not_need_a_diary() {
    let sandbox = Sandbox::new("analyze");

    let output = sandbox.run(&["analyze", "좋아 행복 슬퍼", "--json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("parse json");
    assert_eq!(value["emotion"], "happy");
    assert_eq!(value["scores"]["happy"], 2);
    assert_eq!(value["style"]["name"], "행복");
    assert!(!sandbox.diary.exists());
}

#[test]
fn test_cli_analyze_tie_goes_to_first_emotion() {
    let sandbox = Sandbox::new("tie");

    let output = sandbox.run(&["analyze", "슬퍼 좋아", "--quiet"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "happy");

    let output = sandbox.run(&["analyze", "오늘 날씨", "--quiet"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "neutral");
}

#[test]
fn test_cli_analyze_follow_rescores_each_line() {
    let sandbox = Sandbox::new("follow");

    let mut child = sandbox
        .command()
        .args(["analyze", "--follow", "--json"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn analyze");
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all("슬퍼\n좋아\n좋아\n".as_bytes())
            .expect("write stdin");
    }
    let output = child.wait_with_output().expect("wait analyze");
    assert!(output.status.success());

    let emotions: Vec<String> = stdout(&output)
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("parse line");
            value["emotion"].as_str().expect("emotion").to_string()
        })
        .collect();
    assert_eq!(emotions, vec!["sad", "happy", "happy"]);
}

#[test]
fn test_cli_analyze_follow_quiet_prints_changes_only() {
    let sandbox = Sandbox::new("followq");

    let mut child = sandbox
        .command()
        .args(["analyze", "--follow", "--quiet"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn analyze");
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all("오늘\n슬퍼\n좋아\n좋아\n".as_bytes())
            .expect("write stdin");
    }
    let output = child.wait_with_output().expect("wait analyze");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "neutral\nsad\nhappy\n");
}

#[test]
fn test_cli_broken_config_spares_diaryless_commands() {
    let sandbox = Sandbox::new("badcfg");
    let config_dir = sandbox.config_home.join("moodlog");
    std::fs::create_dir_all(&config_dir).expect("create config dir");
    std::fs::write(config_dir.join("config.toml"), "not = [valid").expect("write config");

    let analyze = sandbox
        .command()
        .args(["analyze", "좋아", "--quiet"])
        .output()
        .expect("run analyze");
    assert!(
        analyze.status.success(),
        "analyze failed: {}",
        String::from_utf8_lossy(&analyze.stderr)
    );
    assert_eq!(stdout(&analyze).trim(), "happy");

    for args in [&["emotions"][..], &["completions", "bash"][..]] {
        let output = sandbox.command().args(args).output().expect("run moodlog");
        assert!(output.status.success(), "{:?} failed", args);
    }

    // Commands that resolve the diary through the config still report it.
    let list = sandbox.command().arg("list").output().expect("run list");
    assert!(!list.status.success());
    assert!(String::from_utf8_lossy(&list.stderr).contains("Failed to parse config"));
}

#[test]
fn test_cli_emotions_json() {
    let sandbox = Sandbox::new("emotions");

    let output = sandbox.run(&["emotions", "--json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("parse json");
    let array = value.as_array().expect("array");
    assert_eq!(array.len(), 7);
    assert_eq!(array[0]["emotion"], "neutral");
    assert_eq!(array[6]["emotion"], "tired");
    assert_eq!(array[6]["style"]["music"]["title"], "Coffee");
}

#[test]
fn test_cli_stats_json() {
    let sandbox = Sandbox::new("stats");
    sandbox.init();
    sandbox.add("좋아");
    sandbox.add("행복해");
    sandbox.add("피곤해");

    let output = sandbox.run(&["stats", "--json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("parse json");
    let rows = value.as_array().expect("array");
    let order: Vec<&str> = rows
        .iter()
        .map(|row| row["emotion"].as_str().expect("emotion"))
        .collect();
    assert_eq!(
        order,
        vec!["neutral", "happy", "sad", "angry", "peaceful", "excited", "tired"]
    );
    assert_eq!(rows[0]["count"], 0);
    assert_eq!(rows[1]["count"], 2);
    assert_eq!(rows[6]["count"], 1);
}

#[test]
fn test_cli_last_and_since_conflict() {
    let sandbox = Sandbox::new("window");
    sandbox.init();

    for command in ["list", "stats"] {
        let output = sandbox.run(&[command, "--last", "7d", "--since", "2024-01-01"]);
        assert!(!output.status.success(), "{} accepted both windows", command);
        assert!(String::from_utf8_lossy(&output.stderr).contains("--since"));
    }
}

#[test]
fn test_cli_export_jsonl() {
    let sandbox = Sandbox::new("export");
    sandbox.init();
    sandbox.add("설레는 밤");
    sandbox.add("너무 즐거워");

    let output = sandbox.run(&["export", "--format", "jsonl"]);
    assert!(output.status.success());
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).expect("parse line");
        assert_eq!(value["emotion"], "excited");
    }

    let bad = sandbox.run(&["export", "--format", "csv"]);
    assert!(!bad.status.success());
}

#[test]
fn test_cli_check_ok() {
    let sandbox = Sandbox::new("checkok");
    sandbox.init();
    sandbox.add("좋아");

    let check = sandbox.run(&["check"]);
    assert!(check.status.success());
    assert!(stdout(&check).contains("Integrity check: OK"));
}

#[test]
fn test_cli_check_failure() {
    let sandbox = Sandbox::new("checkfail");
    sandbox.init();
    let entry_id = sandbox.add("좋아");

    let conn = open_sqlite_from_file(&sandbox.diary, PASSPHRASE);
    conn.execute(
        "UPDATE entries SET emotion = 'furious' WHERE id = ?",
        [&entry_id],
    )
    .expect("corrupt emotion");
    let data = conn.serialize(DatabaseName::Main).expect("serialize");
    let encrypted = DiaryKey::new(PASSPHRASE)
        .seal(data.as_ref())
        .expect("seal");
    std::fs::write(&sandbox.diary, encrypted).expect("write");

    let check = sandbox.run(&["check"]);
    assert!(!check.status.success());
    let output = String::from_utf8_lossy(&check.stderr);
    assert!(output.contains("Integrity check: FAILED"));
}

#[test]
fn test_cli_wrong_passphrase() {
    let sandbox = Sandbox::new("wrongpw");
    sandbox.init();

    let list = sandbox
        .command()
        .arg("list")
        .arg("--diary")
        .arg(&sandbox.diary)
        .env("MOODLOG_PASSPHRASE", "not-the-right-one")
        .output()
        .expect("run list");
    assert!(!list.status.success());
    assert!(String::from_utf8_lossy(&list.stderr).contains("Incorrect passphrase"));
}

#[test]
fn test_cli_missing_diary_message() {
    let sandbox = Sandbox::new("missing");

    let list = sandbox.run(&["list"]);
    assert!(!list.status.success());
    assert!(String::from_utf8_lossy(&list.stderr).contains("moodlog init"));
}

#[test]
fn test_cli_init_writes_default_config() {
    let sandbox = Sandbox::new("config");
    sandbox.init();

    let config_path = sandbox.config_home.join("moodlog").join("config.toml");
    let contents = std::fs::read_to_string(&config_path).expect("read config");
    assert!(contents.contains("[diary]"));
    assert!(contents.contains(&*sandbox.diary.to_string_lossy()));

    // Commands without --diary find the diary through the config.
    let list = sandbox
        .command()
        .args(["list", "--json"])
        .output()
        .expect("run list");
    assert!(list.status.success());
}

#[test]
fn test_cli_init_refuses_existing_diary() {
    let sandbox = Sandbox::new("twice");
    sandbox.init();

    let again = sandbox
        .command()
        .arg("init")
        .arg(&sandbox.diary)
        .output()
        .expect("run init");
    assert!(!again.status.success());
}

#[test]
fn test_cli_init_quiet_suppresses_output() {
    let sandbox = Sandbox::new("quiet");

    let output = sandbox
        .command()
        .arg("init")
        .arg(&sandbox.diary)
        .arg("--quiet")
        .output()
        .expect("run init");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_cli_backup_copies_diary() {
    let sandbox = Sandbox::new("backup");
    sandbox.init();
    sandbox.add("좋아");

    let destination = temp_diary_path("backup_copy");
    let backup = sandbox.run(&["backup", &destination.to_string_lossy()]);
    assert!(backup.status.success());
    assert_eq!(
        std::fs::read(&destination).expect("read backup"),
        std::fs::read(&sandbox.diary).expect("read diary")
    );

    let again = sandbox.run(&["backup", &destination.to_string_lossy()]);
    assert!(!again.status.success());
}

#[test]
fn test_cli_completions() {
    let sandbox = Sandbox::new("compl");
    let output = sandbox.run(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("moodlog"));
}
