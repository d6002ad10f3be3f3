use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_loadout")
}

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("loadout-{name}-{stamp}.{extension}"))
}

fn write_fixture(name: &str, extension: &str, contents: &str) -> PathBuf {
    let path = unique_temp_path(name, extension);
    fs::write(&path, contents).expect("fixture should be writable");
    path
}

const CATALOG: &str = r#"[
  { "id": "X", "name": "Power Up", "cost": 3, "effect": "Increases damage" },
  { "id": "Y", "name": "Iron Skin", "cost": 2, "effect": "Reduces damage taken" },
  { "id": "Z", "name": "Focus", "cost": 1, "effect": "Ki cost" },
  { "id": "W", "name": "Scouter", "cost": 1, "effect": "", "type": "item" }
]"#;

const CORPUS: &str = r#"{ "characters": [
  { "character": "Goku", "matches": [
    { "capsules": ["X", "Y"], "won": true, "damageDealt": 1200, "damageTaken": 600,
      "hpRemaining": 100, "hpMax": 400, "battleTime": 80, "aiStrategy": "Rush" },
    { "capsules": ["X", "Z"], "won": false, "damageDealt": 900, "damageTaken": 700,
      "hpRemaining": 0, "hpMax": 400, "battleTime": 95, "aiStrategy": "Rush" },
    { "capsules": ["Y", "Z"], "won": true, "damageDealt": 1000, "damageTaken": 500,
      "hpRemaining": 250, "hpMax": 400, "battleTime": 70 }
  ] }
] }"#;

struct Fixtures {
    catalog: PathBuf,
    corpus: PathBuf,
}

impl Fixtures {
    fn new(name: &str) -> Self {
        Self {
            catalog: write_fixture(&format!("{name}-catalog"), "json", CATALOG),
            corpus: write_fixture(&format!("{name}-corpus"), "json", CORPUS),
        }
    }

    fn run(&self, args: &[&str]) -> std::process::Output {
        let mut command = Command::new(bin());
        command.args(args);
        command
            .arg("--catalog")
            .arg(&self.catalog)
            .arg("--corpus")
            .arg(&self.corpus)
            .env_remove("LOADOUT_CONFIG")
            .env("RUST_LOG", "warn");
        command.output().expect("binary should run")
    }
}

impl Drop for Fixtures {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.catalog);
        let _ = fs::remove_file(&self.corpus);
    }
}

fn json(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("command should emit json")
}

#[test]
fn analyze_emits_performance_json() {
    let fixtures = Fixtures::new("analyze");
    let output = fixtures.run(&["analyze"]);

    assert_eq!(output.status.code(), Some(0));
    let payload = json(&output);
    assert_eq!(payload["counted_matches"], 3);
    assert_eq!(payload["capsules"], 3);
    assert_eq!(payload["top_capsules"].as_array().map(Vec::len), Some(3));
    assert!(payload["ai_compatibility"]["Rush"]["X"]["usage"].is_number());
}

#[test]
fn recommend_is_reproducible_for_a_seed() {
    let fixtures = Fixtures::new("recommend");
    let args = ["recommend", "--seed", "17", "--workers", "2"];
    let first = fixtures.run(&args);
    let second = fixtures.run(&args);

    assert_eq!(first.status.code(), Some(0));
    let first = json(&first);
    assert_eq!(first, json(&second));
    assert_eq!(first["seed"], 17);
    let builds = first["builds"].as_array().expect("builds array");
    assert!(!builds.is_empty());
    for build in builds {
        assert!(build["total_cost"].as_u64().expect("cost") <= 20);
        assert_eq!(build["valid"], true);
    }
}

#[test]
fn check_exits_nonzero_for_invalid_build() {
    let fixtures = Fixtures::new("check");
    let ruleset = write_fixture("check-ruleset", "yaml", "maxCost: 5\nmaxCapsules: 7\n");
    let output = fixtures.run(&[
        "check",
        "--capsules",
        "X,Y,Z",
        "--ruleset",
        ruleset.to_str().expect("utf-8 temp path"),
    ]);
    let _ = fs::remove_file(&ruleset);

    assert_eq!(output.status.code(), Some(1));
    let payload = json(&output);
    assert_eq!(payload["validation"]["valid"], false);
    assert_eq!(payload["validation"]["violations"]["cost_exceeded"], true);
    assert_eq!(payload["validation"]["remaining_cost"], -1);
}

#[test]
fn impossible_ruleset_file_is_usage_error() {
    let fixtures = Fixtures::new("impossible-ruleset");
    for (name, contents, message) in [
        ("no-slots", "maxCapsules: 0\n", "maxCapsules must be greater than 0"),
        ("inverted-cost", "maxCost: 5\nminCost: 30\n", "minCost (30) exceeds"),
    ] {
        let ruleset = write_fixture(name, "yaml", contents);
        let output = fixtures.run(&[
            "recommend",
            "--seed",
            "3",
            "--ruleset",
            ruleset.to_str().expect("utf-8 temp path"),
        ]);
        let _ = fs::remove_file(&ruleset);

        assert_eq!(output.status.code(), Some(2), "{name}");
        assert!(output.stdout.is_empty(), "{name}");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains(message), "{name}: {stderr}");
    }
}

#[test]
fn suggest_lists_additions() {
    let fixtures = Fixtures::new("suggest");
    let output = fixtures.run(&["suggest", "--capsules", "X"]);

    assert_eq!(output.status.code(), Some(0));
    let payload = json(&output);
    let ids: Vec<&str> = payload["suggestions"]
        .as_array()
        .expect("suggestions array")
        .iter()
        .filter_map(|entry| entry["capsule"]["id"].as_str())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(!ids.contains(&"X"));
    assert!(!ids.contains(&"W"));
}

#[test]
fn classify_single_effect() {
    let output = Command::new(bin())
        .args(["classify", "--effect", "Ki blast damage up"])
        .env_remove("LOADOUT_CONFIG")
        .output()
        .expect("classify should run");

    assert_eq!(output.status.code(), Some(0));
    let payload = json(&output);
    assert_eq!(payload["build_type"]["primary"], "ki-blast");
    assert_eq!(payload["archetype"]["primary"], "technical");
}

#[test]
fn validate_reports_unknown_capsules() {
    let corpus = r#"[{ "character": "Goku", "matches": [
        { "capsules": ["X", "Ghost"], "won": true, "battleTime": 10 }
    ] }]"#;
    let catalog = write_fixture("validate-catalog", "json", CATALOG);
    let corpus = write_fixture("validate-corpus", "json", corpus);
    let output = Command::new(bin())
        .arg("validate")
        .arg("--catalog")
        .arg(&catalog)
        .arg("--corpus")
        .arg(&corpus)
        .env_remove("LOADOUT_CONFIG")
        .output()
        .expect("validate should run");
    let _ = fs::remove_file(&catalog);
    let _ = fs::remove_file(&corpus);

    assert_eq!(output.status.code(), Some(0));
    let payload = json(&output);
    let messages: Vec<&str> = payload["corpus"]["diagnostics"]
        .as_array()
        .expect("corpus diagnostics")
        .iter()
        .filter_map(|diag| diag["message"].as_str())
        .collect();
    assert!(messages.iter().any(|message| message.contains("Ghost")));
}

#[test]
fn missing_catalog_is_usage_error() {
    let output = Command::new(bin())
        .arg("analyze")
        .current_dir(std::env::temp_dir())
        .env_remove("LOADOUT_CONFIG")
        .output()
        .expect("analyze should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no catalog given"));
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let output = Command::new(bin())
        .arg("explode")
        .output()
        .expect("binary should run");
    assert_eq!(output.status.code(), Some(2));
}
