//! Integration tests for the fast-templater CLI against a temporary vault.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const MEETING_TEMPLATE: &str =
    "---\nfast-templater-config: meeting\ntags: [meeting]\n---\n## Agenda\n";
const TODAY_NOTE: &str = "---\ntitle: Today\n---\nNotes so far\n";

/// Create a vault with one template and one note.
fn setup_vault() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("Templates")).unwrap();
    fs::create_dir_all(dir.path().join("Notes")).unwrap();
    fs::write(dir.path().join("Templates/Meeting.md"), MEETING_TEMPLATE).unwrap();
    fs::write(dir.path().join("Templates/Plain.md"), "Just text\n").unwrap();
    fs::write(dir.path().join("Notes/Today.md"), TODAY_NOTE).unwrap();
    dir
}

/// Run the CLI and return (stdout, stderr, exit code).
fn run_cli(vault: &Path, args: &[&str]) -> (String, String, i32) {
    let binary = env!("CARGO_BIN_EXE_fast-templater");

    let output = Command::new(binary)
        .arg("--vault")
        .arg(vault)
        .args(args)
        // Keep the user's own config file out of the tests.
        .env("XDG_CONFIG_HOME", vault.join(".config"))
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute fast-templater");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn create_meeting_preset(vault: &Path) {
    let (stdout, stderr, code) = run_cli(
        vault,
        &[
            "presets",
            "create",
            "Meeting",
            "--field",
            "attendees:multi-select:Attendees:alice|bob",
            "--field",
            "status:select:Status:draft|done:draft",
            "--field",
            "due:date:Due",
        ],
    );
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("\"id\": \"meeting\""));
}

fn settings_json(vault: &Path) -> serde_json::Value {
    let path = vault.join(".obsidian/plugins/fast-templater/data.json");
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

mod presets_command {
    use super::*;

    #[test]
    fn create_and_list() {
        let vault = setup_vault();
        create_meeting_preset(vault.path());

        let (stdout, _, code) = run_cli(vault.path(), &["presets", "list"]);
        assert_eq!(code, 0);
        let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["presets"][0]["fields"], 3);

        let settings = settings_json(vault.path());
        assert_eq!(settings["frontmatterPresets"][0]["name"], "Meeting");
        assert_eq!(settings["frontmatterPresets"][0]["fields"][0]["type"], "multi-select");
    }

    #[test]
    fn duplicate_id_is_a_validation_error() {
        let vault = setup_vault();
        create_meeting_preset(vault.path());
        let (_, stderr, code) = run_cli(
            vault.path(),
            &["presets", "create", "Other", "--id", "meeting"],
        );
        assert_eq!(code, 4);
        assert!(stderr.contains("meeting"));
    }

    #[test]
    fn show_missing_preset() {
        let vault = setup_vault();
        let (_, stderr, code) = run_cli(vault.path(), &["presets", "show", "nope"]);
        assert_eq!(code, 3);
        assert!(stderr.contains("Preset not found"));
    }

    #[test]
    fn suggest_id_does_not_persist() {
        let vault = setup_vault();
        create_meeting_preset(vault.path());
        let (stdout, _, code) = run_cli(vault.path(), &["presets", "suggest-id", "Meeting"]);
        assert_eq!(code, 0);
        assert!(stdout.contains("\"id\": \"meeting-2\""));
        assert_eq!(
            settings_json(vault.path())["frontmatterPresets"]
                .as_array()
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn export_then_import_renames_collisions() {
        let vault = setup_vault();
        create_meeting_preset(vault.path());

        let export_path = vault.path().join("presets.json");
        let (_, _, code) = run_cli(
            vault.path(),
            &["presets", "export", "--output", export_path.to_str().unwrap()],
        );
        assert_eq!(code, 0);
        let exported: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&export_path).unwrap()).unwrap();
        assert_eq!(exported["type"], "fast-templater-presets");
        assert_eq!(exported["version"], 1);

        let (stdout, _, code) = run_cli(
            vault.path(),
            &["presets", "import", export_path.to_str().unwrap()],
        );
        assert_eq!(code, 0);
        let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(report["strategy"], "merge");
        assert_eq!(report["renamed"][0]["from"], "meeting");
        assert_eq!(report["renamed"][0]["to"], "meeting-2");
    }

    #[test]
    fn invalid_import_changes_nothing() {
        let vault = setup_vault();
        create_meeting_preset(vault.path());
        let bad = vault.path().join("bad.json");
        fs::write(
            &bad,
            r#"[{"id": "x", "name": "X", "fields": [{"key": "k", "type": "number", "label": "K"}]}]"#,
        )
        .unwrap();

        let (_, _, code) = run_cli(
            vault.path(),
            &["presets", "import", "--replace", bad.to_str().unwrap()],
        );
        assert_eq!(code, 5);
        assert_eq!(settings_json(vault.path())["frontmatterPresets"][0]["id"], "meeting");
    }
}

mod templates_command {
    use super::*;

    #[test]
    fn list_templates() {
        let vault = setup_vault();
        let (stdout, _, code) = run_cli(vault.path(), &["templates", "list"]);
        assert_eq!(code, 0);
        assert!(stdout.contains("Templates/Meeting.md"));
        assert!(stdout.contains("Templates/Plain.md"));
        assert!(!stdout.contains("Notes/Today.md"));
    }

    #[test]
    fn match_prefers_bound_preset() {
        let vault = setup_vault();
        create_meeting_preset(vault.path());
        let (stdout, _, code) = run_cli(vault.path(), &["templates", "match", "Meeting"]);
        assert_eq!(code, 0);
        let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(json["bound"][0], "meeting");
        assert_eq!(json["matches"][0]["id"], "meeting");
        assert_eq!(json["matches"][0]["tier"], "strong");
    }

    #[test]
    fn missing_template() {
        let vault = setup_vault();
        let (_, _, code) = run_cli(vault.path(), &["templates", "match", "Nothing"]);
        assert_eq!(code, 2);
    }
}

mod parse_command {
    use super::*;

    #[test]
    fn parse_note() {
        let vault = setup_vault();
        let (stdout, _, code) = run_cli(vault.path(), &["parse", "Notes/Today"]);
        assert_eq!(code, 0);
        let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(json["frontmatter"]["title"], "Today");
        assert_eq!(json["body"], "Notes so far\n");
        assert_eq!(json["position"]["end"]["line"], 2);
    }
}

mod insert_command {
    use super::*;

    #[test]
    fn insert_merges_frontmatter() {
        let vault = setup_vault();
        create_meeting_preset(vault.path());

        let (stdout, stderr, code) = run_cli(
            vault.path(),
            &[
                "insert",
                "Meeting",
                "--into",
                "Notes/Today",
                "--set",
                "attendees=alice",
                "--set",
                "status=done",
            ],
        );
        assert_eq!(code, 0, "stderr: {stderr}");
        let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(json["frontmatter_merged"], true);
        assert_eq!(json["preset_id"], "meeting");

        let note = fs::read_to_string(vault.path().join("Notes/Today.md")).unwrap();
        assert_eq!(
            note,
            "---\nattendees:\n- alice\nstatus: done\ntitle: Today\ntags:\n- meeting\n---\n\nNotes so far\n## Agenda\n"
        );

        let settings = settings_json(vault.path());
        assert_eq!(settings["recentlyUsedTemplates"][0], "Templates/Meeting.md");
    }

    #[test]
    fn dry_run_leaves_note_alone() {
        let vault = setup_vault();
        let (stdout, _, code) = run_cli(
            vault.path(),
            &["insert", "Plain", "--into", "Notes/Today", "--line", "4", "--dry-run"],
        );
        assert_eq!(code, 0);
        let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(json["content"], "---\ntitle: Today\n---\nJust text\nNotes so far\n");
        assert_eq!(
            fs::read_to_string(vault.path().join("Notes/Today.md")).unwrap(),
            TODAY_NOTE
        );
    }

    #[test]
    fn invalid_date_aborts() {
        let vault = setup_vault();
        create_meeting_preset(vault.path());
        let (_, stderr, code) = run_cli(
            vault.path(),
            &["insert", "Meeting", "--into", "Notes/Today", "--set", "due=someday"],
        );
        assert_eq!(code, 4);
        assert!(stderr.contains("Invalid date for field 'Due'"));
        assert_eq!(
            fs::read_to_string(vault.path().join("Notes/Today.md")).unwrap(),
            TODAY_NOTE
        );
    }

    #[test]
    fn missing_note() {
        let vault = setup_vault();
        let (_, _, code) = run_cli(vault.path(), &["insert", "Plain", "--into", "Nope"]);
        assert_eq!(code, 2);
    }
}
