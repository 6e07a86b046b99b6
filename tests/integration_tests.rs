//! Integration tests for the srcc CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd,
//! against the sample records under `demos/`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to get an srcc command isolated from the user's configuration
fn srcc(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("srcc").unwrap();
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"))
        .env_remove("SRCC_DEFAULT_STAGE")
        .env_remove("SRCC_SURVIVAL_METHOD")
        .env_remove("SRCC_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

fn demo(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(path)
}

/// Write a project config into the temp directory
fn write_project_config(tmp: &TempDir, contents: &str) {
    let dir = tmp.path().join(".srcc");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.yaml"), contents).unwrap();
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("signet-ring-cell"))
        .stdout(predicate::str::contains("survival"))
        .stdout(predicate::str::contains("decide"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("srcc"));
}

#[test]
fn test_unknown_command_fails() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp).arg("gastroscopy").assert().failure();
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("srcc"));
}

// ============================================================================
// Stage Command Tests
// ============================================================================

#[test]
fn test_stage_csv_output() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["stage", "T3N1M0", "ypT4a N3b M0", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id,tnm,t,n,m,group,fallback\n"))
        .stdout(predicate::str::contains("T3N1M0,T3N1M0,T3,N1,M0,Stage II,no"))
        .stdout(predicate::str::contains("ypT4a N3b M0,T4aN3bM0,T4a,N3b,M0,Stage III,no"));
}

#[test]
fn test_stage_json_includes_group() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["stage", "T1N0M1a", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"stage_group\": \"Stage IV\""))
        .stdout(predicate::str::contains("\"input\": \"T1N0M1a\""));
}

#[test]
fn test_stage_ignores_text_after_metastasis() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["stage", "T3N1M0 R0", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("T3N1M0 R0,T3N1M0,T3,N1,M0,Stage II,no"));
}

#[test]
fn test_stage_unparsable_fails_without_default() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp).args(["stage", "garbage"]).assert().failure();
}

#[test]
fn test_stage_default_flag_substitutes() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["stage", "garbage", "--default-stage", "T2N0M0", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"fallback\": true"))
        .stdout(predicate::str::contains("\"stage_group\": \"Stage II\""));
}

#[test]
fn test_stage_default_from_project_config() {
    let tmp = TempDir::new().unwrap();
    write_project_config(&tmp, "default_stage: T4bN0M0\n");
    srcc(&tmp)
        .args(["stage", "unknown", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown,T4bN0M0,T4b,N0,M0,Stage III,yes"));
}

#[test]
fn test_stage_default_from_env() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .env("SRCC_DEFAULT_STAGE", "T1N0M0")
        .args(["stage", "n/a", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stage I,yes"));
}

// ============================================================================
// Survival / Effectiveness / Cohort Tests
// ============================================================================

#[test]
fn test_survival_summary_line() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("survival")
        .arg(demo("srcc"))
        .assert()
        .success()
        .stdout(predicate::str::contains("MONTHS"))
        .stdout(predicate::str::contains("6 cases, 3 events"));
}

#[test]
fn test_survival_json_counts() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("survival")
        .arg(demo("srcc/cohort.yaml"))
        .args(["--method", "kaplan-meier", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_cases\": 6"))
        .stdout(predicate::str::contains("\"events\": 3"));
}

#[test]
fn test_survival_by_stage() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("survival")
        .arg(demo("srcc"))
        .args(["--by-stage", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id,cases,events,median,1y,3y,5y\n"))
        .stdout(predicate::str::contains("Stage II,3,1,"))
        .stdout(predicate::str::contains("Stage IV,1,1,"));
}

#[test]
fn test_survival_missing_path_fails() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["survival", "no-such-dir"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_effectiveness_per_protocol() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("effectiveness")
        .arg(demo("srcc"))
        .args(["-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FLOT,3,66.7,33.3"))
        .stdout(predicate::str::contains("XELOX,1,"))
        .stdout(predicate::str::contains("Surgery Only,1,"));
}

#[test]
fn test_cohort_yaml_summary() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("cohort")
        .arg(demo("srcc"))
        .assert()
        .success()
        .stdout(predicate::str::contains("case_risks"));
}

#[test]
fn test_cohort_table_lists_cases() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("cohort")
        .arg(demo("srcc"))
        .args(["-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CASE_P001,"))
        .stdout(predicate::str::contains("CASE_P006_REV,"));
}

#[test]
fn test_out_of_range_case_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("bad.yaml");
    fs::write(
        &file,
        "patient_id: X1\nage: 150\ngender: M\ntnm_staging: T2N0M0\nhistology: Adenocarcinoma\n",
    )
    .unwrap();
    srcc(&tmp)
        .args(["cohort", "bad.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CASE_X1"));
}

// ============================================================================
// Surgery Tests
// ============================================================================

#[test]
fn test_surgery_analyze_single_case() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("gs.yaml");
    fs::write(
        &file,
        "patient_id: P9\ncase_id: GS-9\nage: 50\nasa_score: 1\ntumor_stage: T1\nnode_stage: N0\n\
         metastasis_stage: M0\nhistology: Adenocarcinoma\ngastrectomy_type: subtotal\n\
         surgical_approach: laparoscopic\n",
    )
    .unwrap();
    srcc(&tmp)
        .args(["surgery", "analyze", "gs.yaml", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"))
        .stdout(predicate::str::contains("\"case_id\": \"GS-9\""))
        .stdout(predicate::str::contains("surgical_risk_score"));
}

#[test]
fn test_surgery_analyze_cohort_as_table() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["surgery", "analyze"])
        .arg(demo("surgery/surgery_cases.yaml"))
        .args(["-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GS-001"))
        .stdout(predicate::str::contains("GS-004"))
        .stdout(predicate::str::contains("3 case(s)"));
}

#[test]
fn test_surgery_kpi_csv() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["surgery", "kpi"])
        .arg(demo("surgery"))
        .args(["-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id,r0,nodes,major,mortality,quality,grade\n"))
        .stdout(predicate::str::contains("GS-001,yes,31,no,"));
}

#[test]
fn test_surgery_cohort_summary() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["surgery", "cohort"])
        .arg(demo("surgery"))
        .args(["-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_cases\": 3"));
}

#[test]
fn test_surgery_schedule_defaults_to_table() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["surgery", "schedule"])
        .arg(demo("surgery"))
        .assert()
        .success()
        .stdout(predicate::str::contains("COMPLEXITY"))
        .stdout(predicate::str::contains("Utilization:"));
}

// ============================================================================
// FLOT Tests
// ============================================================================

#[test]
fn test_flot_analyze_csv() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["flot", "analyze"])
        .arg(demo("flot/flot_cases.yaml"))
        .args(["-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "id,completion,adherence,response,toxicity,tolerability,quality,surgery\n",
        ))
        .stdout(predicate::str::contains("FL-001,100.0,"))
        .stdout(predicate::str::contains("FL-002,62.5,"));
}

#[test]
fn test_flot_regimen_yaml() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["flot", "regimen"])
        .arg(demo("flot"))
        .assert()
        .success()
        .stdout(predicate::str::contains("dose_intensity"))
        .stdout(predicate::str::contains("FL-006"));
}

#[test]
fn test_flot_cohort_and_optimize() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["flot", "cohort"])
        .arg(demo("flot"))
        .args(["-f", "json"])
        .assert()
        .success();
    srcc(&tmp)
        .args(["flot", "optimize"])
        .arg(demo("flot"))
        .args(["-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("optimal_cycle_number"));
}

#[test]
fn test_flot_completed_exceeding_planned_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("flot.yaml"),
        "patient_id: P1\ncase_id: F1\ninitial_t_stage: T3\ninitial_n_stage: N1\n\
         initial_m_stage: M0\nplanned_cycles: 4\ncompleted_cycles: 6\n",
    )
    .unwrap();
    srcc(&tmp)
        .args(["flot", "cohort", "flot.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("F1"));
}

// ============================================================================
// Decision Tests
// ============================================================================

#[test]
fn test_decide_case() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["decide", "case"])
        .arg(demo("integrated/integrated_case.yaml"))
        .args(["-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"case_id\": \"INT-002\""))
        .stdout(predicate::str::contains("decision_class"))
        .stdout(predicate::str::contains("confidence_score"));
}

#[test]
fn test_decide_cohort_table() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["decide", "cohort"])
        .arg(demo("integrated"))
        .args(["-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id,class,sequence,risk,survival,qol,confidence\n"))
        .stdout(predicate::str::contains("INT-002,"));
}

#[test]
fn test_decide_optimize() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["decide", "optimize"])
        .arg(demo("integrated"))
        .args(["-f", "yaml"])
        .assert()
        .success();
}

// ============================================================================
// Import Tests
// ============================================================================

#[test]
fn test_import_writes_case_files() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("import")
        .arg(demo("registry.csv"))
        .args(["-o", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 4 of 4 rows"));

    let written = tmp.path().join("out/P101.yaml");
    assert!(written.exists());
    let yaml = fs::read_to_string(written).unwrap();
    assert!(yaml.contains("Signet Ring Cell Carcinoma"));
    assert!(yaml.contains("Épigastralgie"));
}

#[test]
fn test_import_then_validate_and_analyze() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("import")
        .arg(demo("registry.csv"))
        .args(["-o", "cases", "-q"])
        .assert()
        .success();

    srcc(&tmp)
        .args(["validate", "cases", "--kind", "srcc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All files passed validation!"));

    srcc(&tmp)
        .args(["cohort", "cases", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CASE_P104,"));
}

#[test]
fn test_import_dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("import")
        .arg(demo("registry.csv"))
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));
    assert!(!tmp.path().join("cases").exists());
}

#[test]
fn test_import_row_errors() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("bad.csv"),
        "patient_id,age,gender,tumor_stage\nP1,60,M,T2N0M0\nP2,61,F,nonsense\n",
    )
    .unwrap();

    srcc(&tmp)
        .args(["import", "bad.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 2"));

    srcc(&tmp)
        .args(["import", "bad.csv", "--skip-errors", "-o", "partial"])
        .assert()
        .success();
    assert!(tmp.path().join("partial/P1.yaml").exists());
    assert!(!tmp.path().join("partial/P2.yaml").exists());

    srcc(&tmp)
        .args(["import", "bad.csv", "--default-stage", "T1N0M0", "-o", "filled"])
        .assert()
        .success();
    assert!(tmp.path().join("filled/P2.yaml").exists());
}

#[test]
fn test_import_json_report() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("import")
        .arg(demo("registry.csv"))
        .args(["--dry-run", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_rows\": 4"))
        .stdout(predicate::str::contains("\"imported\": 4"))
        .stdout(predicate::str::contains("\"dry_run\": true"));
}

#[test]
fn test_import_template() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["import", "--template"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("patient_id,age,gender,tumor_stage"));
}

// ============================================================================
// Validate Tests
// ============================================================================

#[test]
fn test_validate_demos_pass() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .arg("validate")
        .arg(demo(""))
        .assert()
        .success()
        .stdout(predicate::str::contains("All files passed validation!"))
        .stdout(predicate::str::contains("(3 surgery)"));
}

#[test]
fn test_validate_reports_violations() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("surgery.yaml"),
        "patient_id: P1\ncase_id: GS-1\ntumor_stage: T9\nnode_stage: N0\nmetastasis_stage: M0\n\
         histology: Adenocarcinoma\ngastrectomy_type: total\nsurgical_approach: open\n",
    )
    .unwrap();
    srcc(&tmp)
        .args(["validate", "surgery.yaml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗"))
        .stderr(predicate::str::contains("Validation failed: 1 file has errors"));
}

#[test]
fn test_validate_skips_unknown_kind() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("notes.yaml"), "title: meeting\n").unwrap();
    srcc(&tmp)
        .args(["validate", "notes.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown record kind"));
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_keys() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["config", "keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_stage"))
        .stdout(predicate::str::contains("SRCC_SURVIVAL_METHOD"));
}

#[test]
fn test_config_show_key_from_project() {
    let tmp = TempDir::new().unwrap();
    write_project_config(&tmp, "survival_method: kaplan-meier\n");
    srcc(&tmp)
        .args(["config", "show", "survival_method"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kaplan-meier"));
}

#[test]
fn test_config_show_unknown_key_fails() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .args(["config", "show", "colour"])
        .assert()
        .failure();
}

#[test]
fn test_config_default_format_applies() {
    let tmp = TempDir::new().unwrap();
    srcc(&tmp)
        .env("SRCC_FORMAT", "json")
        .args(["stage", "T2N1M0"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["));
}
