use std::process::{Command, Output};

fn sim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kernel-defence-sim"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch kernel-defence-sim")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("utf-8 output")
}

#[test]
fn exported_balance_is_json() {
    let output = stdout(&sim(&["export-balance"]));
    let balance: serde_json::Value = serde_json::from_str(&output).expect("valid json");
    assert_eq!(balance["bosses"]["weapon_damage_per_level"], 0.15);
}

#[test]
fn encounter_batch_prints_one_row_per_strategy() {
    let output = stdout(&sim(&[
        "encounter",
        "--strategy",
        "aggressive",
        "--strategy",
        "standing-still",
        "--boss",
        "cyberboss",
        "--seeds",
        "2",
        "--max-time",
        "20",
    ]));
    let rows: Vec<&str> = output.lines().take_while(|line| !line.is_empty()).collect();
    assert_eq!(rows.len(), 3, "{output}");
    assert!(rows[1].starts_with("aggressive"));
    assert!(rows[2].starts_with("standing-still"));
}

#[test]
fn defence_batch_exports_json_summaries() {
    let output = stdout(&sim(&[
        "defence",
        "--strategy",
        "greedy",
        "--scenario",
        "drought",
        "--compile",
        "kernel_pulse",
        "--seeds",
        "3",
        "--max-time",
        "60",
        "--json",
    ]));
    let batches: serde_json::Value = serde_json::from_str(&output).expect("valid json");
    assert_eq!(batches[0]["strategy"], "greedy");
    assert_eq!(batches[0]["scenario"], "Drought");
    assert_eq!(batches[0]["runs"], 3);
}

#[test]
fn checkpoints_resume_to_the_uninterrupted_result() {
    let common = [
        "--strategy",
        "phase-aware",
        "--boss",
        "void-harbinger",
        "--difficulty",
        "easy",
        "--weapon",
        "null_pointer",
        "--level",
        "6",
        "--seed",
        "11",
    ];

    let mut early = vec!["checkpoint", "encounter", "--at", "0"];
    early.extend(common);
    let mut late = vec!["checkpoint", "encounter", "--at", "40"];
    late.extend(common);

    let from_start = stdout(&sim(&early));
    let midway = stdout(&sim(&late));
    assert!(midway.starts_with("kdsim:v1:"));

    let finish = |transfer: &str| -> serde_json::Value {
        let output = stdout(&sim(&["resume", transfer.trim(), "--json"]));
        serde_json::from_str(&output).expect("valid json")
    };
    assert_eq!(finish(from_start.as_str()), finish(midway.as_str()));
}

#[test]
fn unknown_names_are_usage_errors() {
    let output = sim(&["encounter", "--boss", "dragon"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cyberboss"));

    let output = sim(&["resume", "save:v1:AAAA"]);
    assert!(!output.status.success());
}
