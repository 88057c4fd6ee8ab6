//! Builds the fixture projects under `tests/fixtures` end to end.

use std::path::PathBuf;

use hubweave::{
    compiler::{assemble, Flat},
    project::{BuildError, Project, RunDirectory},
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn robot() -> Project {
    let mut project = Project::discover(&fixture("robot"), "setup.py").unwrap();
    project.label = Some("robot 0.1.0".to_string());
    project
}

/// Asserts the pieces appear in order.
fn in_order(text: &str, pieces: &[&str]) {
    let mut cursor = 0;
    for piece in pieces {
        match text[cursor..].find(piece) {
            Some(found) => cursor += found + piece.len(),
            None => panic!("missing {:?} after byte {} in\n{}", piece, cursor, text),
        }
    }
}

#[test]
fn discovery() {
    let project = robot();
    assert_eq!(project.run_names(), vec!["run01", "run02", "run03"]);
    assert!(project.setup.is_some());
    assert!(project.ordering_warning().is_none());

    let run02 = &project.runs[1];
    let missions: Vec<&str> = run02.missions.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(missions, vec!["m02", "m03"]);
    assert_eq!(run02.skipped, vec![fixture("robot").join("run02").join("_notes.py")]);
    assert!(run02.setup.is_none());
    assert!(project.runs[2].setup.is_some());
}

#[test]
fn mission_analysis() {
    let project = robot();
    let m01 = project.runs[0].mission("m01").unwrap();
    assert_eq!(m01.globals, vec!["stop_logging"]);
    assert!(m01.exports("run"));
    assert!(m01.exports("sensor_logger_task"));
    assert!(m01.guarded());

    let run02 = &project.runs[1];
    assert!(!run02.mission("m02").unwrap().guarded());
    assert!(run02.mission("m03").unwrap().guarded());

    // guard text inside a docstring isn't a guard
    let m04 = project.runs[2].mission("m04").unwrap();
    assert!(!m04.guarded());
    assert_eq!(m04.globals, vec!["count"]);
}

#[test]
fn menu_program_is_deterministic() {
    let project = robot();
    assert_eq!(assemble(&project).unwrap(), assemble(&robot()).unwrap());
}

#[test]
fn menu_program_layout() {
    let text = assemble(&robot()).unwrap();

    in_order(&text, &[
        "# Project: robot 0.1.0\n# Runs: run01, run02, run03\n",
        "class _MissionModule:\n",
        "\n# ---- setup ----\nfrom pybricks.hubs import PrimeHub\n",
        "def _make_run01():\n",
        "    global stop_logging\n",
        "    # ---- mission: m01 (globals: stop_logging) ----\n",
        "    _variant_m01 = m01\n",
        "def _make_run02():\n",
        "    # ---- mission: m02 ----\n",
        "    # ---- mission: m03 ----\n",
        "    _variant_m03 = m03\n",
        "def _make_run03():\n",
        "    global count\n",
        "    # ---- setup ----\n    from pybricks.hubs import PrimeHub\n",
        "RUN_MAX = 3\n",
        "    \"3\": _make_run03,\n",
        "def main():\n",
    ]);

    assert!(!text.contains("import setup"));
    assert!(!text.contains("from setup"));
    assert!(!text.contains("setup.initialize_robot"));
    assert!(!text.contains("run_task(run(*"));
    assert!(!text.contains("print(initialize_robot())"));
}

#[test]
fn logger_flags_reach_their_loggers() {
    let text = assemble(&robot()).unwrap();
    let run01 = &text[text.find("def _make_run01").unwrap()..text.find("def _make_run02").unwrap()];
    let run02 = &text[text.find("def _make_run02").unwrap()..text.find("def _make_run03").unwrap()];

    in_order(run01, &["global stop_logging\n", "stop_logging = True\n", "await wait(500)\n"]);
    assert!(!run01.contains("nonlocal"));

    // m02 polls a plain top-level flag, bound in the factory
    assert!(!run02.contains("global stop_logging"));
    in_order(run02, &[
        "    stop_logging = False\n",
        "                nonlocal stop_logging\n                stop_logging = True\n",
        "await wait(500)\n",
        "wrapped_run())\n",
    ]);
}

#[test]
fn nested_setup_import_keeps_its_block() {
    let text = assemble(&robot()).unwrap();
    assert!(text.contains("        if count > 1:\n            pass\n"));
}

#[test]
fn docstrings_are_left_alone() {
    let text = assemble(&robot()).unwrap();
    assert!(text.contains("\nif __name__ == \"__main__\":\n    this line lives in a docstring.\n\"\"\"\n"));
}

#[test]
fn flat_program_with_forced_mission() {
    let run = RunDirectory::load(&fixture("robot").join("run02")).unwrap();
    let project = robot();

    let mut flat = Flat::new(&run);
    flat.shared_setup = project.setup.as_ref();
    flat.mission = Some("m02");
    let text = flat.assemble().unwrap();

    in_order(&text, &[
        "# Runs: run02\n# Missions: m02, m03\n# Forced mission: m02\n",
        "# ---- mission: m02 ----\n",
        "# ---- setup ----\n",
        "def initialize_robot():\n",
        "# ---- main ----\n",
        "ACTIVE_VARIANT = \"m03\"\n",
        "# ---- mission override ----\nCURRENT_MISSION = \"m02\"\nACTIVE_VARIANT = \"m02\"\n",
        "# ---- entry ----\nif __name__ == \"__main__\":\n",
    ]);
    assert!(!text.contains("def _make_"));
    assert!(!text.contains("RUNNERS"));
}

#[test]
fn flat_program_calls_dispatcher_main() {
    let run = RunDirectory::load(&fixture("robot").join("run03")).unwrap();
    let text = Flat::new(&run).assemble().unwrap();
    assert!(text.ends_with("# ---- entry ----\nif __name__ == \"__main__\":\n    main()\n"));
}

#[test]
fn unknown_forced_mission() {
    let run = RunDirectory::load(&fixture("robot").join("run01")).unwrap();
    let mut flat = Flat::new(&run);
    flat.mission = Some("m99");
    match flat.assemble() {
        Err(BuildError::NotFound { reason, .. }) => assert!(reason.contains("m99")),
        other => panic!("expected a missing mission, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn missing_dispatcher() {
    let error = Project::discover(&fixture("missing_dispatcher"), "setup.py").unwrap_err();
    match &error {
        BuildError::NotFound { reason, path } => {
            assert!(reason.contains("main.py"));
            assert!(path.ends_with("run01"));
        },
        other => panic!("expected a missing dispatcher, got {}", other),
    }
    assert!(error.to_string().contains("run01"));
}

#[test]
fn syntax_errors_fail_the_build() {
    match Project::discover(&fixture("unbalanced"), "setup.py") {
        Err(BuildError::Syntax(syntax)) => {
            assert!(syntax.to_string().contains("Syntax Error"));
        },
        other => panic!("expected a syntax error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn no_runs() {
    let error = Project::discover(&fixture("robot").join("notes"), "setup.py").unwrap_err();
    assert!(matches!(error, BuildError::NotFound { .. }));
}
