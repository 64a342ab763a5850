use primer::lesson::report::{render_report, Summary};
use primer::lesson::{LessonRunner, Playground, RunnerConfig};
use std::path::Path;

fn bundled() -> Playground {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("lessons");
    Playground::load(&path).expect("Failed to load bundled lessons")
}

#[test]
fn test_bundled_lessons_pass() {
    let playground = bundled();
    assert_eq!(playground.title, "Language Basics");

    let mut config = RunnerConfig::default();
    config.apply_settings(&playground.settings);
    let runner = LessonRunner::new(config);
    let results = runner.run_all(&runner.select(&playground.units));

    let summary = Summary::of(&results);
    assert!(summary.all_passed(), "{}", render_report(&results, true));
    assert_eq!(summary.passed, playground.units.len());
}

#[test]
fn test_bundled_lessons_order_and_exercises() {
    let playground = bundled();
    let main_units: Vec<&str> = playground
        .units
        .iter()
        .filter(|u| !u.is_exercise)
        .map(|u| u.name.as_str())
        .collect();
    assert_eq!(
        main_units,
        vec![
            "Constants and Variables",
            "Basic Types",
            "Collections",
            "Control Flow",
            "Functions and Structs",
        ]
    );

    let exercise = playground
        .units
        .iter()
        .find(|u| u.name == "Constants and Variables (exercise 1)")
        .expect("exercise unit");
    assert!(exercise.is_exercise);
}

#[test]
fn test_filter_and_no_exercises() {
    let playground = bundled();
    let config = RunnerConfig {
        filter: Some("control".to_string()),
        exercises: false,
        ..RunnerConfig::default()
    };
    let runner = LessonRunner::new(config);
    let units = runner.select(&playground.units);
    assert_eq!(units.len(), 1);

    let results = runner.run_all(&units);
    assert_eq!(results[0].output.iter().filter(|l| l.as_str() == "15").count(), 1);
    assert!(render_report(&results, false).ends_with("1 passed, 0 failed\n"));
}

#[test]
fn test_exercise_blocks_omit_page_output() {
    let playground = bundled();
    let config = RunnerConfig {
        filter: Some("basic types".to_string()),
        ..RunnerConfig::default()
    };
    let runner = LessonRunner::new(config);
    let report = render_report(&runner.run_all(&runner.select(&playground.units)), false);

    let blocks: Vec<&str> = report.split("== ").skip(1).collect();
    assert!(blocks.len() > 1);
    for block in blocks {
        let has_output = block.lines().any(|line| line.starts_with("   | "));
        assert_eq!(has_output, !block.starts_with("Basic Types (exercise"), "{}", block);
    }
}
