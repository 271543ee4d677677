//! End-to-end runs of the orchestrator against class directories on disk.

mod common;

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use ckjm_driver::core::environment::{EnvironmentConfigurer, ExtensionSearchState, PATH_SEPARATOR};
use ckjm_driver::core::paths::PathResolver;
use ckjm_driver::{OutputFormat, RunConfiguration, RunOutcome, TaskError, TaskOrchestrator};
use proptest::prelude::*;
use quick_xml::events::Event;
use quick_xml::Reader;
use tempfile::TempDir;

use common::{write_sample_classes, ClassBuilder};

fn isolated_orchestrator() -> TaskOrchestrator {
    TaskOrchestrator::new().with_search_state(Arc::new(ExtensionSearchState::new()))
}

fn sample_project() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let class_dir = temp.path().join("classes");
    fs::create_dir_all(&class_dir).unwrap();
    write_sample_classes(&class_dir);
    (temp, class_dir)
}

#[test]
fn plain_report_has_one_line_per_class() {
    let (temp, class_dir) = sample_project();
    let output = temp.path().join("ckjm.txt");
    fs::write(&output, "stale content\nthat must disappear\nentirely\n").unwrap();

    let config = RunConfiguration::new()
        .with_class_dir(&class_dir)
        .with_output_file(&output)
        .with_format("plain");

    let outcome = isolated_orchestrator().execute(&config).unwrap();
    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected a completed run, got {outcome:?}");
    };
    assert_eq!(summary.files_scanned, 2);
    assert_eq!(summary.classes_reported, 2);
    assert_eq!(summary.format, OutputFormat::Plain);

    let report = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(
        lines,
        vec!["com.acme.Base 2 1 1 1 2 1 2", "com.acme.Derived 1 2 0 1 2 0 1"]
    );
}

#[test]
fn xml_report_is_a_single_document() {
    let (temp, class_dir) = sample_project();
    let output = temp.path().join("ckjm.xml");

    let config = RunConfiguration::new()
        .with_class_dir(&class_dir)
        .with_output_file(&output)
        .with_format(OutputFormat::Xml);

    isolated_orchestrator().execute(&config).unwrap();

    let report = fs::read_to_string(&output).unwrap();
    let mut reader = Reader::from_str(&report);
    reader.trim_text(true);

    let mut roots = 0;
    let mut classes = 0;
    let mut names = Vec::new();
    let mut in_name = false;
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) => match e.name().as_ref() {
                b"ckjm" => roots += 1,
                b"class" => classes += 1,
                b"name" => in_name = true,
                _ => {}
            },
            Event::Text(t) if in_name => {
                names.push(t.unescape().unwrap().into_owned());
                in_name = false;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    assert_eq!(roots, 1);
    assert_eq!(classes, 2);
    assert_eq!(names, vec!["com.acme.Base", "com.acme.Derived"]);
}

#[test]
fn unknown_format_name_renders_plain_text() {
    let (temp, class_dir) = sample_project();
    let plain = temp.path().join("plain.txt");
    let unknown = temp.path().join("unknown.txt");

    let orchestrator = isolated_orchestrator();
    orchestrator
        .execute(
            &RunConfiguration::new()
                .with_class_dir(&class_dir)
                .with_output_file(&plain),
        )
        .unwrap();
    orchestrator
        .execute(
            &RunConfiguration::new()
                .with_class_dir(&class_dir)
                .with_output_file(&unknown)
                .with_format("html"),
        )
        .unwrap();

    assert_eq!(
        fs::read_to_string(&plain).unwrap(),
        fs::read_to_string(&unknown).unwrap()
    );
}

#[test]
fn missing_class_dir_fails_before_output_is_created() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("ckjm.txt");

    let config = RunConfiguration::new()
        .with_class_dir(temp.path().join("missing"))
        .with_output_file(&output);

    let err = isolated_orchestrator().execute(&config).unwrap_err();
    assert!(matches!(err, TaskError::Config { .. }));
    assert!(!output.exists());
}

#[test]
fn empty_class_dir_leaves_output_untouched() {
    let temp = TempDir::new().unwrap();
    let class_dir = temp.path().join("classes");
    fs::create_dir_all(&class_dir).unwrap();
    let output = temp.path().join("ckjm.txt");
    fs::write(&output, "previous report\n").unwrap();

    let config = RunConfiguration::new()
        .with_class_dir(&class_dir)
        .with_output_file(&output);

    let outcome = isolated_orchestrator().execute(&config).unwrap();
    assert_eq!(outcome, RunOutcome::NoFiles);
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous report\n");
}

#[test]
fn unwritable_output_is_an_io_error() {
    let (temp, class_dir) = sample_project();
    let output = temp.path().join("no-such-dir").join("ckjm.txt");

    let config = RunConfiguration::new()
        .with_class_dir(&class_dir)
        .with_output_file(&output);

    let err = isolated_orchestrator().execute(&config).unwrap_err();
    assert!(matches!(err, TaskError::Io { .. }));
    assert!(err.to_string().starts_with("Error file handling:"));
}

#[test]
fn extension_dirs_resolve_external_superclasses() {
    let (temp, class_dir) = sample_project();
    let ext_dir = temp.path().join("ext");
    fs::create_dir_all(&ext_dir).unwrap();
    ClassBuilder::new("org/lib/Widget").write_to(&ext_dir);
    ClassBuilder::new("com/acme/Button")
        .extends("org/lib/Widget")
        .write_to(&class_dir);

    let output = temp.path().join("ckjm.txt");
    let state = Arc::new(ExtensionSearchState::new());
    let config = RunConfiguration::new()
        .with_class_dir(&class_dir)
        .with_output_file(&output)
        .with_ext_dirs(&ext_dir);

    TaskOrchestrator::new()
        .with_search_state(Arc::clone(&state))
        .execute(&config)
        .unwrap();

    let report = fs::read_to_string(&output).unwrap();
    let button = report
        .lines()
        .find(|line| line.starts_with("com.acme.Button "))
        .unwrap();
    // Button -> Widget -> Object
    assert_eq!(button.split(' ').nth(2), Some("2"));
    assert_eq!(state.current(), Some(ext_dir.into_os_string()));
}

#[test]
fn repeated_runs_accumulate_search_path() {
    let (temp, class_dir) = sample_project();
    let state = Arc::new(ExtensionSearchState::new());
    let orchestrator = TaskOrchestrator::new().with_search_state(Arc::clone(&state));
    let config = RunConfiguration::new()
        .with_class_dir(&class_dir)
        .with_output_file(temp.path().join("ckjm.txt"))
        .with_ext_dirs("lib");

    orchestrator.execute(&config).unwrap();
    orchestrator.execute(&config).unwrap();

    assert_eq!(
        state.current(),
        Some(OsString::from(format!("lib{PATH_SEPARATOR}lib")))
    );
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_class_file_names_are_analyzed() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp = TempDir::new().unwrap();
    let class_dir = temp.path().join("classes");
    fs::create_dir_all(&class_dir).unwrap();
    fs::write(
        class_dir.join(OsStr::from_bytes(b"Caf\xe9.class")),
        ClassBuilder::new("Caf").build(),
    )
    .unwrap();
    let output = temp.path().join("ckjm.txt");

    let config = RunConfiguration::new()
        .with_class_dir(&class_dir)
        .with_output_file(&output);

    let RunOutcome::Completed(summary) = isolated_orchestrator().execute(&config).unwrap() else {
        panic!("expected a completed run");
    };
    assert_eq!(summary.files_scanned, 1);
    assert_eq!(summary.classes_reported, 1);
    assert_eq!(summary.files_skipped, 0);
    assert!(fs::read_to_string(&output).unwrap().starts_with("Caf "));
}

proptest! {
    #[test]
    fn resolved_paths_keep_order_and_length(
        names in prop::collection::vec("[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.class", 0..16)
    ) {
        let base = PathBuf::from("/work/classes");
        let resolved = PathResolver::resolve(&base, &names);

        prop_assert_eq!(resolved.len(), names.len());
        for (path, name) in resolved.iter().zip(&names) {
            prop_assert!(path.starts_with(&base));
            prop_assert!(path.ends_with(name));
        }
    }

    #[test]
    fn search_path_grows_with_every_application(
        dirs in prop::collection::vec("[a-z]{1,6}", 1..6),
        rounds in 1usize..4
    ) {
        let state = ExtensionSearchState::new();
        let additions: Vec<PathBuf> = dirs.iter().map(PathBuf::from).collect();

        let mut previous_len = 0;
        for _ in 0..rounds {
            let value = state.apply(&additions).unwrap();
            prop_assert!(value.len() > previous_len);
            previous_len = value.len();
        }

        let entries = EnvironmentConfigurer::split(&state.current().unwrap());
        prop_assert_eq!(entries.len(), dirs.len() * rounds);
    }
}
