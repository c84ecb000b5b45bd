use std::fs;

use fluxscope::{
    engine::params,
    settings::{DiagnosticKind, ParamValue, ParameterSet, SettingsStore},
    ScopeEngine,
};

#[test]
fn engine_settings_survive_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::new(dir.path().join("nested").join("prefs"));

    let mut engine = ScopeEngine::default();
    engine.set_vertical_scaling(4.0);
    engine.set_display_time(0.025);
    engine.set_trigger(true, false, -0.125);
    store.save(&[&engine as &dyn ParameterSet]).unwrap();

    let text = fs::read_to_string(store.path()).unwrap();
    assert!(text.contains("OscWindow.triggerPositive=0\n"));
    assert!(text.contains("OscWindow.verticalScaling=4\n"));

    let mut restored = ScopeEngine::default();
    let diagnostics = store
        .load(&mut [&mut restored as &mut dyn ParameterSet])
        .unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(restored.config(), engine.config());
    assert_eq!(restored.display_samples(), 1_200);
}

#[test]
fn missing_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::new(dir.path().join("prefs"));
    let mut engine = ScopeEngine::default();

    let diagnostics = store
        .load(&mut [&mut engine as &mut dyn ParameterSet])
        .unwrap();

    assert!(diagnostics.is_empty());
    assert_eq!(engine.trigger_level(), 0.2);
}

#[test]
fn level_is_restored_after_scaling() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::new(dir.path().join("prefs"));
    // Level listed first; it only fits once the scaling is applied.
    fs::write(
        store.path(),
        "OscWindow.triggerLevel=5\nOscWindow.verticalScaling=0.1\n",
    )
    .unwrap();

    let mut engine = ScopeEngine::default();
    store
        .load(&mut [&mut engine as &mut dyn ParameterSet])
        .unwrap();

    assert_eq!(engine.vertical_scaling(), 0.1);
    assert_eq!(engine.trigger_level(), 5.0);
}

#[test]
fn bad_lines_are_reported_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::new(dir.path().join("prefs"));
    fs::write(
        store.path(),
        "garbage\n\
         OscWindow.triggerEnabled=maybe\n\
         OscWindow.brightness=3\n\
         Spectrum.bins=48\n\
         OscWindow.verticalScaling=2\n",
    )
    .unwrap();

    let mut engine = ScopeEngine::default();
    let diagnostics = store
        .load(&mut [&mut engine as &mut dyn ParameterSet])
        .unwrap();

    let kinds: Vec<_> = diagnostics.iter().map(|d| (d.line, d.kind.clone())).collect();
    assert_eq!(
        kinds,
        vec![
            (1, DiagnosticKind::Malformed),
            (
                2,
                DiagnosticKind::InvalidValue {
                    key: params::TRIGGER_ENABLED.into(),
                    value: "maybe".into(),
                }
            ),
            (
                3,
                DiagnosticKind::UnknownKey {
                    section: params::SECTION.into(),
                    key: "brightness".into(),
                }
            ),
            (4, DiagnosticKind::UnknownSection("Spectrum".into())),
        ]
    );
    assert_eq!(
        engine.parameter(params::VERTICAL_SCALING),
        Some(ParamValue::Float(2.0))
    );
    assert!(engine.trigger_enabled());
}
