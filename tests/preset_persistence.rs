// Integration test for preset slots and engine configuration files
// Tests the complete save/load cycle through the metronome controller

use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pulse_metronome::preset::{PresetError, SLOT_COUNT};
use pulse_metronome::{
    EngineConfig, ManualClock, Metronome, PresetStore, RecordingOutput, SettingsRecord,
    SoundType, Subdivision, create_notification_channel,
};
use tempfile::tempdir;

fn metronome() -> (Metronome, RecordingOutput) {
    let clock = ManualClock::new();
    let output = RecordingOutput::new(clock.clone());
    let (tx, _rx) = create_notification_channel(8);
    let metronome = Metronome::new(
        Box::new(output.clone()),
        Box::new(clock),
        Arc::new(Mutex::new(tx)),
    );
    (metronome, output)
}

#[test]
fn test_preset_roundtrip_through_metronome() {
    let dir = tempdir().unwrap();
    let store = PresetStore::new(dir.path());

    let (mut source, _) = metronome();
    source.set_tempo(96);
    source.set_time_signature(6, 8);
    source.set_subdivision(Subdivision::Triplet);
    source.set_sound(SoundType::Woodblock);
    source.set_volume(0.5);
    source.set_accent(false);
    source.set_timer(3, 30);
    store.save(2, &source.get_settings()).unwrap();

    let (mut target, _) = metronome();
    let record = store.load(2).expect("slot 2 saved");
    target.apply_settings(&record);

    assert_eq!(target.get_settings(), source.get_settings());
    assert_eq!(store.summary(2).as_deref(), Some("96 BPM, 6/8, Triplet"));
}

#[test]
fn test_preset_file_layout() {
    let dir = tempdir().unwrap();
    let store = PresetStore::new(dir.path());
    store.save(1, &SettingsRecord::default()).unwrap();

    let path = dir.path().join("metronome_preset_1.json");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

    assert_eq!(json["tempo"], 120.0);
    assert_eq!(json["beatsPerMeasure"], 4);
    assert_eq!(json["noteValue"], 4);
    assert_eq!(json["subdivision"], "quarter");
    assert_eq!(json["soundType"], "click");
    assert_eq!(json["timerMinutes"], 0);
}

#[test]
fn test_empty_and_malformed_slots() {
    let dir = tempdir().unwrap();
    let store = PresetStore::new(dir.path());
    assert!(store.load(3).is_none());

    fs::write(dir.path().join("metronome_preset_3.json"), "{ not json").unwrap();
    assert!(store.load(3).is_none());
    assert!(store.summary(3).is_none());

    let listed = store.list();
    assert_eq!(listed.len(), SLOT_COUNT as usize);
    assert!(listed.iter().all(|(_, summary)| summary.is_none()));
}

#[test]
fn test_partial_record_keeps_defaults() {
    let dir = tempdir().unwrap();
    let store = PresetStore::new(dir.path());
    fs::write(
        dir.path().join("metronome_preset_4.json"),
        r#"{ "tempo": 200, "subdivision": "no-such-pattern", "volume": 7.5 }"#,
    )
    .unwrap();

    let (mut m, _) = metronome();
    m.apply_settings(&store.load(4).unwrap());

    assert_eq!(m.tempo().bpm(), 200);
    assert_eq!(m.settings().subdivision(), Subdivision::Quarter);
    assert_eq!(m.settings().volume(), 1.0);
    assert_eq!(m.settings().time_signature().beats_per_bar(), 4);
}

#[test]
fn test_loading_preset_restarts_running_metronome() {
    let dir = tempdir().unwrap();
    let store = PresetStore::new(dir.path());

    let mut record = SettingsRecord::default();
    record.tempo = 80.0;
    store.save(5, &record).unwrap();

    let (mut m, output) = metronome();
    m.start().unwrap();
    m.poll();

    m.apply_settings(&store.load(5).unwrap());
    assert!(m.is_running());
    assert_eq!(output.cancel_count(), 1);

    // Same record again changes nothing
    m.apply_settings(&store.load(5).unwrap());
    assert_eq!(output.cancel_count(), 1);
}

#[test]
fn test_invalid_slots_rejected() {
    let dir = tempdir().unwrap();
    let store = PresetStore::new(dir.path());
    assert!(matches!(
        store.save(0, &SettingsRecord::default()),
        Err(PresetError::InvalidSlot(0))
    ));
    assert!(matches!(
        store.save(SLOT_COUNT + 1, &SettingsRecord::default()),
        Err(PresetError::InvalidSlot(_))
    ));
    assert!(store.load(0).is_none());
}

#[test]
fn test_delete_preset() {
    let dir = tempdir().unwrap();
    let store = PresetStore::new(dir.path());
    store.save(1, &SettingsRecord::default()).unwrap();

    assert!(store.delete(1).unwrap());
    assert!(!store.delete(1).unwrap());
    assert!(store.load(1).is_none());
}

#[test]
fn test_config_roundtrip_and_timing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.ron");

    let config = EngineConfig {
        lookahead_ms: 150,
        tick_interval_ms: 20,
        output_device: Some("Built-in Output".to_string()),
        ..EngineConfig::default()
    };
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    let timing = loaded.scheduler_timing();
    assert_eq!(timing.lookahead, Duration::from_millis(150));
    assert_eq!(timing.tick_interval, Duration::from_millis(20));
}

#[test]
fn test_broken_config_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.ron");
    fs::write(&path, "(lookahead_ms: \"soon\"").unwrap();

    assert!(EngineConfig::load(&path).is_err());
    assert_eq!(EngineConfig::load_or_default(&path), EngineConfig::default());
    assert_eq!(
        EngineConfig::load_or_default(&dir.path().join("missing.ron")),
        EngineConfig::default()
    );
}
