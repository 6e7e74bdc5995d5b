use serde_json::json;
use skillradar_core::AppError;
use skillradar_core::models::{AnalysisResult, ArtifactKind, ExtractionResult};
use skillradar_core::traits::ArtifactStore;

use crate::common::{temp_storage, vacancy};

#[test]
fn raw_round_trip() {
    let (storage, _tmp) = temp_storage();
    let batch = json!([{"id": "1", "name": "Rust Developer"}, {"id": "2", "name": "Go Developer"}]);

    storage.save_raw("vacancies_2024-01-01_00-00-00", &batch).unwrap();
    let loaded = storage.load_raw("vacancies_2024-01-01_00-00-00").unwrap();

    assert_eq!(loaded, batch);
}

#[test]
fn normalized_round_trip() {
    let (storage, _tmp) = temp_storage();
    let batch = vec![vacancy("1", "Rust Developer"), vacancy("2", "Разработчик")];

    storage.save_normalized("run", &batch).unwrap();

    assert_eq!(storage.load_normalized("run").unwrap(), batch);
}

#[test]
fn save_creates_every_namespace_lazily() {
    let (storage, _tmp) = temp_storage();
    let data_dir = storage.config().data_dir();
    assert!(!data_dir.exists());

    storage.save_raw("run", &json!([])).unwrap();

    for kind in ArtifactKind::ALL {
        assert!(storage.config().namespace_dir(kind).is_dir(), "{kind} missing");
    }
}

#[test]
fn namespaces_are_isolated() {
    let (storage, _tmp) = temp_storage();
    let raw = json!([{"id": "1", "name": "Rust Developer", "detail": {"id": "1"}}]);
    let normalized = vec![vacancy("1", "Rust Developer")];

    storage.save_raw("same-name", &raw).unwrap();
    storage.save_normalized("same-name", &normalized).unwrap();

    assert_eq!(storage.load_raw("same-name").unwrap(), raw);
    assert_eq!(storage.load_normalized("same-name").unwrap(), normalized);
    assert!(storage.load_analysis("same-name").unwrap_err().is_not_found());
}

#[test]
fn normalized_missing_while_raw_exists_is_not_found() {
    let (storage, _tmp) = temp_storage();
    storage.save_raw("only-raw", &json!({"raw": true})).unwrap();

    let err = storage.load_normalized("only-raw").unwrap_err();
    assert!(matches!(
        err,
        AppError::NotFound {
            namespace: ArtifactKind::Normalized,
            ..
        }
    ));
}

#[test]
fn missing_raw_artifact_is_not_found() {
    let (storage, _tmp) = temp_storage();

    let err = storage.load_raw("nope").unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "raw artifact not found: nope");
}

#[test]
fn analysis_is_keyed_by_vacancy_id_and_overwritten() {
    let (storage, _tmp) = temp_storage();
    let mut first = AnalysisResult::new("42");
    first.data.insert("seniority".into(), json!("junior"));
    storage.save_analysis(&first).unwrap();

    let mut second = AnalysisResult::new("42");
    second.data.insert("seniority".into(), json!("senior"));
    storage.save_analysis(&second).unwrap();

    let loaded = storage.load_analysis("42").unwrap();
    assert_eq!(loaded.vacancy_id, "42");
    assert_eq!(loaded.data.get("seniority"), Some(&json!("senior")));
}

#[test]
fn extraction_round_trip() {
    let (storage, _tmp) = temp_storage();
    let entity = json!({"skill": "Rust"}).as_object().cloned().unwrap();
    let mut result = ExtractionResult::new("7");
    result.data.push(entity);

    storage.save_extraction(&result).unwrap();

    assert_eq!(storage.load_extraction("7").unwrap(), result);
    assert!(storage.load_analysis("7").unwrap_err().is_not_found());
}

#[test]
fn files_are_pretty_printed_utf8() {
    let (storage, _tmp) = temp_storage();
    storage
        .save_normalized("cyrillic", &[vacancy("1", "Разработчик")])
        .unwrap();

    let path = storage
        .artifact_path(ArtifactKind::Normalized, "cyrillic")
        .unwrap();
    let contents = std::fs::read_to_string(path).unwrap();

    assert!(contents.contains("\"title\": \"Разработчик\""));
    assert!(contents.contains("Москва"));
    assert!(!contents.contains("\\u"));
    assert!(contents.starts_with("[\n  {"));
}
