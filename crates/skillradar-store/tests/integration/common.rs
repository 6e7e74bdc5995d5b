use skillradar_core::models::NormalizedVacancy;
use skillradar_store::{LocalStorage, StorageConfig};
use tempfile::TempDir;

/// Storage rooted in a fresh temporary directory.
///
/// The `TempDir` must outlive the storage; dropping it removes the tree.
pub fn temp_storage() -> (LocalStorage, TempDir) {
    let tmp = TempDir::new().expect("create temp dir");
    let storage = LocalStorage::new(StorageConfig::new(tmp.path().join(".skillradar")));
    (storage, tmp)
}

pub fn vacancy(id: &str, title: &str) -> NormalizedVacancy {
    NormalizedVacancy {
        id: id.into(),
        title: title.into(),
        url: format!("https://hh.ru/vacancy/{id}"),
        source: "HeadHunter".into(),
        company_name: Some("Яндекс".into()),
        description: Some("Пишем на Rust".into()),
        skills: vec!["Rust".into(), "PostgreSQL".into()],
        location: Some("Москва".into()),
    }
}
