use chrono::{DateTime, Utc};

/// Artifact name for a pipeline run started at `started_at`.
///
/// Sortable and second-granular: `vacancies_2025-12-20_14-03-09`.
pub fn run_name(started_at: DateTime<Utc>) -> String {
    format!("vacancies_{}", started_at.format("%Y-%m-%d_%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_run_name_format() {
        let t = Utc.with_ymd_and_hms(2025, 12, 20, 14, 3, 9).unwrap();
        assert_eq!(run_name(t), "vacancies_2025-12-20_14-03-09");
    }

    #[test]
    fn test_run_names_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2025, 9, 30, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
        assert!(run_name(earlier) < run_name(later));
    }
}
