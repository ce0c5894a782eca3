//! Dry-run preview.

use tickshelf_core::domain::CleanRecord;
use tickshelf_core::enrich::EnrichedPartition;
use tickshelf_core::writer::{records_to_dataframe, WriteError};

/// Render the first `rows` enriched records, in partition order, as a table.
pub fn render_preview(partitions: &[EnrichedPartition], rows: usize) -> Result<String, WriteError> {
    let sample: Vec<CleanRecord> = partitions
        .iter()
        .flat_map(|p| p.records.iter())
        .take(rows)
        .cloned()
        .collect();

    if sample.is_empty() {
        return Ok("(no new records)".to_string());
    }

    let df = records_to_dataframe(&sample)?;
    Ok(df.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tickshelf_core::domain::CandidateRecord;
    use tickshelf_core::enrich::Enricher;

    #[test]
    fn preview_limits_rows() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = (0..8)
            .map(|i| {
                let dt = day.and_hms_opt(10, i, 0).unwrap();
                CandidateRecord::new(dt, 10.0 + i as f64, 11.0, 9.0, 10.0, 1.0)
            })
            .collect();
        let parts = Enricher::new("f.csv", day.and_hms_opt(0, 0, 0).unwrap()).enrich("AAA", records);

        let text = render_preview(&parts, 3).unwrap();
        assert!(text.contains("shape: (3, 11)"), "{text}");
    }

    #[test]
    fn empty_preview() {
        assert_eq!(render_preview(&[], 5).unwrap(), "(no new records)");
    }
}
