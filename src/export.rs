//! Spreadsheet export of the latest scan.
//!
//! Writes every persisted governor, highest power first, as one CSV row.
//! The epoch baseline columns are empty for governors without one.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::record::StoredGovernor;
use crate::store::GovernorStore;

const HEADER: [&str; 13] = [
    "Governor ID",
    "Nickname",
    "Power",
    "Kill Points",
    "T1 Kills",
    "T2 Kills",
    "T3 Kills",
    "T4 Kills",
    "T5 Kills",
    "Deaths",
    "RSS Assistance",
    "Base Power",
    "Base Kill Points",
];

/// Writes records as CSV, header first, in the order given.
pub fn write_records<W: Write>(writer: W, governors: &[StoredGovernor]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER).context("Failed to write CSV header")?;

    for StoredGovernor { record, baseline } in governors {
        let mut row = vec![
            record.id.as_str(),
            record.nickname.as_str(),
            record.power.as_str(),
            record.kill_points.as_str(),
        ];
        row.extend(record.tier_kills());
        row.push(&record.deaths);
        row.push(&record.resource_assistance);
        match baseline {
            Some(base) => row.extend([base.power.as_str(), base.kill_points.as_str()]),
            None => row.extend(["", ""]),
        }

        csv.write_record(&row)
            .with_context(|| format!("Failed to write CSV row for governor {}", record.id))?;
    }

    csv.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Exports the store contents to `output_path`. Returns the row count.
pub fn export_to_csv(store: &mut dyn GovernorStore, output_path: &Path) -> Result<usize> {
    let records = store.list_by_power_desc()?;

    let file = std::fs::File::create(output_path)
        .with_context(|| format!("Failed to create CSV file: {}", output_path.display()))?;
    write_records(file, &records)?;

    Ok(records.len())
}
