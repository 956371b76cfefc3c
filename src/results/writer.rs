//! CSV persistence for result tables.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{error, info, warn};

use crate::config::ExperimentConfig;
use crate::error::Error;
use crate::results::{columns, ResultTable};

/// Write a result table as delimited text, one row per named model output
/// per condition. The full-prediction column is dropped.
///
/// The filename defaults to a timestamp plus the configured run name. If the
/// primary location cannot be written, a best-effort copy goes into the
/// current working directory so the data is not lost; only if that also
/// fails does the original error propagate.
pub fn write_table(
    table: &ResultTable,
    config: &ExperimentConfig,
    filename: Option<&str>,
) -> Result<PathBuf, Error> {
    let filename = match filename {
        Some(f) => f.to_string(),
        None => {
            let date = Local::now().format(&config.timestamp_format);
            match &config.name {
                Some(name) => format!("{date}-{name}.csv"),
                None => format!("{date}.csv"),
            }
        }
    };

    if !config.output_dir.is_dir() {
        if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
            // Not fatal: the write below gets its own chance to fail.
            error!(path = %config.output_dir.display(), "could not create output directory: {e}");
        } else {
            info!(path = %config.output_dir.display(), "created output directory");
        }
    }

    let primary = config.output_dir.join(&filename);
    match write_csv(&primary, table) {
        Ok(()) => {
            info!(path = %primary.display(), "saved result table");
            Ok(primary)
        }
        Err(e) => {
            let fallback = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(&filename);
            error!(
                "could not write result table to {}, trying {} in order not to lose data",
                primary.display(),
                fallback.display()
            );
            match write_csv(&fallback, table) {
                Ok(()) => {
                    warn!(path = %fallback.display(), "saved result table to fallback location");
                    Ok(fallback)
                }
                Err(_) => Err(e),
            }
        }
    }
}

fn write_csv(path: &Path, table: &ResultTable) -> Result<(), Error> {
    let param_columns: Vec<String> = if table.has_positional_params() {
        vec![columns::DIST_PARAMS.to_string()]
    } else {
        table.named_param_columns()
    };
    let with_intelligibility = table.rows().iter().any(|r| r.intelligibility.is_some());
    let with_srt = table.rows().iter().any(|r| r.srt.is_some());
    let with_reversals = table.rows().iter().any(|r| r.reversals.is_some());

    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![
        columns::SNR.to_string(),
        columns::MODEL.to_string(),
        columns::SENTENCE.to_string(),
        columns::MATERIAL.to_string(),
        columns::OUTPUT.to_string(),
        columns::VALUE.to_string(),
    ];
    header.extend(param_columns.iter().cloned());
    if with_intelligibility {
        header.push(columns::INTELLIGIBILITY.to_string());
    }
    if with_srt {
        header.push(columns::SRT.to_string());
    }
    if with_reversals {
        header.push(columns::REVERSALS.to_string());
    }
    writer.write_record(&header)?;

    for row in table.rows() {
        let mut record = vec![
            row.snr.to_string(),
            row.model.clone(),
            row.sentence.to_string(),
            row.material.clone(),
            row.output.clone(),
            row.value.to_string(),
        ];
        for key in &param_columns {
            record.push(row.param_value(key));
        }
        if with_intelligibility {
            record.push(row.intelligibility.map(|v| v.to_string()).unwrap_or_default());
        }
        if with_srt {
            record.push(row.srt.map(|v| v.to_string()).unwrap_or_default());
        }
        if with_reversals {
            record.push(row.reversals.map(|v| v.to_string()).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
