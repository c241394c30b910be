//! Catalog snapshot: a header line, then `id,title,[author,]availableCopies`

use std::collections::HashSet;

use csv::{ReaderBuilder, StringRecord, Terminator, Trim, WriterBuilder};

use crate::{
    error::{AppError, AppResult},
    models::Work,
};

const HEADER: [&str; 4] = ["id", "title", "author", "availableCopies"];

/// Parse a catalog table. The first line is a header and is skipped.
///
/// Rows may carry 3 fields (no author) or 4. Fields may be quoted, so a title
/// can contain commas. Blank lines are ignored; any other malformed row fails
/// the whole load.
pub fn parse(content: &str, file: &str) -> AppResult<Vec<Work>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut works = Vec::new();
    let mut seen = HashSet::new();

    for result in reader.records() {
        let row = result.map_err(|e| {
            let record = e.position().map_or(0, |p| p.line() as usize);
            AppError::corrupt(file, record, format!("unreadable row: {}", e))
        })?;
        let record = line_of(&row);
        if row.iter().all(str::is_empty) {
            continue;
        }

        let fields: Vec<&str> = row.iter().collect();
        let (id, title, author, copies) = match fields.as_slice() {
            [id, title, copies] => (*id, *title, None, *copies),
            [id, title, author, copies] => (*id, *title, Some(author.to_string()), *copies),
            _ => {
                return Err(AppError::corrupt(
                    file,
                    record,
                    format!("expected 3 or 4 fields, found {}", fields.len()),
                ))
            }
        };

        let id: i32 = id
            .parse()
            .map_err(|_| AppError::corrupt(file, record, format!("invalid work id '{}'", id)))?;
        let copies: u32 = copies.parse().map_err(|_| {
            AppError::corrupt(
                file,
                record,
                format!("availableCopies must be a non-negative integer, got '{}'", copies),
            )
        })?;
        if title.is_empty() {
            return Err(AppError::corrupt(file, record, "empty title"));
        }
        if !seen.insert(id) {
            return Err(AppError::corrupt(file, record, format!("duplicate work id {}", id)));
        }

        works.push(Work::new(id, title, author, copies));
    }

    Ok(works)
}

/// 1-based line on which a row starts
fn line_of(row: &StringRecord) -> usize {
    row.position().map_or(0, |p| p.line() as usize)
}

/// Render the catalog in the 4-field layout, quoting fields where needed
pub fn format(works: &[Work]) -> AppResult<String> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(HEADER).map_err(write_error)?;
    for work in works {
        writer
            .write_record([
                work.id.to_string(),
                work.title.clone(),
                work.author.clone(),
                work.available_copies.to_string(),
            ])
            .map_err(write_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush catalog: {}", e.error())))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("Catalog is not valid UTF-8: {}", e)))
}

fn write_error(e: csv::Error) -> AppError {
    AppError::Internal(format!("Failed to serialize catalog: {}", e))
}
