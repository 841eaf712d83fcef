use crate::documents::{NormalizedField, NormalizedRecord};
use anyhow::{Result, anyhow};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const TABLE_HEADER: [&str; 8] = [
    "line",
    "id",
    "field",
    "shape",
    "status",
    "instant_ms",
    "display",
    "raw",
];

pub enum Writer {
    Text(Box<dyn Write + Send>),
    Jsonl(Box<dyn Write + Send>),
    JsonFile(BufWriter<File>, bool), // bool tracks whether the next record is the first
    CsvFile(BufWriter<File>, bool),  // bool tracks if we've written headers
    TsvFile(BufWriter<File>, bool),
}

impl Writer {
    pub fn write_batch(&mut self, records: &[NormalizedRecord]) -> Result<()> {
        match self {
            Writer::Text(writer) => {
                for record in records {
                    let id = record.id.as_deref().unwrap_or("-");
                    for field in &record.fields {
                        writeln!(writer, "{}\t{}\t{}", id, field.name, field.display)?;
                    }
                }
            }
            Writer::Jsonl(writer) => {
                for record in records {
                    let serialized = serde_json::to_string(record)?;
                    writeln!(writer, "{}", serialized)?;
                }
            }
            Writer::JsonFile(writer, is_first) => {
                for record in records {
                    if !*is_first {
                        write!(writer, ",")?;
                    }
                    *is_first = false;
                    let serialized = serde_json::to_string_pretty(record)?;
                    write!(writer, "\n{}", serialized)?;
                }
            }
            Writer::CsvFile(writer, headers_written) => {
                if !*headers_written {
                    writeln!(writer, "{}", TABLE_HEADER.join(","))?;
                    *headers_written = true;
                }
                for record in records {
                    for field in &record.fields {
                        let row: Vec<String> = table_row(record, field)
                            .iter()
                            .map(|cell| escape_csv_field(cell))
                            .collect();
                        writeln!(writer, "{}", row.join(","))?;
                    }
                }
            }
            Writer::TsvFile(writer, headers_written) => {
                if !*headers_written {
                    writeln!(writer, "{}", TABLE_HEADER.join("\t"))?;
                    *headers_written = true;
                }
                for record in records {
                    for field in &record.fields {
                        let row: Vec<String> = table_row(record, field)
                            .iter()
                            .map(|cell| escape_tsv_field(cell))
                            .collect();
                        writeln!(writer, "{}", row.join("\t"))?;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        match self {
            Writer::JsonFile(ref mut writer, _) => {
                writeln!(writer, "\n]")?;
                writer.flush()?;
            }
            Writer::CsvFile(ref mut writer, _) | Writer::TsvFile(ref mut writer, _) => {
                writer.flush()?;
            }
            Writer::Text(ref mut writer) | Writer::Jsonl(ref mut writer) => {
                writer.flush()?;
            }
        }
        Ok(())
    }
}

pub fn create_writer(output_arg: &str) -> Result<Writer> {
    match output_arg {
        "stdout" => Ok(Writer::Text(Box::new(io::stdout()))),
        "json" => Ok(Writer::Jsonl(Box::new(io::stdout()))), // one record per line on stdout
        path if path.ends_with(".jsonl") || path.ends_with(".ndjson") => {
            let file = create_file(path)?;
            Ok(Writer::Jsonl(Box::new(BufWriter::new(file))))
        }
        path if path.ends_with(".csv") => {
            let file = create_file(path)?;
            Ok(Writer::CsvFile(BufWriter::new(file), false))
        }
        path if path.ends_with(".tsv") => {
            let file = create_file(path)?;
            Ok(Writer::TsvFile(BufWriter::new(file), false))
        }
        path => {
            // Default to a JSON array file if it looks like a path
            if path.ends_with(".json")
                || path.contains('/')
                || path.contains('\\')
                || path.contains('.')
            {
                let mut writer = BufWriter::new(create_file(path)?);
                write!(writer, "[")?;
                Ok(Writer::JsonFile(writer, true))
            } else {
                Err(anyhow!(
                    "Unknown output format: {}. Use 'stdout', 'json', or a file path",
                    output_arg
                ))
            }
        }
    }
}

fn create_file(file_path: &str) -> Result<File> {
    if let Some(parent) = Path::new(file_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(file_path)?)
}

fn table_row(record: &NormalizedRecord, field: &NormalizedField) -> [String; 8] {
    [
        record.line.to_string(),
        record.id.clone().unwrap_or_default(),
        field.name.clone(),
        field.shape.to_string(),
        field.status.as_str().to_string(),
        field
            .instant_ms
            .map(|i| i.millis().to_string())
            .unwrap_or_default(),
        field.display.clone(),
        field.raw.clone().unwrap_or_default(),
    ]
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn escape_tsv_field(field: &str) -> String {
    field
        .replace('\t', " ")
        .replace('\n', " ")
        .replace('\r', " ")
}
