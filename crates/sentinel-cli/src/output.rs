//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled};

use sentinel_realtime::message::payload::TestResultRow;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One printable test result
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ResultLine {
    /// Test name
    #[tabled(rename = "Test")]
    pub name: String,
    /// Package or suite
    #[tabled(rename = "Package")]
    pub package: String,
    /// Outcome
    #[tabled(rename = "Status")]
    pub status: String,
    /// Duration
    #[tabled(rename = "Duration")]
    pub duration: String,
    /// Failure message
    #[tabled(rename = "Error")]
    pub error: String,
}

impl From<TestResultRow> for ResultLine {
    fn from(row: TestResultRow) -> Self {
        Self {
            name: row.name,
            package: row.package.unwrap_or_else(|| "-".to_string()),
            status: row.status,
            duration: row.duration.unwrap_or_else(|| "-".to_string()),
            error: row.error.unwrap_or_default(),
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{:#?}", item);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
    }
}

/// Print a JSON object as aligned key-value pairs
pub fn print_object(value: &Value, format: OutputFormat) {
    match (value, format) {
        (Value::Object(map), OutputFormat::Table) => {
            for (key, value) in map {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                print_kv(key, &rendered);
            }
        }
        (other, OutputFormat::Table) => println!("  {}", other),
        (other, OutputFormat::Json) => print_item(other, format),
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{}:", key), value);
}
