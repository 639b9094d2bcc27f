//! Output formatting for azurerm-network
//!
//! Human output is colored tables and `key: value` records; JSON and YAML
//! print the serialized resources so they can be piped into other tools.

use super::OutputFormat;
use anyhow::Result;
use azurerm_network::modules::{ModuleOutput, ModuleStatus};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

/// Output formatter for the selected output mode
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Output format
    format: OutputFormat,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, format: OutputFormat, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            format,
            verbosity,
        }
    }

    fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print any serializable value in the machine-readable format.
    pub fn emit<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let rendered = match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json | OutputFormat::Human => serde_json::to_string_pretty(value)?,
        };
        println!("{}", rendered.trim_end());
        Ok(())
    }

    /// Print a single resource.
    pub fn record<T: Serialize>(&self, title: &str, value: &T) -> Result<()> {
        if !self.is_human() {
            return self.emit(value);
        }

        if self.use_color {
            println!("{}", title.bright_white().bold());
        } else {
            println!("{}", title);
        }

        if let Value::Object(fields) = serde_json::to_value(value)? {
            let width = fields.keys().map(String::len).max().unwrap_or(0);
            for (key, value) in &fields {
                let Some(rendered) = render_field(value) else {
                    continue;
                };
                if self.use_color {
                    println!("  {:width$}  {}", key.cyan(), rendered, width = width);
                } else {
                    println!("  {:width$}  {}", key, rendered, width = width);
                }
            }
        }
        Ok(())
    }

    /// Print a list of resources, as a table in human mode.
    pub fn collection<T, F>(&self, items: &[T], headers: &[&str], row: F) -> Result<()>
    where
        T: Serialize,
        F: Fn(&T) -> Vec<String>,
    {
        if !self.is_human() {
            return self.emit(items);
        }

        if items.is_empty() {
            self.plain("No resources found.");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = items.iter().map(row).collect();
        self.table(headers, &rows);
        Ok(())
    }

    /// Print the outcome of a module run.
    pub fn module_result(&self, module: &str, output: &ModuleOutput) -> Result<()> {
        if !self.is_human() {
            return self.emit(output);
        }

        let status = if self.use_color {
            match output.status {
                ModuleStatus::Ok => "ok".green().to_string(),
                ModuleStatus::Changed => "changed".yellow().to_string(),
            }
        } else {
            output.status.to_string()
        };
        println!("{}: [{}] {}", status, module, output.msg);

        if let Some(diff) = &output.diff {
            self.diff(&diff.before, &diff.after);
        }

        if self.verbosity >= 1 && !output.data.is_empty() {
            println!("{}", serde_json::to_string_pretty(&output.data)?);
        }
        Ok(())
    }

    /// Confirmation of a completed change.
    pub fn success(&self, message: &str) {
        if !self.is_human() {
            let ok = serde_json::json!({ "status": "ok", "message": message });
            let _ = self.emit(&ok);
            return;
        }

        if self.use_color {
            println!("{}", message.green());
        } else {
            println!("{}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.format == OutputFormat::Json {
            let err = serde_json::json!({
                "type": "error",
                "message": message
            });
            eprintln!("{}", err);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print a debug message (requires higher verbosity)
    pub fn debug(&self, message: &str) {
        if self.verbosity < 2 {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "DEBUG:".magenta(), message);
        } else {
            eprintln!("DEBUG: {}", message);
        }
    }

    fn plain(&self, message: &str) {
        println!("{}", message);
    }

    /// Print a diff output
    pub fn diff(&self, old: &str, new: &str) {
        for line in old.lines() {
            if self.use_color {
                println!("{}", format!("- {}", line).red());
            } else {
                println!("- {}", line);
            }
        }
        for line in new.lines() {
            if self.use_color {
                println!("{}", format!("+ {}", line).green());
            } else {
                println!("+ {}", line);
            }
        }
    }

    /// Print a table
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        // Calculate column widths
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        let header_line = headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" | ");

        if self.use_color {
            println!("{}", header_line.bright_white().bold());
        } else {
            println!("{}", header_line);
        }

        let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        if self.use_color {
            println!("{}", sep.join("-+-").bright_black());
        } else {
            println!("{}", sep.join("-+-"));
        }

        for row in rows {
            let row_line = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join(" | ");
            println!("{}", row_line.trim_end());
        }
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

/// Render one field of a record, `None` for empty values.
fn render_field(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.to_string()),
    }
}

/// Display helper for optional cells.
pub fn cell(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}
