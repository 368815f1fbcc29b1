//! Output formatting

use clap::ValueEnum;
use colored::Colorize;
use dynaform_core::application::dto::FieldView;
use dynaform_core::{FormSchemaRevision, SubmittedValues};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Print serializable data; `table` renders the rows instead
    pub fn print<T: Serialize, R: Tabled>(&self, data: &T, table: impl FnOnce() -> Vec<R>) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
            OutputFormat::Table => println!("{}", Table::new(table()).with(Style::rounded())),
        }
        Ok(())
    }

    pub fn print_schema(&self, schema: &FormSchemaRevision) -> anyhow::Result<()> {
        if let OutputFormat::Table = self {
            println!(
                "{} {} {}",
                schema.form_name().as_str().bold(),
                format!("revision {}", schema.id()).dimmed(),
                format!("created {}", schema.created_at().to_rfc3339()).dimmed(),
            );
        }
        self.print(schema, || FieldView::from_schema(schema).into_iter().map(FieldRow::from).collect())
    }

    pub fn print_values(&self, values: &SubmittedValues) -> anyhow::Result<()> {
        self.print(values, || {
            values
                .iter()
                .map(|(label, value)| ValueRow { label: label.clone(), value: value.clone() })
                .collect()
        })
    }
}

#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "#")]
    pub position: usize,
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Type")]
    pub field_type: String,
    #[tabled(rename = "Options")]
    pub options: String,
}

impl From<FieldView> for FieldRow {
    fn from(view: FieldView) -> Self {
        Self {
            position: view.position,
            label: view.label,
            field_type: view.field_type,
            options: view.options,
        }
    }
}

#[derive(Tabled)]
pub struct ValueRow {
    #[tabled(rename = "Field")]
    pub label: String,
    #[tabled(rename = "Value")]
    pub value: String,
}
