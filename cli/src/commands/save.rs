//! Save command

use anyhow::{anyhow, bail, Context as _};
use colored::Colorize;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use dynaform_core::error::Operation;
use dynaform_core::{FieldCandidate, OptionsInput, SaveSchemaCommand, SchemaUseCases};

use super::Context;

/// Accepted field file layouts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldsFile {
    Command {
        #[serde(rename = "formName")]
        form_name: Option<String>,
        fields: Vec<FieldCandidate>,
    },
    Fields(Vec<FieldCandidate>),
}

pub async fn handle(
    ctx: &Context,
    form: Option<String>,
    fields: Vec<String>,
    file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (file_form, candidates) = match file {
        Some(path) => read_fields_file(&path)?,
        None => (None, fields.iter().map(|s| parse_field_spec(s)).collect()),
    };

    let form_name = form
        .or(file_form)
        .ok_or_else(|| anyhow!("--form is required unless the file carries a formName"))?;

    let service = ctx.service().await?;
    let id = service
        .save_schema(SaveSchemaCommand::new(form_name.clone(), candidates))
        .await
        .map_err(|e| anyhow!(e.user_message(Operation::Save)))?;

    println!("{} {} ({})", "Form saved with ID:".green(), id, form_name);
    Ok(())
}

/// `LABEL:TYPE` or `LABEL:TYPE:OPT,OPT`. Missing parts are left for the
/// validator to report.
pub fn parse_field_spec(spec: &str) -> FieldCandidate {
    let mut parts = spec.splitn(3, ':');
    let label = parts.next().map(str::to_string);
    let field_type = parts.next().map(str::to_string);
    let options = parts.next().map(|o| OptionsInput::Csv(o.to_string()));

    FieldCandidate { label, field_type, options }
}

fn read_fields_file(path: &Path) -> anyhow::Result<(Option<String>, Vec<FieldCandidate>)> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let parsed = parse_fields_file(path, &content)?;
    Ok(match parsed {
        FieldsFile::Command { form_name, fields } => (form_name, fields),
        FieldsFile::Fields(fields) => (None, fields),
    })
}

fn parse_fields_file(path: &Path, content: &str) -> anyhow::Result<FieldsFile> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
    let parsed = match extension.as_str() {
        "json" => serde_json::from_str(content)?,
        "yaml" | "yml" => serde_yaml::from_str(content)?,
        other => bail!("Unsupported field file type '{}' (use .json, .yaml or .yml)", other),
    };
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_spec() {
        assert_eq!(parse_field_spec("Name:text"), FieldCandidate::new("Name", "text"));
        assert_eq!(
            parse_field_spec("Role:dropdown:Admin, User"),
            FieldCandidate::new("Role", "dropdown").with_options(OptionsInput::Csv("Admin, User".into()))
        );

        let missing_type = parse_field_spec("Age");
        assert_eq!(missing_type.label.as_deref(), Some("Age"));
        assert!(missing_type.field_type.is_none());
    }

    #[test]
    fn test_yaml_field_list() {
        let parsed = parse_fields_file(
            Path::new("fields.yaml"),
            "- label: Name\n  type: text\n- label: Role\n  type: dropdown\n  options: [Admin, User]\n",
        )
        .unwrap();
        match parsed {
            FieldsFile::Fields(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[1].options, Some(OptionsInput::List(vec!["Admin".into(), "User".into()])));
            }
            other => panic!("unexpected layout {:?}", other),
        }
    }

    #[test]
    fn test_json_command_layout() {
        let parsed = parse_fields_file(
            Path::new("signup.JSON"),
            r#"{"formName": "Signup", "fields": [{"label": "Name", "type": "text"}]}"#,
        )
        .unwrap();
        match parsed {
            FieldsFile::Command { form_name, fields } => {
                assert_eq!(form_name.as_deref(), Some("Signup"));
                assert_eq!(fields.len(), 1);
            }
            other => panic!("unexpected layout {:?}", other),
        }
    }

    #[test]
    fn test_unknown_extension_rejected() {
        assert!(parse_fields_file(Path::new("fields.txt"), "[]").is_err());
    }
}
