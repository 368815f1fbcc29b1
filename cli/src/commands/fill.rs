//! Fill command
//!
//! Loads the latest revision into an input session, collects one value per
//! field and prints the submitted map.

use anyhow::{anyhow, bail};
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use dynaform_core::infrastructure::TracingEventPublisher;
use dynaform_core::{EventPublisher, FieldDescriptor, FormInputSession, FormName, InputKind, SchemaUseCases, SessionState};

use super::Context;

pub async fn handle(ctx: &Context, form: &str, values: Vec<String>) -> anyhow::Result<()> {
    let service = ctx.service().await?;
    let mut session = FormInputSession::new(FormName::new(form)?);
    session.apply_load(service.latest_schema(form).await);

    match session.state() {
        SessionState::Ready => {}
        SessionState::NotFound => bail!("No form found for \"{}\".", form),
        SessionState::Error(message) => bail!("{}", message),
        other => bail!("Form cannot be filled while {}", other.name()),
    }

    if values.is_empty() {
        prompt_all(&mut session).await?;
    } else {
        for assignment in &values {
            let (label, value) = parse_assignment(assignment)?;
            session.set_value(label, value)?;
        }
    }

    let submitted = session.submit()?;
    TracingEventPublisher.publish(session.take_events()).await?;
    ctx.format.print_values(&submitted)
}

async fn prompt_all(session: &mut FormInputSession) -> anyhow::Result<()> {
    let fields: Vec<FieldDescriptor> = session.schema().map(|s| s.fields().to_vec()).unwrap_or_default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    for field in &fields {
        loop {
            match field.input_kind() {
                InputKind::Select(options) => {
                    println!("{}", field.label.bold());
                    for (i, option) in options.iter().enumerate() {
                        println!("  {}) {}", i + 1, option);
                    }
                    print!("Choose [1-{}]: ", options.len());
                }
                InputKind::Input(kind) => print!("{} ({}): ", field.label.bold(), kind),
            }
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                bail!("Input ended before the form was complete");
            };
            let value = match field.input_kind() {
                InputKind::Select(options) => resolve_choice(options, line.trim()),
                InputKind::Input(_) => line.trim_end_matches('\r').to_string(),
            };

            match session.set_value(&field.label, value) {
                Ok(()) => break,
                Err(e) => eprintln!("{}", e.to_string().red()),
            }
        }
    }
    Ok(())
}

/// A 1-based option number selects that option; anything else is taken as typed
fn resolve_choice(options: &[String], input: &str) -> String {
    match input.parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => options[n - 1].clone(),
        _ => input.to_string(),
    }
}

fn parse_assignment(assignment: &str) -> anyhow::Result<(&str, &str)> {
    assignment
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected LABEL=VALUE, got '{}'", assignment))
}
