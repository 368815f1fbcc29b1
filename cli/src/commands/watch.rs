//! Watch command

use colored::Colorize;
use std::time::Duration;

use dynaform_core::{SchemaWatcher, WatchState};

use super::Context;

pub async fn handle(ctx: &Context, form: &str, interval: Option<u64>) -> anyhow::Result<()> {
    let interval = match interval {
        Some(0) => anyhow::bail!("--interval must be at least 1 second"),
        Some(secs) => Duration::from_secs(secs),
        None => ctx.config.poll_interval(),
    };

    let service = ctx.service().await?;
    let handle = SchemaWatcher::new(service).with_interval(interval).spawn(form);
    let mut updates = handle.subscribe();

    eprintln!("{}", format!("Watching \"{}\" every {}s, Ctrl-C to stop", form, interval.as_secs()).dimmed());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                render(ctx, form, &state)?;
            }
        }
    }

    handle.stop().await;
    Ok(())
}

fn render(ctx: &Context, form: &str, state: &WatchState) -> anyhow::Result<()> {
    match state {
        WatchState::Loading => Ok(()),
        WatchState::Ready(schema) => ctx.format.print_schema(schema),
        WatchState::NotFound => {
            println!("{}", format!("No form found for \"{}\".", form).yellow());
            Ok(())
        }
        WatchState::Failed(message) => {
            println!("{}", message.red());
            Ok(())
        }
    }
}
