//! Show command

use anyhow::anyhow;

use dynaform_core::error::Operation;
use dynaform_core::SchemaUseCases;

use super::Context;

pub async fn handle(ctx: &Context, form: &str) -> anyhow::Result<()> {
    let service = ctx.service().await?;
    let schema = service
        .latest_schema(form)
        .await
        .map_err(|e| anyhow!(e.user_message(Operation::Load)))?;

    ctx.format.print_schema(&schema)
}
