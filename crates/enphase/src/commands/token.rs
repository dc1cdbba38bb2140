//! `enphase token`: print a freshly issued gateway token.

use crate::error::CliError;
use crate::output;

use super::Context;

pub async fn handle(ctx: &Context<'_>) -> Result<(), CliError> {
    // `connect` already issued one; ask for a new one so the printed
    // token has the longest possible remaining lifetime.
    let token = ctx.client.fetch_token().await?;
    output::print_output(token.expose(), ctx.global.quiet);
    Ok(())
}
