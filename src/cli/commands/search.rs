//! Search Command
//!
//! Query the encyclopedia tool directly, under the same call budget the
//! Research stage uses.

use std::sync::Arc;

use crate::cli::util::CommandContext;
use crate::tools::{CallBudget, WikiSearch};
use crate::types::Result;

pub async fn run(query: &str, max_results: Option<usize>, lang: Option<String>) -> Result<()> {
    let ctx = CommandContext::load()?;
    let search = &ctx.config.search;

    let tool = WikiSearch::new(
        Arc::new(CallBudget::new(search.call_limit)),
        search.timeout_secs,
    )?;
    let text = tool
        .search(
            query,
            max_results.unwrap_or(search.max_results),
            lang.as_deref().unwrap_or(&search.lang),
        )
        .await?;

    println!("{}", text);
    Ok(())
}
