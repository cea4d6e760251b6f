//! List codes command handler

use anyhow::anyhow;

use crate::models::code::{CodeFilter, CodeSort, CodeStatus};
use crate::state::SharedState;

pub async fn cmd_list_codes(
    state: &SharedState,
    status: Option<&str>,
    search: Option<&str>,
    sort: &str,
    page: u64,
    limit: u64,
) -> anyhow::Result<()> {
    let filter = CodeFilter {
        page,
        page_size: limit,
        search: search.map(str::to_string),
        status: CodeStatus::parse_filter(status.unwrap_or_default()).map_err(|e| anyhow!(e))?,
        sort: sort.parse::<CodeSort>().map_err(|e| anyhow!(e))?,
    };

    let result = state.code_service.list_codes(filter).await?;

    if result.codes.is_empty() {
        println!("No promotional codes found.");
        println!();
        println!("Create one with: qrpromo generate");
        return Ok(());
    }

    println!("Promotional codes ({} matching)", result.total);
    println!("{:-<70}", "");

    for code in &result.codes {
        let status = if code.is_used { "used  " } else { "unused" };
        let used_at = code
            .used_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "{:>6}  {}  {}  {}  {}",
            code.id,
            code.code,
            status,
            code.created_at.format("%Y-%m-%d %H:%M:%S"),
            used_at
        );
    }

    Ok(())
}
