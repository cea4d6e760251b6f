use crate::state::SharedState;

pub async fn cmd_stats(state: &SharedState) -> anyhow::Result<()> {
    let stats = state.code_service.stats().await?;

    println!("Promotional code statistics");
    println!("{:-<40}", "");
    println!("Total:   {}", stats.total);
    println!("Used:    {}", stats.used);
    println!("Unused:  {}", stats.unused);
    println!("Usage:   {}%", stats.usage_rate());

    Ok(())
}
