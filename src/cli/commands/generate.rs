use crate::state::SharedState;

pub async fn cmd_generate(state: &SharedState, count: u32) -> anyhow::Result<()> {
    println!("Generated codes:");
    println!("{:-<40}", "");

    for _ in 0..count {
        let code = state.code_service.generate_code().await?;
        println!("{}  (id {})", code.code, code.id);
    }

    Ok(())
}
