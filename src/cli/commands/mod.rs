mod generate;
mod list;
mod redeem;
mod stats;

pub use generate::cmd_generate;
pub use list::cmd_list_codes;
pub use redeem::cmd_redeem;
pub use stats::cmd_stats;
