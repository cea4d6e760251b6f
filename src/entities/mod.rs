pub mod prelude;

pub mod admin_users;
pub mod promotional_codes;
