pub use super::admin_users::Entity as AdminUsers;
pub use super::promotional_codes::Entity as PromotionalCodes;
