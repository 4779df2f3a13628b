mod member;
mod store;

pub use member::MemberId;
pub use store::StoreId;
