pub mod nonce;
pub mod pagination;
pub mod password;
pub mod slug;
pub mod token;
