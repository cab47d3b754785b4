// Zoho Mail: OAuth refresh-token exchange and the send-message endpoint.

pub mod mail;
pub mod token;

pub use mail::ZohoMailClient;
pub use token::ZohoTokenProvider;
