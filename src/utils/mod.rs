//! Utility functions for token ids, URL encryption and request handling.
//!
//! - [`token_id`] - Random token id generation and syntax checks
//! - [`cipher`] - Authenticated encryption of target URLs
//! - [`url_validator`] - Well-formedness check for target URLs
//! - [`client_ip`] - Client address extraction for access logs
//! - [`db_error`] - Classification of database errors

pub mod cipher;
pub mod client_ip;
pub mod db_error;
pub mod token_id;
pub mod url_validator;
