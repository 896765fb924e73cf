//! Identity plumbing: access tokens issued by the accounts service.

pub mod jwt;
