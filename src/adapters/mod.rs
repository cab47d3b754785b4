// Adapters layer: concrete implementations of the domain ports.

pub mod dry_run;
pub mod zoho;
