//! Integration tests: the full pricing pipeline against an in-memory
//! listing source.

mod mock_source;
mod pricing;
