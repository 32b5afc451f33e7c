//! Integration tests for flow node storage

mod cache_coherence;
mod deferred_writes;
mod end_to_end;
mod round_trip;
mod support;
