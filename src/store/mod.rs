pub mod supabase;

pub use supabase::SupabaseStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{RunState, SignalRecord};

#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Append one record to the signal log. Best-effort: never surfaces
    /// an error into the caller's critical path.
    async fn append(&self, record: &SignalRecord) -> bool;

    /// Most recent records, newest first, length ≤ limit.
    async fn list_recent(&self, limit: usize) -> Result<Vec<SignalRecord>>;

    /// The shared singleton. A store with no row yet yields the default
    /// disabled state; that is not an error.
    async fn read_run_state(&self) -> Result<RunState>;

    /// Whole-record replace of the singleton, last-write-wins.
    async fn write_run_state(&self, enabled: bool, active_instrument: Option<&str>) -> bool;
}
