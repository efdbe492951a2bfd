//! Entry points for the three callers of the statistics pipeline
//!
//! - [`server`]: page-data loader, computes once per build/revalidation
//! - [`client`]: memoized pipeline that recomputes only when inputs change
//! - [`direct`]: one-shot call with default settings
//!
//! All three delegate to [`crate::pipeline::StatisticsPipeline`].

pub mod client;
pub mod direct;
pub mod server;

pub use client::MemoizedPipeline;
pub use direct::annotate_pools;
pub use server::{PageData, load_page_data};
