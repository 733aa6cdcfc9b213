pub mod debounce;
pub mod dnd;
pub mod engine;
pub mod events;
pub mod export;
pub mod identity;
pub mod migrate;
pub mod persistence;
pub mod priority;
pub mod search;
pub mod storage;
pub mod sync;
pub mod types;
