/// Access code lifecycle engine
///
/// PIN generation, window normalization, active/expired classification,
/// and the orchestration that ties them to the store, the lock gateway,
/// and the notifier.
pub mod classifier;
pub mod generator;
pub mod manager;
pub mod window;

pub use manager::AccessCodeManager;
