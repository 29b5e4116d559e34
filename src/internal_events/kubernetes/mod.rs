pub mod informer;
pub mod meta_cache;
pub mod watcher;
