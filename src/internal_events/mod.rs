mod prelude;

mod config;
mod console;
mod kubernetes_events;

pub mod kubernetes;

pub use self::config::*;
pub use self::console::*;
pub use self::kubernetes_events::*;
pub(crate) use self::prelude::{error_stage, error_type};

pub trait InternalEvent: Sized {
    fn emit(self);
}

pub fn emit(event: impl InternalEvent) {
    event.emit();
}

#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::internal_events::emit($event)
    };
}
