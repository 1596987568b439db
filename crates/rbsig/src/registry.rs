//! Registry for dialect emitters.

use crate::ir::Dialect;
use crate::traits::Emitter;
use std::sync::{OnceLock, RwLock};

/// Global emitter registry.
static EMITTERS: RwLock<Vec<&'static dyn Emitter>> = RwLock::new(Vec::new());
static EMITTERS_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Register a custom emitter.
pub fn register_emitter(emitter: &'static dyn Emitter) {
    EMITTERS.write().unwrap().push(emitter);
}

fn init_emitters() {
    EMITTERS_INITIALIZED.get_or_init(|| {
        #[cfg(feature = "write-rbi")]
        {
            register_emitter(&crate::output::rbi::RBI_EMITTER);
        }
        #[cfg(feature = "write-rbs")]
        {
            register_emitter(&crate::output::rbs::RBS_EMITTER);
        }
    });
}

/// Get an emitter by dialect.
pub fn emitter_for_dialect(dialect: Dialect) -> Option<&'static dyn Emitter> {
    init_emitters();
    EMITTERS
        .read()
        .unwrap()
        .iter()
        .find(|e| e.dialect() == dialect)
        .copied()
}

/// Get an emitter by file extension.
pub fn emitter_for_extension(ext: &str) -> Option<&'static dyn Emitter> {
    init_emitters();
    EMITTERS
        .read()
        .unwrap()
        .iter()
        .find(|e| e.extension() == ext)
        .copied()
}

/// Get all registered emitters.
pub fn emitters() -> Vec<&'static dyn Emitter> {
    init_emitters();
    EMITTERS.read().unwrap().clone()
}
