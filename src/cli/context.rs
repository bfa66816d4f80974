//! Per-invocation context: the discovered config plus the output mode,
//! threaded through every command handler instead of living as global
//! state (spec.md §9: "no global mutable state").

use sdd_config::Config;
use sdd_store::SpecStore;
use sdd_transactor::Transactor;

pub struct Context {
    pub config: Config,
    pub json: bool,
    pub quiet: bool,
}

impl Context {
    #[must_use]
    pub fn store(&self) -> SpecStore {
        SpecStore::new(self.config.specs_root.clone())
    }

    #[must_use]
    pub fn transactor(&self) -> Transactor {
        Transactor::new(self.store())
    }
}
