use mc_02_module_manager::ModuleDescriptor;

use crate::keeper::ParamsKeeper;
use crate::MODULE_NAME;

/// Params owns partitions but implements no hook.
pub fn descriptor(keeper: &ParamsKeeper) -> ModuleDescriptor {
    ModuleDescriptor::new(MODULE_NAME)
        .with_store_keys([keeper.store_key().clone(), keeper.transient_key().clone()])
}
