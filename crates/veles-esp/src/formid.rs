//! FormID scoping between file-local and load-order-global form.
//!
//! On disk a FormID's top byte indexes the owning plugin's master list. In
//! memory every id is held globally scoped against the full plugin registry,
//! so ids from different plugins compare directly. The registry is populated
//! up front and read-only while parsing; the remap context borrows it along
//! with one plugin's master list.

/// Top byte marking an id whose master could not be resolved.
pub const UNRESOLVED: u8 = 0xFF;

const INDEX_SHIFT: u32 = 24;
const LOW_MASK: u32 = 0x00FF_FFFF;

/// The full set of plugins in a load order, in registration order.
///
/// Lookup is by filename, case-insensitive, matching how plugins name their
/// masters on disk.
#[derive(Debug, Default, Clone)]
pub struct PluginRegistry {
    names: Vec<String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin, returning its global index. Re-registering an
    /// already-known name returns the existing index.
    pub fn register(&mut self, name: &str) -> u8 {
        if let Some(index) = self.lookup(name) {
            return index;
        }
        debug_assert!(self.names.len() < UNRESOLVED as usize);
        self.names.push(name.to_owned());
        (self.names.len() - 1) as u8
    }

    /// Global index of a plugin by filename.
    pub fn lookup(&self, name: &str) -> Option<u8> {
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|i| i as u8)
    }

    /// Filename registered at a global index.
    pub fn name(&self, index: u8) -> Option<&str> {
        self.names.get(index as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One plugin's view of the registry: its master list and its own index.
#[derive(Debug, Clone, Copy)]
pub struct RemapContext<'a> {
    registry: &'a PluginRegistry,
    masters: &'a [String],
    self_index: u8,
}

impl<'a> RemapContext<'a> {
    pub fn new(registry: &'a PluginRegistry, masters: &'a [String], self_index: u8) -> Self {
        Self {
            registry,
            masters,
            self_index,
        }
    }

    /// Rescope a file-local id to the global registry.
    ///
    /// The top byte indexes the master list; a value equal to the list length
    /// means the plugin itself. An index past the list, or a master missing
    /// from the registry, yields the unresolved marker with the low bits kept.
    pub fn to_global(&self, id: u32) -> u32 {
        let index = (id >> INDEX_SHIFT) as usize;
        let low = id & LOW_MASK;
        let scope = if index == self.masters.len() {
            self.self_index
        } else if let Some(master) = self.masters.get(index) {
            match self.registry.lookup(master) {
                Some(global) => global,
                None => UNRESOLVED,
            }
        } else {
            UNRESOLVED
        };
        (scope as u32) << INDEX_SHIFT | low
    }

    /// Rescope a global id back to this plugin's file-local form.
    ///
    /// Ids scoped to a plugin that is neither this plugin nor one of its
    /// masters cannot be expressed on disk; they keep the unresolved marker.
    pub fn to_local(&self, id: u32) -> u32 {
        let scope = (id >> INDEX_SHIFT) as u8;
        let low = id & LOW_MASK;
        if scope == self.self_index {
            return (self.masters.len() as u32) << INDEX_SHIFT | low;
        }
        let position = self
            .masters
            .iter()
            .position(|m| self.registry.lookup(m) == Some(scope));
        match position {
            Some(index) => (index as u32) << INDEX_SHIFT | low,
            None => (UNRESOLVED as u32) << INDEX_SHIFT | low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (PluginRegistry, Vec<String>) {
        let mut registry = PluginRegistry::new();
        registry.register("A.esm");
        registry.register("Self.esp");
        (registry, vec!["A.esm".to_owned()])
    }

    #[test]
    fn registry_is_case_insensitive() {
        let (registry, _) = fixture();
        assert_eq!(registry.lookup("a.ESM"), Some(0));
        assert_eq!(registry.lookup("missing.esp"), None);
    }

    #[test]
    fn register_is_idempotent() {
        let (mut registry, _) = fixture();
        assert_eq!(registry.register("A.ESM"), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn master_index_resolves_to_master_scope() {
        let (registry, masters) = fixture();
        let ctx = RemapContext::new(&registry, &masters, 1);
        assert_eq!(ctx.to_global(0x0000_1234), 0x0000_1234);
    }

    #[test]
    fn own_index_resolves_to_self_scope() {
        let (registry, masters) = fixture();
        let ctx = RemapContext::new(&registry, &masters, 1);
        assert_eq!(ctx.to_global(0x0100_1234), 0x0100_1234);
    }

    #[test]
    fn index_past_master_list_is_unresolved() {
        let (registry, masters) = fixture();
        let ctx = RemapContext::new(&registry, &masters, 1);
        assert_eq!(ctx.to_global(0x0200_1234), 0xFF00_1234);
    }

    #[test]
    fn unregistered_master_is_unresolved() {
        let mut registry = PluginRegistry::new();
        registry.register("Self.esp");
        let masters = vec!["Gone.esm".to_owned()];
        let ctx = RemapContext::new(&registry, &masters, 0);
        assert_eq!(ctx.to_global(0x0000_5678), 0xFF00_5678);
    }

    #[test]
    fn local_and_global_invert_for_resolvable_ids() {
        let (registry, masters) = fixture();
        let ctx = RemapContext::new(&registry, &masters, 1);
        for id in [0x0000_1234, 0x0100_1234] {
            assert_eq!(ctx.to_local(ctx.to_global(id)), id);
        }
    }

    #[test]
    fn foreign_scope_stays_marked_on_write() {
        let (mut registry, masters) = fixture();
        registry.register("Other.esp");
        let ctx = RemapContext::new(&registry, &masters, 1);
        // Other.esp (global index 2) is not in the master list.
        assert_eq!(ctx.to_local(0x0200_9999), 0xFF00_9999);
        assert_eq!(ctx.to_local(0xFF00_9999), 0xFF00_9999);
    }
}
