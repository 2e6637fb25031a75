use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use crate::hook::Hook;
use crate::hook::scope::HookScope;

/// A hook placed in an evaluation chain together with the scope it came from
#[derive(Clone)]
pub struct ActiveHook {
    pub hook: Arc<dyn Hook>,
    pub scope: HookScope,
}

impl ActiveHook {
    pub fn new(scope: HookScope, hook: Arc<dyn Hook>) -> Self {
        Self { hook, scope }
    }

    pub fn name(&self) -> &str {
        self.hook.name()
    }
}

impl fmt::Debug for ActiveHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveHook")
            .field("name", &self.name())
            .field("scope", &self.scope)
            .finish()
    }
}

/// Hooks grouped by the scope they were registered at
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<HookScope, Vec<Arc<dyn Hook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scope: HookScope, hook: Arc<dyn Hook>) {
        self.hooks.entry(scope).or_default().push(hook);
    }

    pub fn register_all(&mut self, scope: HookScope, hooks: impl IntoIterator<Item = Arc<dyn Hook>>) {
        self.hooks.entry(scope).or_default().extend(hooks);
    }

    pub fn with_hook(mut self, scope: HookScope, hook: Arc<dyn Hook>) -> Self {
        self.register(scope, hook);
        self
    }

    pub fn scope(&self, scope: HookScope) -> &[Arc<dyn Hook>] {
        self.hooks.get(&scope).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registry holding the hooks of `self` followed, scope by scope, by those of `other`
    pub fn merged(&self, other: &HookRegistry) -> HookRegistry {
        let mut merged = self.clone();
        for (scope, hooks) in &other.hooks {
            merged.register_all(*scope, hooks.iter().cloned());
        }
        merged
    }

    /// Flatten into the order `before` runs in: scopes in [`HookScope::ORDER`],
    /// registration order inside a scope.
    pub fn chain(&self) -> Vec<ActiveHook> {
        HookScope::ORDER
            .iter()
            .flat_map(|scope| {
                self.scope(*scope)
                    .iter()
                    .map(|hook| ActiveHook::new(*scope, hook.clone()))
            })
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.chain().iter().map(|it| it.name().to_string()).collect()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Hook for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn hook(name: &'static str) -> Arc<dyn Hook> {
        Arc::new(Named(name))
    }

    #[test]
    fn chain_orders_by_scope_then_registration() {
        let mut registry = HookRegistry::new();
        registry.register(HookScope::Provider, hook("provider"));
        registry.register(HookScope::Invocation, hook("invocation"));
        registry.register(HookScope::Api, hook("api-1"));
        registry.register(HookScope::Client, hook("client"));
        registry.register(HookScope::Api, hook("api-2"));

        assert_eq!(
            registry.names(),
            vec!["api-1", "api-2", "client", "invocation", "provider"]
        );
        assert_eq!(registry.chain()[2].scope, HookScope::Client);
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn merged_appends_without_touching_sources() {
        let global = HookRegistry::new().with_hook(HookScope::Api, hook("metrics"));
        let call = HookRegistry::new()
            .with_hook(HookScope::Api, hook("trace"))
            .with_hook(HookScope::Invocation, hook("debug"));

        let merged = global.merged(&call);

        assert_eq!(merged.names(), vec!["metrics", "trace", "debug"]);
        assert_eq!(global.names(), vec!["metrics"]);
        assert!(HookRegistry::new().is_empty());
        assert!(HookRegistry::new().scope(HookScope::Client).is_empty());
    }
}
