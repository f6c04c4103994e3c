//! Lazy proxies for deferred services.

use std::sync::{Arc, Weak};

use crate::container::ContainerShared;
use crate::error::{DiError, DiResult};
use crate::inject::{InjectionLink, ServiceObject};
use crate::value::Value;

/// Stand-in returned by a deferred service before its implementation has
/// run.
///
/// Every method call directed at the proxy forces the implementation
/// (exactly once per instance), stores the real value in the owning
/// instance's cache slot, and forwards the call to it. Once resolved, the
/// container's accessor hands out the real value directly, so the proxy is
/// only ever on the hot path for the very first use. If no method is ever
/// invoked, the implementation never runs.
pub(crate) struct DeferredProxy {
    container: Weak<ContainerShared>,
    service: Arc<str>,
    link: InjectionLink,
}

impl DeferredProxy {
    pub(crate) fn new(container: Weak<ContainerShared>, service: Arc<str>) -> Self {
        Self {
            container,
            service,
            link: InjectionLink::new(),
        }
    }

    /// Runs the implementation (or returns the already-resolved value) and
    /// memoizes the result in the owning instance.
    fn force(&self) -> DiResult<Value> {
        let container = self
            .container
            .upgrade()
            .ok_or_else(|| DiError::UnknownService(self.service.to_string()))?;
        container.force_deferred(&self.service)
    }
}

impl ServiceObject for DeferredProxy {
    fn dispatch(&self, method: &str, args: &[Value]) -> Option<DiResult<Value>> {
        // The proxy understands every method: resolve, then forward.
        Some(self.force().and_then(|real| real.call(method, args)))
    }

    fn injection_link(&self) -> &InjectionLink {
        &self.link
    }
}
