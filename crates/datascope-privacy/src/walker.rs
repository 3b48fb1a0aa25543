//! Namespace → module enumeration.

use std::sync::Arc;

use datascope_core::{
    Module, ModuleFilter, ModuleFinder, Namespace, NamespaceFilter, NamespaceFinder, Result,
};
use tracing::debug;

use crate::scope::ConnectionScope;

/// Walks every namespace and, within each, every in-scope module.
///
/// Namespace visibility is left to the namespace store: the walk asks for all
/// namespaces with an empty filter.
pub struct NamespaceModuleWalker {
    namespaces: Arc<dyn NamespaceFinder>,
    modules: Arc<dyn ModuleFinder>,
}

impl NamespaceModuleWalker {
    pub fn new(namespaces: Arc<dyn NamespaceFinder>, modules: Arc<dyn ModuleFinder>) -> Self {
        Self { namespaces, modules }
    }

    /// Lazily yield `(namespace, module)` pairs in store order.
    ///
    /// Namespaces are listed up front; modules are listed one namespace at a
    /// time as the iterator advances, so a consumer that stops at the first
    /// `Err` issues no further module queries. A module-listing failure is
    /// yielded as a single `Err` item.
    pub fn walk<'a>(
        &'a self,
        scope: &'a ConnectionScope,
    ) -> Result<impl Iterator<Item = Result<(Namespace, Module)>> + 'a> {
        let namespaces = self.namespaces.find_namespaces(&NamespaceFilter::default())?;
        debug!("Walking {} namespaces (scoped={})", namespaces.len(), scope.is_scoped());

        Ok(namespaces.into_iter().flat_map(move |ns| {
            let pairs: Vec<Result<(Namespace, Module)>> =
                match self.modules.find_modules(&ModuleFilter { namespace_id: ns.id }) {
                    Err(e) => vec![Err(e)],
                    Ok(modules) => modules
                        .into_iter()
                        .filter(|m| {
                            let conn = m.model_config.connection_id;
                            let allowed = scope.allows(conn);
                            if !allowed {
                                debug!(
                                    "Skipping module {} ({}): connection {} out of scope",
                                    m.id, m.handle, conn
                                );
                            }
                            allowed
                        })
                        .map(|m| Ok((ns.clone(), m)))
                        .collect(),
                };
            pairs
        }))
    }
}
