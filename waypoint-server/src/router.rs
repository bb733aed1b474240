use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use waypoint_router::{Dispatcher, Router};

use crate::config::ProjectRoutes;

/// Rebuild-and-atomically-swap wrapper around a frozen [`Dispatcher`]:
/// serving reads the current dispatch table lock-free while a config
/// reload compiles a replacement and stores it whole.
#[derive(Clone)]
pub struct SwappableRouter {
    inner: Arc<ArcSwap<Dispatcher<String>>>,
}

impl SwappableRouter {
    pub fn try_new(routes: &ProjectRoutes) -> Result<Self> {
        let dispatcher = Self::compile(routes)?;
        Ok(Self {
            inner: Arc::new(ArcSwap::from_pointee(dispatcher)),
        })
    }

    fn compile(routes: &ProjectRoutes) -> Result<Dispatcher<String>> {
        let mut router = Router::new();
        for (template, specs) in routes {
            for spec in specs {
                router.add_route(
                    &[spec.method.clone()],
                    template,
                    spec.handler.clone(),
                    &spec.overrides(),
                )?;
            }
        }
        Ok(router.build()?)
    }

    pub fn load(&self) -> Arc<Dispatcher<String>> {
        self.inner.load_full()
    }

    pub fn swap(&self, routes: &ProjectRoutes) -> Result<()> {
        let dispatcher = Self::compile(routes)?;
        self.inner.store(Arc::new(dispatcher));
        Ok(())
    }
}
