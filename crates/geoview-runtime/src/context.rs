#![forbid(unsafe_code)]

//! Collaborators shared by every view of one application.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use geoview_core::{EngineFactory, MemoryPreferences, NullObserver, PreferenceStore, ViewObserver};

use crate::registry::PeerRegistry;
use crate::sharing::SharingBus;

/// Set while the host is loading a saved bundle; legend refills are
/// debounced while it is on.
#[derive(Debug, Clone, Default)]
pub struct BulkLoadFlag(Arc<AtomicBool>);

impl BulkLoadFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, loading: bool) {
        self.0.store(loading, Ordering::Release);
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Everything a coordinator needs from outside itself.
#[derive(Clone)]
pub struct ViewContext {
    pub registry: Arc<PeerRegistry>,
    pub bus: Arc<SharingBus>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub observer: Arc<dyn ViewObserver>,
    pub engines: Arc<dyn EngineFactory>,
    pub bulk_load: BulkLoadFlag,
}

impl fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewContext")
            .field("registry", &self.registry)
            .field("bus", &self.bus)
            .field("bulk_loading", &self.bulk_load.is_loading())
            .finish_non_exhaustive()
    }
}

impl ViewContext {
    /// Fresh registry and bus, in-memory preferences, no observer.
    pub fn new(engines: Arc<dyn EngineFactory>) -> Self {
        Self {
            registry: Arc::new(PeerRegistry::new()),
            bus: Arc::new(SharingBus::new()),
            preferences: Arc::new(MemoryPreferences::new()),
            observer: Arc::new(NullObserver),
            engines,
            bulk_load: BulkLoadFlag::new(),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ViewObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_preferences(mut self, preferences: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = preferences;
        self
    }
}
