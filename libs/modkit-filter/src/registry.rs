//! Process-wide descriptor cache.
//!
//! Filter shapes and record schemas are derived once per type and shared as
//! `Arc`s. Construction runs outside the map lock: concurrent first requests
//! for the same type may each build a descriptor, but only the first one
//! published is kept and every caller receives that one.

use std::any::{Any, TypeId};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tracing::trace;

type Descriptor = Arc<dyn Any + Send + Sync>;

/// Keyed by (owner type, descriptor type) so a type may own several descriptors.
static DESCRIPTORS: LazyLock<DashMap<(TypeId, TypeId), Descriptor>> = LazyLock::new(DashMap::new);

/// Fetch the `D` descriptor of `Owner`, building and publishing it on first use.
pub fn cached<Owner, D>(build: impl FnOnce() -> D) -> Arc<D>
where
    Owner: 'static,
    D: Send + Sync + 'static,
{
    let key = (TypeId::of::<Owner>(), TypeId::of::<D>());

    let existing = DESCRIPTORS.get(&key).map(|entry| Arc::clone(entry.value()));
    if let Some(found) = existing.and_then(|d| d.downcast::<D>().ok()) {
        return found;
    }

    let built = Arc::new(build());
    trace!(
        descriptor = std::any::type_name::<D>(),
        owner = std::any::type_name::<Owner>(),
        "publishing descriptor"
    );
    let published = DESCRIPTORS
        .entry(key)
        .or_insert_with(|| Arc::clone(&built) as Descriptor)
        .value()
        .clone();
    published.downcast::<D>().unwrap_or(built)
}
