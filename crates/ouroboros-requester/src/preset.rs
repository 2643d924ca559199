//! Preset construction
//!
//! Wraps resource constructors so a shared base configuration (base URL,
//! headers, auth) is merged under whatever configuration the caller passes.
//! The merge is shallow: a caller key replaces the preset key entirely.

use crate::options::ConfigMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Constructor taking a configuration mapping
pub type Constructor<T> = Arc<dyn Fn(ConfigMap) -> T + Send + Sync>;

/// Entry of a resource set: something to construct, or a ready value
pub enum Resource<T> {
    Constructor(Constructor<T>),
    Value(T),
}

impl<T> Resource<T> {
    /// Wrap a closure as a constructor entry
    pub fn constructor(f: impl Fn(ConfigMap) -> T + Send + Sync + 'static) -> Self {
        Resource::Constructor(Arc::new(f))
    }

    /// The constructor, if this entry is one
    pub fn as_constructor(&self) -> Option<&Constructor<T>> {
        match self {
            Resource::Constructor(ctor) => Some(ctor),
            Resource::Value(_) => None,
        }
    }

    /// Construct with `config`, or hand back a clone of the stored value
    pub fn instantiate(&self, config: ConfigMap) -> T
    where
        T: Clone,
    {
        match self {
            Resource::Constructor(ctor) => ctor(config),
            Resource::Value(value) => value.clone(),
        }
    }
}

impl<T> Clone for Resource<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Resource::Constructor(ctor) => Resource::Constructor(Arc::clone(ctor)),
            Resource::Value(value) => Resource::Value(value.clone()),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Constructor(_) => f.write_str("Constructor(..)"),
            Resource::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// Shallow merge with `overrides` winning on key collision
pub fn merge_config(base: &ConfigMap, overrides: ConfigMap) -> ConfigMap {
    let mut merged = base.clone();
    merged.extend(overrides);
    merged
}

/// Bind `base` under every future call of `ctor`
pub fn preset<T: 'static>(ctor: Constructor<T>, base: ConfigMap) -> Constructor<T> {
    Arc::new(move |config: ConfigMap| ctor(merge_config(&base, config)))
}

/// Apply [`preset`] to every constructor in a resource set
///
/// Plain values pass through unchanged.
pub fn preset_resource_arguments<T: 'static>(
    resources: BTreeMap<String, Resource<T>>,
    preset_config: &ConfigMap,
) -> BTreeMap<String, Resource<T>> {
    resources
        .into_iter()
        .map(|(name, resource)| {
            let resource = match resource {
                Resource::Constructor(ctor) => {
                    tracing::trace!(resource = %name, "Presetting constructor");
                    Resource::Constructor(preset(ctor, preset_config.clone()))
                }
                value @ Resource::Value(_) => value,
            };
            (name, resource)
        })
        .collect()
}
