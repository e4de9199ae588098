// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer identity types and creation records.

use alloc::string::String;
use core::fmt;

/// Compositor-assigned identity of a layer.
///
/// Stable for the lifetime of the layer. The tracer uses it as the key for
/// baseline state and creation-record bookkeeping; it carries no ownership
/// of the underlying layer object.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub i32);

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.0)
    }
}

/// Opaque identity token for a compositor-side layer object.
///
/// Producers address layer state changes by handle because that is what the
/// commit path carries; the tracer resolves handles to [`LayerId`]s using
/// the `on_layer_added` notifications. A handle is only ever compared and
/// used as a map key — never dereferenced and never owned.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerHandle(pub u64);

impl fmt::Debug for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerHandle({:#x})", self.0)
    }
}

/// Record of a layer creation observed from the compositor.
///
/// Created when the compositor reports a new layer. The record travels with
/// the first trace entry flushed after the observation, and is retained by
/// the starting-state store once that entry is evicted, so the trace always
/// explains where every live layer came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerCreationRecord {
    /// Identity of the created layer.
    pub id: LayerId,
    /// Human-readable layer name, as assigned by the client.
    pub name: String,
    /// Creation flags, opaque to the tracer.
    pub flags: u32,
    /// Parent layer, or `None` for a root layer.
    pub parent: Option<LayerId>,
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn layer_id_orders_by_value() {
        assert!(LayerId(1) < LayerId(2), "ids must order numerically");
        assert_eq!(format!("{:?}", LayerId(7)), "LayerId(7)");
    }

    #[test]
    fn creation_record_equality() {
        let a = LayerCreationRecord {
            id: LayerId(1),
            name: "parent".to_string(),
            flags: 123,
            parent: None,
        };
        let mut b = a.clone();
        assert_eq!(a, b);
        b.parent = Some(LayerId(0));
        assert_ne!(a, b);
    }
}
