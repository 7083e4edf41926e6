//! Annotations and the marker resolver.
//!
//! An [`Annotation`] is a value attached to a listener method. Annotation
//! types may themselves carry annotations (meta-annotations), which lets a
//! project define its own marker that implies [`Subscribe`]:
//!
//! ```rust,ignore
//! #[derive(Debug, Default, Annotation)]
//! #[annotation(meta(Subscribe))]
//! struct Audited;
//!
//! #[listener]
//! impl Ledger {
//!     #[annotate(Audited)]
//!     pub fn on_transfer(&self, transfer: &Transfer) { /* ... */ }
//! }
//! ```
//!
//! [`resolve`] walks that graph depth-first with a visited set, so
//! self-annotating and mutually-annotating types terminate.

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A shared, type-erased annotation instance.
pub type AnnotationRef = Arc<dyn Annotation>;

/// The runtime type identity of an annotation.
#[derive(Clone, Copy)]
pub struct AnnotationType {
    id: TypeId,
    name: &'static str,
}

impl AnnotationType {
    /// Returns the annotation type for `A`.
    pub fn of<A: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<A>(),
            name: std::any::type_name::<A>(),
        }
    }

    /// Returns the type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for AnnotationType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AnnotationType {}

impl Hash for AnnotationType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnnotationType").field(&self.name).finish()
    }
}

/// A value that can be attached to a listener method or to another
/// annotation type.
///
/// Prefer `#[derive(Annotation)]` from `flexbus-macros`.
pub trait Annotation: Any + Send + Sync {
    /// Returns a reference to self as `Any`.
    fn as_any(&self) -> &dyn Any;

    /// Converts a shared annotation into a shared `Any` for downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Annotations declared on this annotation's type.
    fn declared_annotations(&self) -> Vec<AnnotationRef> {
        Vec::new()
    }

    /// Returns the type identity of this annotation.
    fn annotation_type(&self) -> AnnotationType {
        AnnotationType::of::<Self>()
    }
}

impl fmt::Debug for dyn Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.annotation_type().name())
    }
}

/// The default marker: tags a listener method as an event handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Subscribe;

impl Annotation for Subscribe {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Finds an annotation of type `A` among `declared`, directly or through
/// meta-annotations.
pub fn resolve<A: Annotation>(declared: &[AnnotationRef]) -> Option<Arc<A>> {
    resolve_type(declared, AnnotationType::of::<A>())?
        .into_any()
        .downcast::<A>()
        .ok()
}

/// Type-erased variant of [`resolve`].
pub fn resolve_type(declared: &[AnnotationRef], target: AnnotationType) -> Option<AnnotationRef> {
    let mut visited = HashSet::new();
    search(declared, target, &mut visited)
}

// Every sibling is examined; only a successful branch short-circuits.
fn search(
    declared: &[AnnotationRef],
    target: AnnotationType,
    visited: &mut HashSet<AnnotationType>,
) -> Option<AnnotationRef> {
    for annotation in declared {
        let ty = annotation.annotation_type();
        if ty == target {
            return Some(Arc::clone(annotation));
        }
        if !visited.insert(ty) {
            continue;
        }
        if let Some(found) = search(&annotation.declared_annotations(), target, visited) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_annotation {
        ($name:ident $(=> [$($meta:expr),*])?) => {
            #[derive(Debug, Default)]
            struct $name;

            impl Annotation for $name {
                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
                    self
                }

                fn declared_annotations(&self) -> Vec<AnnotationRef> {
                    vec![$($(Arc::new($meta) as AnnotationRef),*)?]
                }
            }
        };
    }

    test_annotation!(Audited => [Subscribe]);
    test_annotation!(Critical => [Audited]);
    test_annotation!(Documented);
    test_annotation!(Deprecated => [Documented]);
    test_annotation!(Cyclic => [Cyclic]);
    test_annotation!(Ping => [Pong]);
    test_annotation!(Pong => [Ping]);

    #[derive(Debug)]
    struct Weighted(u8);

    impl Annotation for Weighted {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    macro_rules! declared {
        ($($annotation:expr),* $(,)?) => {
            vec![$(Arc::new($annotation) as AnnotationRef),*]
        };
    }

    #[test]
    fn test_direct_match() {
        let declared = declared![Subscribe];
        assert!(resolve::<Subscribe>(&declared).is_some());
    }

    #[test]
    fn test_no_annotations_is_not_found() {
        assert!(resolve::<Subscribe>(&[]).is_none());
        let declared = declared![Documented];
        assert!(resolve::<Subscribe>(&declared).is_none());
    }

    #[test]
    fn test_meta_annotation_one_level() {
        let declared = declared![Audited];
        assert!(resolve::<Subscribe>(&declared).is_some());
    }

    #[test]
    fn test_meta_annotation_two_levels() {
        let declared = declared![Critical];
        assert!(resolve::<Subscribe>(&declared).is_some());
        assert!(resolve::<Audited>(&declared).is_some());
    }

    #[test]
    fn test_later_sibling_is_found_after_failed_branch() {
        // The first annotation has its own meta chain that does not match.
        let declared = declared![Deprecated, Audited];
        assert!(resolve::<Subscribe>(&declared).is_some());
    }

    #[test]
    fn test_cycles_terminate() {
        let declared = declared![Cyclic];
        assert!(resolve::<Subscribe>(&declared).is_none());

        let declared = declared![Ping, Audited];
        assert!(resolve::<Subscribe>(&declared).is_some());

        let declared = declared![Pong];
        assert!(resolve::<Subscribe>(&declared).is_none());
        assert!(resolve::<Ping>(&declared).is_some());
    }

    #[test]
    fn test_returns_the_matching_instance() {
        let declared = declared![Documented, Weighted(7)];
        let found = resolve::<Weighted>(&declared).map(|w| w.0);
        assert_eq!(found, Some(7));
    }

    #[test]
    fn test_resolve_type_erased() {
        let declared = declared![Critical];
        let found = resolve_type(&declared, AnnotationType::of::<Subscribe>());
        assert_eq!(
            found.map(|a| a.annotation_type()),
            Some(AnnotationType::of::<Subscribe>())
        );
    }
}
