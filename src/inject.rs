//! Container injection and the delegation fallback.
//!
//! Service objects do not know their container. Instead, a container that
//! operates in injected mode attaches a weak back-reference (an
//! [`InjectionLink`]) to every service object it instantiates. When a
//! dynamic call is not handled by the object itself, [`Value::call`]
//! follows that link and resolves the name as a sibling service; if the
//! container does not know the name either, the original
//! "method not understood" condition is surfaced unchanged.
//!
//! [`Value::call`]: crate::Value::call

use std::sync::{Arc, Weak};

use crate::error::{DiError, DiResult};
use crate::internal::sync::Mutex;
use crate::value::Value;

/// Capability interface consulted by the delegation fallback.
///
/// `try_invoke` is a resolution probe: `None` means "no such service here"
/// and lets the caller fall back to its own error path. The probe itself is
/// never surfaced to user code as an error.
///
/// [`Container`](crate::Container) implements this trait; any other
/// container-like object can implement it to take part in manual injection.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{DiResult, Resolvable, Value};
///
/// struct Fixed;
///
/// impl Resolvable for Fixed {
///     fn try_invoke(&self, name: &str, _args: &[Value]) -> Option<DiResult<Value>> {
///         (name == "answer").then(|| Ok(Value::new(42i32)))
///     }
/// }
///
/// let fixed = Fixed;
/// assert!(fixed.try_invoke("answer", &[]).is_some());
/// assert!(fixed.try_invoke("question", &[]).is_none());
/// ```
pub trait Resolvable: Send + Sync + 'static {
    /// Resolves `name` with `args`, or `None` if this resolver does not
    /// define the name.
    fn try_invoke(&self, name: &str, args: &[Value]) -> Option<DiResult<Value>>;
}

/// Dynamic surface of a service object.
///
/// This is the statically-typed stand-in for a "method not understood"
/// trap: a type opts into dynamic dispatch by implementing `dispatch` for
/// the methods it defines itself, and carries an [`InjectionLink`] so a
/// container can adopt it. Methods the object does not handle fall through
/// to the linked container via [`Value::call`].
///
/// # Examples
///
/// ```rust
/// use lattice_di::{DiResult, InjectionLink, ServiceObject, Value};
///
/// #[derive(Default)]
/// struct Greeter {
///     link: InjectionLink,
/// }
///
/// impl ServiceObject for Greeter {
///     fn dispatch(&self, method: &str, _args: &[Value]) -> Option<DiResult<Value>> {
///         match method {
///             "greet" => Some(Ok(Value::new("hello".to_string()))),
///             _ => None,
///         }
///     }
///
///     fn injection_link(&self) -> &InjectionLink {
///         &self.link
///     }
/// }
/// ```
///
/// [`Value::call`]: crate::Value::call
pub trait ServiceObject: Send + Sync + 'static {
    /// Handles a method this object defines itself; `None` means the
    /// method is not understood locally.
    fn dispatch(&self, method: &str, args: &[Value]) -> Option<DiResult<Value>> {
        let _ = (method, args);
        None
    }

    /// The slot recording which container has been injected into this
    /// object.
    fn injection_link(&self) -> &InjectionLink;
}

/// At-most-one weak back-reference from a service object to its container.
///
/// An object belongs to at most one container for its lifetime: attaching
/// a second, different container is a [`DiError::NonUniqueContainer`],
/// while re-attaching the same container is a no-op. The reference is weak
/// in the object-to-container direction only; containers do not track the
/// objects they have injected into.
pub struct InjectionLink {
    slot: Mutex<Option<Weak<dyn Resolvable>>>,
}

impl InjectionLink {
    /// Creates an unlinked slot.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// The linked container, if one is attached and still alive.
    pub fn container(&self) -> Option<Arc<dyn Resolvable>> {
        self.slot.lock().as_ref().and_then(|weak| weak.upgrade())
    }

    /// Whether a live container is currently attached.
    pub fn is_linked(&self) -> bool {
        self.container().is_some()
    }

    /// Records `container` as the owner of the linked object.
    ///
    /// Attaching the container that is already linked is a no-op. A slot
    /// whose previous owner has been dropped may be adopted again.
    ///
    /// # Errors
    ///
    /// [`DiError::NonUniqueContainer`] if a different live container is
    /// already attached.
    pub fn attach(&self, container: &Arc<dyn Resolvable>) -> DiResult<()> {
        let mut slot = self.slot.lock();
        if let Some(existing) = slot.as_ref().and_then(|weak| weak.upgrade()) {
            if !same_identity(&existing, container) {
                return Err(DiError::NonUniqueContainer);
            }
            return Ok(());
        }
        *slot = Some(Arc::downgrade(container));
        Ok(())
    }

    /// Delegates `method` to the linked container, if any.
    pub(crate) fn delegate(&self, method: &str, args: &[Value]) -> Option<DiResult<Value>> {
        self.container()?.try_invoke(method, args)
    }
}

impl Default for InjectionLink {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InjectionLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionLink")
            .field("linked", &self.is_linked())
            .finish()
    }
}

// Link identity is the Arc allocation; vtable metadata is ignored.
fn same_identity(existing: &Arc<dyn Resolvable>, candidate: &Arc<dyn Resolvable>) -> bool {
    Arc::as_ptr(existing) as *const () == Arc::as_ptr(candidate) as *const ()
}

/// Links `target` to `container` without any further container machinery.
///
/// This is the manual-injection entry point: any object implementing
/// [`ServiceObject`] can be linked to any [`Resolvable`], whether or not
/// either side came out of a [`Container`](crate::Container). Returns the
/// same errors as [`InjectionLink::attach`].
///
/// For `Container` itself prefer
/// [`Container::inject_into`](crate::Container::inject_into), which always
/// uses the container's canonical identity.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use lattice_di::{inject_into, DiResult, InjectionLink, Resolvable, ServiceObject, Value};
///
/// struct Answers;
///
/// impl Resolvable for Answers {
///     fn try_invoke(&self, name: &str, _args: &[Value]) -> Option<DiResult<Value>> {
///         (name == "answer").then(|| Ok(Value::new(42i32)))
///     }
/// }
///
/// #[derive(Default)]
/// struct Probe {
///     link: InjectionLink,
/// }
///
/// impl ServiceObject for Probe {
///     fn injection_link(&self) -> &InjectionLink {
///         &self.link
///     }
/// }
///
/// let answers: Arc<dyn Resolvable> = Arc::new(Answers);
/// let probe = Probe::default();
/// inject_into(&probe, Arc::clone(&answers)).unwrap();
/// assert!(probe.injection_link().is_linked());
/// ```
pub fn inject_into(target: &dyn ServiceObject, container: Arc<dyn Resolvable>) -> DiResult<()> {
    target.injection_link().attach(&container)
}
