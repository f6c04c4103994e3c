//! # lattice-di
//!
//! Name-keyed, lazily-instantiated service containers with pluggable
//! caching policies and container delegation.
//!
//! A container class is described by a [`Registry`]: a table of named
//! services, each backed by an implementation closure and a
//! [`CachePolicy`]. Container instances share the registry but own their
//! caches, so a singleton is unique per instance, a multiton is unique per
//! argument key, a threaded service is unique per resolving thread, and a
//! deferred service does not even run until something calls a method on
//! it.
//!
//! ## Features
//!
//! - **Six caching policies**: Generic, Singleton, Multiton,
//!   MultikeyMultiton, Threaded, and Deferred
//! - **Delegation fallback**: injected service objects transparently
//!   resolve missing methods against sibling services
//! - **Dynamic declaration**: services can be declared after instances
//!   exist, with the policy inferred from the declared arity
//! - **Registry inheritance**: derived registries shadow parent
//!   definitions without disturbing them
//! - **Thread-safe**: `Arc`-based sharing; caches behind short-lived locks
//!
//! ## Quick Start
//!
//! ```rust
//! use lattice_di::{Container, Registry, Value};
//!
//! let mut services = Registry::builder();
//! services.singleton("greeting", |_, _| Ok(Value::new("Hello, world".to_string())));
//! services.multikey_multiton("pair", |_, args| {
//!     let x = *args[0].downcast_ref::<i32>().unwrap();
//!     let y = *args[1].downcast_ref::<i32>().unwrap();
//!     Ok(Value::new(vec![x, y]))
//! });
//! services.singleton("stuff", |c, _| {
//!     let greeting = c.get::<String>("greeting")?;
//!     let pair = c.get_with::<Vec<i32>>("pair", &[Value::key(100), Value::key(200)])?;
//!     Ok(Value::new(((*greeting).clone(), (*pair).clone())))
//! });
//!
//! let container = Container::new(services.build());
//! let stuff = container.get::<(String, Vec<i32>)>("stuff").unwrap();
//! assert_eq!(stuff.0, "Hello, world");
//! assert_eq!(stuff.1, vec![100, 200]);
//! ```
//!
//! ## Injection and delegation
//!
//! Services declared while the registry is in injected mode (the default)
//! get the container attached to the values they produce, provided the
//! value opts in by implementing [`ServiceObject`]. A method the object
//! does not handle itself is resolved against the container's services:
//!
//! ```rust
//! use lattice_di::{Container, InjectionLink, Registry, ServiceObject, Value};
//!
//! #[derive(Default)]
//! struct Copier {
//!     link: InjectionLink,
//! }
//!
//! impl ServiceObject for Copier {
//!     fn injection_link(&self) -> &InjectionLink {
//!         &self.link
//!     }
//! }
//!
//! let mut services = Registry::builder();
//! services.singleton("copier", |_, _| Ok(Value::object(Copier::default())));
//! services.singleton("paper", |_, _| Ok(Value::new("A4".to_string())));
//!
//! let container = Container::new(services.build());
//! let copier = container.invoke("copier", &[]).unwrap();
//!
//! // `Copier` has no "paper" method of its own; the call delegates to the
//! // container that injected it.
//! let paper = copier.call("paper", &[]).unwrap();
//! assert_eq!(paper.downcast_ref::<String>().unwrap(), "A4");
//! ```
//!
//! ## Caching policies
//!
//! ```rust
//! use lattice_di::{Arity, Container, Registry, Value};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let runs = Arc::new(AtomicUsize::new(0));
//! let counter = runs.clone();
//!
//! let mut services = Registry::builder();
//! services.multiton("connection", move |_, args| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     let host = args[0].downcast_ref::<String>().unwrap().clone();
//!     Ok(Value::new(format!("connected to {}", host)))
//! });
//!
//! let container = Container::new(services.build());
//! let a = container.invoke("connection", &[Value::key("alpha".to_string())]).unwrap();
//! let again = container.invoke("connection", &[Value::key("alpha".to_string())]).unwrap();
//! let b = container.invoke("connection", &[Value::key("beta".to_string())]).unwrap();
//!
//! assert!(Value::ptr_eq(&a, &again)); // Same key, same instance
//! assert!(!Value::ptr_eq(&a, &b));    // Distinct keys never collide
//! assert_eq!(runs.load(Ordering::SeqCst), 2);
//! ```

// Module declarations
pub mod container;
pub mod definition;
pub mod error;
pub mod inject;
pub mod key;
pub mod policy;
pub mod registry;
pub mod value;

// Internal modules
mod cache;
mod deferred;
mod internal;

// Re-export core types
pub use container::Container;
pub use definition::{ServiceDefinition, ServiceFn};
pub use error::{DiError, DiResult};
pub use inject::{inject_into, InjectionLink, Resolvable, ServiceObject};
pub use key::ArgKey;
pub use policy::{Arity, CachePolicy};
pub use registry::{Registry, RegistryBuilder};
pub use value::Value;
