//! The serializer registry and its trust policy.
//!
//! Registry state is an immutable snapshot behind a `parking_lot::RwLock`.
//! Mutations clone the current snapshot, apply the change, and swap the
//! `Arc`. A decoder running concurrently with `setup_security` sees either
//! the old policy or the new one, never a torn mix.

use crate::codecs::{ValueFormat, WireSerializer};
use crate::errors::SerializationError;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Registry name of the JSON serializer.
pub const JSON: &str = "json";
/// Registry name of the native binary serializer.
pub const BINCODE: &str = "bincode";
/// Registry name reserved for the authenticated (signing) serializer.
pub const AUTH: &str = "auth";

/// Content type of JSON payloads.
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// Content type of native binary payloads.
pub const CONTENT_TYPE_BINCODE: &str = "application/x-bincode";
/// Content type of signed payload envelopes.
pub const CONTENT_TYPE_AUTH: &str = "application/x-signed";

/// Serializers kept decodable when [`SerializerRegistry::disable_untrusted`]
/// is called without an explicit allow list.
pub const DEFAULT_TRUSTED: &[&str] = &[AUTH, JSON];

/// An encoded outbound payload, tagged with its wire content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Content type to stamp on the broker message.
    pub content_type: String,
    /// Encoded payload bytes.
    pub body: Vec<u8>,
}

/// A decoded inbound payload: raw value bytes plus the format to read them
/// with. For wire serializers the bytes have already been authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Value format of `body`.
    pub format: ValueFormat,
    /// Raw value bytes, ready for typed deserialization.
    pub body: Vec<u8>,
}

impl Decoded {
    /// Deserialize the payload into a concrete type.
    pub fn read<T: DeserializeOwned>(&self) -> Result<T, SerializationError> {
        self.format.decode(&self.body)
    }
}

enum SerializerKind {
    Value(ValueFormat),
    Wire(Arc<dyn WireSerializer>),
}

struct SerializerEntry {
    name: String,
    content_type: String,
    kind: SerializerKind,
}

#[derive(Clone, Default)]
struct RegistryState {
    by_name: HashMap<String, Arc<SerializerEntry>>,
    by_content_type: HashMap<String, Arc<SerializerEntry>>,
    disabled: HashSet<String>,
    default: Option<String>,
}

/// Registration table, trust policy, and default slot for payload
/// serializers.
///
/// The registry is an explicit object so tests and embedders can hold their
/// own; [`global_registry`] exposes the one shared process-wide instance.
pub struct SerializerRegistry {
    state: RwLock<Arc<RegistryState>>,
}

lazy_static! {
    static ref GLOBAL_REGISTRY: SerializerRegistry = SerializerRegistry::with_defaults();
}

/// The process-wide registry instance. Thin accessor, no hidden state of
/// its own.
pub fn global_registry() -> &'static SerializerRegistry {
    &GLOBAL_REGISTRY
}

/// Disable every serializer in the process-wide registry except the given
/// allow list (or the conservative built-in default when `None`).
///
/// Usable standalone, without full security setup.
pub fn disable_untrusted_serializers(allow: Option<&[&str]>) {
    global_registry().disable_untrusted(allow);
}

impl SerializerRegistry {
    /// Create a registry with nothing registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            state: RwLock::new(Arc::new(RegistryState::default())),
        }
    }

    /// Create a registry with the built-in value serializers registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        registry.register_value(JSON, CONTENT_TYPE_JSON, ValueFormat::Json);
        registry.register_value(BINCODE, CONTENT_TYPE_BINCODE, ValueFormat::Bincode);
        registry
    }

    fn snapshot(&self) -> Arc<RegistryState> {
        Arc::clone(&self.state.read())
    }

    fn mutate(&self, apply: impl FnOnce(&mut RegistryState)) {
        let mut guard = self.state.write();
        let mut next = (**guard).clone();
        apply(&mut next);
        *guard = Arc::new(next);
    }

    /// Register a plain value serializer under `name`.
    ///
    /// Re-registering a name replaces the previous entry.
    pub fn register_value(&self, name: &str, content_type: &str, format: ValueFormat) {
        self.insert(Arc::new(SerializerEntry {
            name: name.to_owned(),
            content_type: content_type.to_owned(),
            kind: SerializerKind::Value(format),
        }));
    }

    /// Register a wire serializer under `name`.
    ///
    /// Re-registering a name replaces the previous entry; a security
    /// re-setup relies on this to swap in a serializer built from the new
    /// configuration with no leftover state.
    pub fn register_wire(&self, name: &str, content_type: &str, serializer: Arc<dyn WireSerializer>) {
        self.insert(Arc::new(SerializerEntry {
            name: name.to_owned(),
            content_type: content_type.to_owned(),
            kind: SerializerKind::Wire(serializer),
        }));
    }

    fn insert(&self, entry: Arc<SerializerEntry>) {
        debug!(name = %entry.name, content_type = %entry.content_type, "registering serializer");
        self.mutate(|state| {
            if let Some(previous) = state.by_name.remove(&entry.name) {
                state.by_content_type.remove(&previous.content_type);
                state.disabled.remove(&previous.content_type);
            }
            state
                .by_content_type
                .insert(entry.content_type.clone(), Arc::clone(&entry));
            state.by_name.insert(entry.name.clone(), entry);
        });
    }

    /// Disable a single serializer by name or content type.
    ///
    /// Unregistered identifiers are a no-op, not an error.
    pub fn disable(&self, name_or_content_type: &str) {
        self.mutate(|state| {
            if let Some(content_type) = resolve_content_type(state, name_or_content_type) {
                state.disabled.insert(content_type);
            }
        });
    }

    /// Disable every registered serializer except the allow list.
    ///
    /// With `None`, only [`DEFAULT_TRUSTED`] survives. The disabled set is
    /// recomputed from the live registration table on every call, so the
    /// operation is idempotent and a later call with a different allow list
    /// fully replaces the previous policy. Allow-list entries match either
    /// a serializer name or its content type; entries naming nothing
    /// registered are ignored.
    pub fn disable_untrusted(&self, allow: Option<&[&str]>) {
        let allowed = allow.unwrap_or(DEFAULT_TRUSTED);
        self.mutate(|state| {
            state.disabled = state
                .by_name
                .values()
                .filter(|entry| {
                    !allowed
                        .iter()
                        .any(|kept| *kept == entry.name || *kept == entry.content_type)
                })
                .map(|entry| entry.content_type.clone())
                .collect();
        });
        debug!(?allowed, "untrusted serializers disabled");
    }

    /// Record which serializer encodes outbound payloads when the caller
    /// does not name one explicitly.
    pub fn set_default_serializer(&self, name: &str) -> Result<(), SerializationError> {
        if !self.snapshot().by_name.contains_key(name) {
            return Err(SerializationError::UnknownSerializer(name.to_owned()));
        }
        self.mutate(|state| state.default = Some(name.to_owned()));
        Ok(())
    }

    /// Name of the current default serializer, if configured.
    #[must_use]
    pub fn default_serializer(&self) -> Option<String> {
        self.snapshot().default.clone()
    }

    /// Whether decoding the given content type is currently refused.
    #[must_use]
    pub fn is_disabled(&self, content_type: &str) -> bool {
        self.snapshot().disabled.contains(content_type)
    }

    /// Currently disabled content types, for diagnostics.
    #[must_use]
    pub fn disabled_content_types(&self) -> Vec<String> {
        let mut disabled: Vec<String> = self.snapshot().disabled.iter().cloned().collect();
        disabled.sort();
        disabled
    }

    /// Registered serializer names, for diagnostics.
    #[must_use]
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.snapshot().by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Encode an outbound payload with the named serializer, falling back
    /// to the configured default.
    pub fn dumps<T: Serialize>(
        &self,
        value: &T,
        serializer: Option<&str>,
    ) -> Result<Message, SerializationError> {
        let state = self.snapshot();
        let name = match serializer {
            Some(name) => name,
            None => state
                .default
                .as_deref()
                .ok_or(SerializationError::NoDefaultSerializer)?,
        };
        let entry = state
            .by_name
            .get(name)
            .ok_or_else(|| SerializationError::UnknownSerializer(name.to_owned()))?;
        let body = match &entry.kind {
            SerializerKind::Value(format) => format.encode(value)?,
            SerializerKind::Wire(wire) => wire.wrap(&wire.inner_format().encode(value)?)?,
        };
        Ok(Message {
            content_type: entry.content_type.clone(),
            body,
        })
    }

    /// Decode inbound payload bytes tagged with `content_type`.
    ///
    /// The trust policy is enforced here: a disabled or unknown content
    /// type fails before a single payload byte is interpreted.
    pub fn loads(&self, content_type: &str, body: &[u8]) -> Result<Decoded, SerializationError> {
        let state = self.snapshot();
        if state.disabled.contains(content_type) {
            return Err(SerializationError::ContentTypeDisabled(
                content_type.to_owned(),
            ));
        }
        let entry = state
            .by_content_type
            .get(content_type)
            .ok_or_else(|| SerializationError::UnknownContentType(content_type.to_owned()))?;
        match &entry.kind {
            SerializerKind::Value(format) => Ok(Decoded {
                format: *format,
                body: body.to_vec(),
            }),
            SerializerKind::Wire(wire) => Ok(Decoded {
                format: wire.inner_format(),
                body: wire.unwrap(body)?,
            }),
        }
    }
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn resolve_content_type(state: &RegistryState, name_or_content_type: &str) -> Option<String> {
    if state.by_content_type.contains_key(name_or_content_type) {
        return Some(name_or_content_type.to_owned());
    }
    state
        .by_name
        .get(name_or_content_type)
        .map(|entry| entry.content_type.clone())
}
