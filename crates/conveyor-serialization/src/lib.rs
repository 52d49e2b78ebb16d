//! # Conveyor Serialization
//!
//! Payload serializer registry for the Conveyor task queue.
//!
//! Every task payload that crosses the broker is tagged with a content type.
//! This crate owns the table mapping content types to codecs, the process-wide
//! trust policy that decides which of those content types may be decoded at
//! all, and the default serializer used for outbound payloads.
//!
//! ## Architecture
//!
//! - **Codecs** (`codecs`): value formats (`json`, `bincode`) and the
//!   `WireSerializer` seam that byte-transforming serializers (such as the
//!   signing serializer in `conveyor-security`) plug into.
//! - **Registry** (`registry`): registration table, disabled set, and default
//!   slot, published as immutable snapshots so decode never observes a
//!   half-applied policy change.
//!
//! ## Security Notes
//!
//! - Decoding a disabled content type fails before any payload byte is
//!   interpreted. This is the enforcement point for the whole trust policy.
//! - The registry is an explicit object; `global_registry()` is a thin facade
//!   over one lazily-built instance for process-wide wiring.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codecs;
pub mod errors;
pub mod registry;

pub use codecs::{ValueFormat, WireSerializer};
pub use errors::SerializationError;
pub use registry::{
    disable_untrusted_serializers, global_registry, Decoded, Message, SerializerRegistry, AUTH,
    BINCODE, CONTENT_TYPE_AUTH, CONTENT_TYPE_BINCODE, CONTENT_TYPE_JSON, DEFAULT_TRUSTED, JSON,
};
