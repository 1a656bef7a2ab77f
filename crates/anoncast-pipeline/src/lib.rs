//! # anoncast-pipeline: Proof-Gated Publication
//!
//! Turns an anonymous [`Submission`](anoncast_core::Submission) into at most
//! one post on the feed.
//!
//! ## Components
//!
//! - [`RootRegistry`]: current and historical membership roots, loaded from
//!   a [`RootSource`].
//! - [`SubmissionValidator`]: root membership, freshness, and reply-target
//!   legitimacy under a [`ReplyPolicy`].
//! - [`PublicationGateway`]: the one-shot publish seam.
//! - [`MessageStore`]: persistence and replay detection.
//! - [`MessagePipeline`]: runs the [`stage::Intake`] typestate machine,
//!   `decode → root → freshness → replay → reply → verify → publish → persist`.
//!
//! Every collaborator that touches the network is a trait so the pipeline
//! can be exercised without one.

pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod registry;
pub mod stage;
pub mod store;
pub mod validator;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{PipelineConfig, ReplyPolicy};
pub use error::{ErrorKind, PipelineError, PipelineStage};
pub use gateway::{GatewayError, PublicationGateway, PublishRequest};
pub use pipeline::MessagePipeline;
pub use registry::{
    FileRootSource, RegistryNotLoaded, RootRegistry, RootSnapshot, RootSource, RootSourceError,
    StaticRootSource,
};
pub use store::{InMemoryMessageStore, MessageStore, StoreError};
pub use validator::{
    IdentifierType, LookupError, PostRef, ReplyCheck, ReplyLookup, SubmissionValidator,
};
