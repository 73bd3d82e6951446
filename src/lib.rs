#![doc = include_str!("../README.md")]

/// Builder used to construct a [TokenProvider](crate::provider::TokenProvider) instance.
///
/// All configuration is validated eagerly when [build](crate::builder::TokenProviderBuilder::build)
/// is called, so that a misconfigured provider never serves a single request.
pub mod builder;

/// Claim set carried inside issued tokens.
///
/// Fresh tokens always contain `iss`, `aud`, `sub`, `jti` (nonce), `iat`,
/// `nbf` and `exp`. Any additional claims attached to the resolved
/// [Identity](crate::identity::Identity) are carried in a flattened map,
/// which also lets a refresh pass the original claim set through verbatim.
pub mod claims;

/// Error types.
///
/// [StartupError](crate::error::StartupError) is returned once, from
/// [build](crate::builder::TokenProviderBuilder::build).
/// [IssueError](crate::error::IssueError) covers every request-time failure
/// and maps to a fixed `400` message that carries no diagnostic detail.
pub mod error;

/// Capability traits supplied by the embedding application.
///
/// [IdentityResolver](crate::identity::IdentityResolver) checks credentials
/// against whatever user store the application has;
/// [NonceGenerator](crate::identity::NonceGenerator) produces the per-token
/// `jti` claim. Both may be asynchronous.
pub mod identity;

/// The actual tower middleware.
///
/// Contains implementations of [Service](https://docs.rs/tower/latest/tower/trait.Service.html)
/// and [Layer](https://docs.rs/tower/latest/tower/trait.Layer.html)
/// from the tower library.
///
/// You shouldn't need to interact with these implementations, more than
/// calling [TokenProvider::into_layer()](crate::provider::TokenProvider::into_layer).
pub mod layer;

/// [TokenProvider](crate::provider::TokenProvider) is what underpins the
/// tower middleware: it classifies inbound requests, runs the create and
/// refresh flows, and produces signed tokens.
///
/// It's cheap to clone and safe to share across request tasks; nothing in
/// it is mutated after construction.
pub mod provider;

mod extract;
mod jwt;
