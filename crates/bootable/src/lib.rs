//! Abstract interface for services with an explicit start/shutdown lifecycle.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;

/// Marker trait for errors surfaced by a [`Bootable`] service.
pub trait BootableError: Debug + Error + Send + Sync + 'static {}

/// Trait for services owned by a composition root.
///
/// Services are constructed explicitly and handed to whoever drives the process;
/// nothing is looked up through a process-wide registry.
#[async_trait]
pub trait Bootable
where
    Self: Send + Sync + 'static,
{
    /// Get the name of the bootable service.
    fn name(&self) -> &str;

    /// Start the bootable service.
    async fn start(&self) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Shutdown the bootable service.
    async fn shutdown(&self) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Wait for the bootable service to exit.
    async fn wait(&self);
}
