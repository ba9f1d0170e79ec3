use futures::future::{self, BoxFuture};
use uuid::Uuid;

pub const ANONYMOUS_STREAM: &str = "anonymous";

/// Resolves the log stream a channel writes to.
///
/// Called only when no stream name is cached for the channel; a failure aborts that tick.
pub trait StreamNameResolver: Send + Sync {
    fn resolve(&self) -> BoxFuture<'_, anyhow::Result<String>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousStream;

impl StreamNameResolver for AnonymousStream {
    fn resolve(&self) -> BoxFuture<'_, anyhow::Result<String>> {
        Box::pin(future::ready(Ok(ANONYMOUS_STREAM.to_string())))
    }
}

#[derive(Debug, Clone)]
pub struct FixedStreamName(pub String);

impl StreamNameResolver for FixedStreamName {
    fn resolve(&self) -> BoxFuture<'_, anyhow::Result<String>> {
        Box::pin(future::ready(Ok(self.0.clone())))
    }
}

/// `<hostname>-<instance id>`, stable for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct HostnameStream {
    instance: String,
}

impl HostnameStream {
    pub fn new() -> Self {
        Self {
            instance: Uuid::new_v4().to_string(),
        }
    }
}

impl Default for HostnameStream {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamNameResolver for HostnameStream {
    fn resolve(&self) -> BoxFuture<'_, anyhow::Result<String>> {
        let name = hostname::get()
            .map(|host| format!("{}-{}", host.to_string_lossy(), self.instance))
            .map_err(anyhow::Error::from);
        Box::pin(future::ready(name))
    }
}

impl<F> StreamNameResolver for F
where
    F: Fn() -> anyhow::Result<String> + Send + Sync,
{
    fn resolve(&self) -> BoxFuture<'_, anyhow::Result<String>> {
        Box::pin(future::ready(self()))
    }
}
