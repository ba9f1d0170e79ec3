use super::Worker;
use crate::buffer::SourceSet;
use crate::cache::Storage;
use crate::channel::ChannelSet;
use crate::collector::CollectorSet;
use crate::console::ConsoleSink;
use crate::sender::DeliveryOutcome;
use futures::future::join_all;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct WorkerSet {
    items: Vec<Arc<Worker>>,
}

impl WorkerSet {
    pub fn new(items: Vec<Arc<Worker>>) -> Self {
        Self { items }
    }

    /// One worker per collector, all caching into the same storage.
    pub fn for_collectors(
        collectors: &CollectorSet,
        storage: Arc<dyn Storage>,
        console: Arc<dyn ConsoleSink>,
    ) -> Self {
        collectors
            .iter()
            .map(|collector| {
                Arc::new(Worker::new(
                    collector.clone(),
                    storage.clone(),
                    console.clone(),
                ))
            })
            .collect()
    }

    pub fn items(&self) -> &[Arc<Worker>] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Worker>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn start(&self) -> &Self {
        for worker in &self.items {
            worker.start();
        }
        self
    }

    pub fn stop(&self) -> &Self {
        for worker in &self.items {
            worker.stop();
        }
        self
    }

    pub fn collectors(&self) -> CollectorSet {
        self.items
            .iter()
            .map(|worker| worker.collector().clone())
            .collect()
    }

    pub fn channels(&self) -> ChannelSet {
        self.collectors().channels()
    }

    pub fn sources(&self) -> SourceSet {
        self.collectors().sources()
    }

    pub fn find_by_channel_name(&self, name: &str) -> Option<Arc<Worker>> {
        self.items
            .iter()
            .find(|worker| worker.channel().name() == name)
            .cloned()
    }

    /// One final tick per worker, waiting out ticks already in flight.
    pub async fn drain(&self) -> Vec<DeliveryOutcome> {
        join_all(self.items.iter().map(|worker| worker.drain())).await
    }
}

impl FromIterator<Arc<Worker>> for WorkerSet {
    fn from_iter<T: IntoIterator<Item = Arc<Worker>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
