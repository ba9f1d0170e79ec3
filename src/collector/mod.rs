use crate::buffer::SourceSet;
use crate::channel::{Channel, ChannelSet};
use crate::sender::{DeliveryOutcome, Sender};
use std::sync::Arc;

/// Binds one channel to the sources it delivers.
#[derive(Debug, Clone)]
pub struct Collector {
    channel: Arc<Channel>,
    sources: SourceSet,
}

impl Collector {
    pub fn new(channel: Arc<Channel>, sources: SourceSet) -> Self {
        Self { channel, sources }
    }

    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Drains every bound source in declared order and hands the batch to `sender`.
    pub async fn collect(&self, sender: &Sender) -> DeliveryOutcome {
        let log_events = self.sources.flush();
        sender.send(log_events).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectorSet {
    items: Vec<Arc<Collector>>,
}

impl CollectorSet {
    pub fn new(items: Vec<Arc<Collector>>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Arc<Collector>] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Collector>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn channels(&self) -> ChannelSet {
        self.items
            .iter()
            .map(|collector| collector.channel.clone())
            .collect()
    }

    /// Every bound source, deduplicated by identity, in first-seen order.
    pub fn sources(&self) -> SourceSet {
        let mut seen = Vec::new();
        for source in self.items.iter().flat_map(|collector| collector.sources.iter()) {
            if !seen.iter().any(|known| Arc::ptr_eq(known, source)) {
                seen.push(source.clone());
            }
        }
        SourceSet::new(seen)
    }

    pub fn filter_by_channel_name_prefix(&self, prefixes: &[&str]) -> CollectorSet {
        self.items
            .iter()
            .filter(|collector| {
                prefixes
                    .iter()
                    .any(|prefix| collector.channel.name().starts_with(prefix))
            })
            .cloned()
            .collect()
    }

    pub fn find_by_channel_name(&self, name: &str) -> Option<Arc<Collector>> {
        self.items
            .iter()
            .find(|collector| collector.channel.name() == name)
            .cloned()
    }
}

impl FromIterator<Arc<Collector>> for CollectorSet {
    fn from_iter<T: IntoIterator<Item = Arc<Collector>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
