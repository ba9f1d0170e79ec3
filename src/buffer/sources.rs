use super::source::{Source, SourceConfig};
use crate::domain::{Level, LogEvent, Message};
use futures::future::join_all;
use std::sync::Arc;

/// Ordered set of sources. Order is the declared order and drives drain order.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    items: Vec<Arc<Source>>,
}

impl SourceSet {
    pub fn new(items: Vec<Arc<Source>>) -> Self {
        Self { items }
    }

    /// One source per level, all sharing `config`.
    pub fn for_levels(levels: &[Level], config: &SourceConfig) -> Self {
        Self::new(
            levels
                .iter()
                .map(|level| Arc::new(Source::new(*level, config.clone())))
                .collect(),
        )
    }

    pub fn items(&self) -> &[Arc<Source>] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Source>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True only when the set is non-empty and every member is muted.
    pub fn is_muted(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|source| source.is_muted())
    }

    pub fn filter_by_level(&self, level: Level) -> SourceSet {
        self.filter_by_levels(&[level])
    }

    pub fn filter_by_levels(&self, levels: &[Level]) -> SourceSet {
        self.items
            .iter()
            .filter(|source| levels.contains(&source.level()))
            .cloned()
            .collect()
    }

    pub fn find_by_level(&self, level: Level) -> Option<Arc<Source>> {
        self.items
            .iter()
            .find(|source| source.level() == level)
            .cloned()
    }

    pub fn mute(&self) -> &Self {
        self.items.iter().for_each(|source| {
            source.mute();
        });
        self
    }

    pub fn unmute(&self) -> &Self {
        self.items.iter().for_each(|source| {
            source.unmute();
        });
        self
    }

    pub fn enable(&self) -> &Self {
        self.items.iter().for_each(|source| {
            source.enable();
        });
        self
    }

    pub fn disable(&self) -> &Self {
        self.items.iter().for_each(|source| {
            source.disable();
        });
        self
    }

    pub async fn push(&self, messages: &[Message]) {
        join_all(self.items.iter().map(|source| source.push(messages))).await;
    }

    /// Drains every source in declared order.
    pub fn flush(&self) -> Vec<LogEvent> {
        self.items.iter().flat_map(|source| source.flush()).collect()
    }
}

impl FromIterator<Arc<Source>> for SourceSet {
    fn from_iter<T: IntoIterator<Item = Arc<Source>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> SourceSet {
        SourceSet::for_levels(&[Level::Warn, Level::Error], &SourceConfig::default())
    }

    #[test]
    fn test_muted_requires_non_empty_and_all_muted() {
        let set = sources();
        assert!(!SourceSet::default().is_muted());
        assert!(!set.is_muted());

        set.find_by_level(Level::Warn).unwrap().mute();
        assert!(!set.is_muted());
        assert!(set.filter_by_level(Level::Warn).is_muted());

        set.mute();
        assert!(set.is_muted());
        set.unmute();
        assert!(!set.is_muted());
    }

    #[test]
    fn test_filter_and_find() {
        let set = sources();
        assert_eq!(set.filter_by_level(Level::Error).len(), 1);
        assert!(set.filter_by_level(Level::Debug).is_empty());
        assert_eq!(set.filter_by_levels(&[Level::Warn, Level::Error]).len(), 2);
        assert!(set.find_by_level(Level::Info).is_none());
    }

    #[tokio::test]
    async fn test_flush_follows_declared_order() {
        let set = sources();
        set.find_by_level(Level::Error)
            .unwrap()
            .push(&[Message::custom("from error", vec![])])
            .await;
        set.find_by_level(Level::Warn)
            .unwrap()
            .push(&[Message::custom("from warn", vec![])])
            .await;

        let events = set.flush();
        assert_eq!(events.len(), 2);
        assert!(events[0].message.contains("from warn"));
        assert!(events[1].message.contains("from error"));
        assert!(set.flush().is_empty());
    }

    #[tokio::test]
    async fn test_disable_whole_set() {
        let set = sources();
        set.disable();
        set.push(&[Message::custom("dropped", vec![])]).await;
        assert!(set.flush().is_empty());
    }
}
