use super::Channel;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ChannelSet {
    items: Vec<Arc<Channel>>,
}

impl ChannelSet {
    pub fn new(items: Vec<Arc<Channel>>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Arc<Channel>] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Channel>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn filter_by_name_prefix(&self, prefixes: &[&str]) -> ChannelSet {
        self.items
            .iter()
            .filter(|channel| prefixes.iter().any(|prefix| channel.name().starts_with(prefix)))
            .cloned()
            .collect()
    }

    pub fn filter_by_log_group_name(&self, log_group_names: &[&str]) -> ChannelSet {
        self.items
            .iter()
            .filter(|channel| log_group_names.contains(&channel.log_group_name()))
            .cloned()
            .collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<Arc<Channel>> {
        self.items.iter().find(|channel| channel.name() == name).cloned()
    }

    pub fn find_by_log_group_name(&self, log_group_name: &str) -> Option<Arc<Channel>> {
        self.items
            .iter()
            .find(|channel| channel.log_group_name() == log_group_name)
            .cloned()
    }
}

impl FromIterator<Arc<Channel>> for ChannelSet {
    fn from_iter<T: IntoIterator<Item = Arc<Channel>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
