use crate::messaging::{AdvertisedSocketAddress, ReconnectingChannel};
use crate::protocol::ProtocolStack;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// ReconnectingChannels is the registry of channels by remote address. It is the only owner of
/// the channels; callers borrow them per request.
#[derive(Default)]
pub struct ReconnectingChannels {
    channels: DashMap<AdvertisedSocketAddress, Arc<ReconnectingChannel>>,
}

impl ReconnectingChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn get(&self, address: &AdvertisedSocketAddress) -> Option<Arc<ReconnectingChannel>> {
        self.channels.get(address).map(|entry| entry.value().clone())
    }

    /// Registers `channel` unless the address already has one. Returns the existing channel when
    /// there was one, in which case `channel` is discarded.
    pub fn put_if_absent(
        &self,
        address: AdvertisedSocketAddress,
        channel: Arc<ReconnectingChannel>,
    ) -> Option<Arc<ReconnectingChannel>> {
        match self.channels.entry(address) {
            Entry::Occupied(existing) => Some(existing.get().clone()),
            Entry::Vacant(vacant) => {
                vacant.insert(channel);
                None
            }
        }
    }

    pub fn remove(&self, address: &AdvertisedSocketAddress) -> Option<Arc<ReconnectingChannel>> {
        self.channels.remove(address).map(|(_, channel)| channel)
    }

    pub fn values(&self) -> Vec<Arc<ReconnectingChannel>> {
        self.channels.iter().map(|entry| entry.value().clone()).collect()
    }

    /// The protocol stack of every channel that currently has one negotiated.
    pub fn installed_protocols(&self) -> Vec<(AdvertisedSocketAddress, ProtocolStack)> {
        self.channels
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .installed_protocol_stack()
                    .map(|stack| (entry.key().clone(), stack))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{BoxedStream, ChannelSettings, Connector, NoLatency};
    use crate::protocol::{SupportedProtocols, VoidPipelineWrapper};
    use std::io;

    struct Unreachable;

    #[async_trait::async_trait]
    impl Connector for Unreachable {
        async fn connect(&self, _: &AdvertisedSocketAddress) -> io::Result<BoxedStream> {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "unreachable"))
        }
    }

    fn channel(address: &AdvertisedSocketAddress) -> Arc<ReconnectingChannel> {
        let settings = ChannelSettings {
            connector: Arc::new(Unreachable),
            pipeline: Arc::new(VoidPipelineWrapper),
            supported_protocols: Arc::new(SupportedProtocols::catchup()),
            latency: Arc::new(NoLatency),
            max_frame_bytes: 1024,
        };
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        Arc::new(ReconnectingChannel::new(logger, address.clone(), settings))
    }

    #[test]
    fn first_writer_wins() {
        let registry = ReconnectingChannels::new();
        let address = AdvertisedSocketAddress::new("core-1", 6000);

        let first = channel(&address);
        assert!(registry.put_if_absent(address.clone(), first.clone()).is_none());

        let second = channel(&address);
        let existing = registry.put_if_absent(address.clone(), second.clone()).unwrap();
        assert!(Arc::ptr_eq(&existing, &first));
        assert!(Arc::ptr_eq(&registry.get(&address).unwrap(), &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_put_if_absent_keeps_exactly_one() {
        let registry = Arc::new(ReconnectingChannels::new());
        let address = AdvertisedSocketAddress::new("core-2", 6000);

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let address = address.clone();
                std::thread::spawn(move || {
                    let mine = channel(&address);
                    match registry.put_if_absent(address, mine.clone()) {
                        None => mine,
                        Some(winner) => winner,
                    }
                })
            })
            .collect();
        let observed: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();

        let winner = registry.get(&address).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(observed.iter().all(|c| Arc::ptr_eq(c, &winner)));
    }

    #[test]
    fn remove_and_values() {
        let registry = ReconnectingChannels::new();
        let a = AdvertisedSocketAddress::new("core-1", 6000);
        let b = AdvertisedSocketAddress::new("core-2", 6000);
        registry.put_if_absent(a.clone(), channel(&a));
        registry.put_if_absent(b.clone(), channel(&b));
        assert_eq!(registry.values().len(), 2);

        assert!(registry.remove(&a).is_some());
        assert!(registry.remove(&a).is_none());
        assert!(registry.get(&a).is_none());
        assert_eq!(registry.values()[0].address(), &b);
    }

    #[test]
    fn channels_without_connection_have_no_protocols() {
        let registry = ReconnectingChannels::new();
        let a = AdvertisedSocketAddress::new("core-1", 6000);
        registry.put_if_absent(a.clone(), channel(&a));
        assert!(registry.installed_protocols().is_empty());
    }
}
