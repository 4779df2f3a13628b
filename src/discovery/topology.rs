use crate::identity::MemberId;
use crate::messaging::AdvertisedSocketAddress;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoreServerInfo {
    pub raft_server: AdvertisedSocketAddress,
    pub catchup_server: AdvertisedSocketAddress,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReadReplicaInfo {
    pub catchup_server: AdvertisedSocketAddress,
}

/// The voting members as seen by discovery at one point in time.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CoreTopology {
    members: HashMap<MemberId, CoreServerInfo>,
}

impl CoreTopology {
    pub fn new(members: HashMap<MemberId, CoreServerInfo>) -> Self {
        CoreTopology { members }
    }

    pub fn members(&self) -> &HashMap<MemberId, CoreServerInfo> {
        &self.members
    }

    pub fn find(&self, member: &MemberId) -> Option<&AdvertisedSocketAddress> {
        self.members.get(member).map(|info| &info.catchup_server)
    }
}

/// The non-voting members as seen by discovery at one point in time.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReadReplicaTopology {
    members: HashMap<MemberId, ReadReplicaInfo>,
}

impl ReadReplicaTopology {
    pub fn new(members: HashMap<MemberId, ReadReplicaInfo>) -> Self {
        ReadReplicaTopology { members }
    }

    pub fn members(&self) -> &HashMap<MemberId, ReadReplicaInfo> {
        &self.members
    }

    pub fn find(&self, member: &MemberId) -> Option<&AdvertisedSocketAddress> {
        self.members.get(member).map(|info| &info.catchup_server)
    }
}

/// ClusterTopology pairs a core view with a read replica view. Neither view changes after
/// construction; discovery publishes a new `ClusterTopology` instead.
#[derive(Clone, Debug, Default)]
pub struct ClusterTopology {
    core: Arc<CoreTopology>,
    read_replicas: Arc<ReadReplicaTopology>,
}

impl ClusterTopology {
    pub fn new(core: CoreTopology, read_replicas: ReadReplicaTopology) -> Self {
        ClusterTopology {
            core: Arc::new(core),
            read_replicas: Arc::new(read_replicas),
        }
    }

    pub fn core(&self) -> &CoreTopology {
        &self.core
    }

    pub fn read_replicas(&self) -> &ReadReplicaTopology {
        &self.read_replicas
    }

    /// Where to catch up from `member`. The core view is consulted first. `None` means the
    /// member is currently unreachable as far as discovery knows.
    pub fn find(&self, member: &MemberId) -> Option<AdvertisedSocketAddress> {
        self.core
            .find(member)
            .or_else(|| self.read_replicas.find(member))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(host: &str, port: u16) -> AdvertisedSocketAddress {
        AdvertisedSocketAddress::new(host, port)
    }

    fn topology() -> ClusterTopology {
        let mut core = HashMap::new();
        core.insert(
            MemberId::new("core-1"),
            CoreServerInfo {
                raft_server: address("core-1", 7000),
                catchup_server: address("core-1", 6000),
            },
        );
        core.insert(
            MemberId::new("shared"),
            CoreServerInfo {
                raft_server: address("shared-core", 7000),
                catchup_server: address("shared-core", 6000),
            },
        );

        let mut replicas = HashMap::new();
        replicas.insert(
            MemberId::new("replica-1"),
            ReadReplicaInfo {
                catchup_server: address("replica-1", 6000),
            },
        );
        replicas.insert(
            MemberId::new("shared"),
            ReadReplicaInfo {
                catchup_server: address("shared-replica", 6000),
            },
        );

        ClusterTopology::new(CoreTopology::new(core), ReadReplicaTopology::new(replicas))
    }

    #[test]
    fn finds_core_member() {
        assert_eq!(topology().find(&MemberId::new("core-1")), Some(address("core-1", 6000)));
    }

    #[test]
    fn falls_back_to_read_replicas() {
        assert_eq!(
            topology().find(&MemberId::new("replica-1")),
            Some(address("replica-1", 6000))
        );
    }

    #[test]
    fn core_view_wins() {
        assert_eq!(
            topology().find(&MemberId::new("shared")),
            Some(address("shared-core", 6000))
        );
    }

    #[test]
    fn unknown_member_is_unreachable() {
        assert_eq!(topology().find(&MemberId::new("gone")), None);
        assert_eq!(ClusterTopology::default().find(&MemberId::new("core-1")), None);
    }
}
