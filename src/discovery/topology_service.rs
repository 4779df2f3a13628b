use crate::discovery::ClusterTopology;
use crate::identity::MemberId;
use crate::messaging::AdvertisedSocketAddress;
use std::sync::Mutex;

/// TopologyService is the local view of discovery: the latest known cluster topology.
pub trait TopologyService: Send + Sync {
    fn cluster_topology(&self) -> ClusterTopology;

    fn find_catchup_address(&self, member: &MemberId) -> Option<AdvertisedSocketAddress> {
        self.cluster_topology().find(member)
    }
}

/// A topology service whose topology is set by hand.
#[derive(Default)]
pub struct StaticTopologyService {
    topology: Mutex<ClusterTopology>,
}

impl StaticTopologyService {
    pub fn new(topology: ClusterTopology) -> Self {
        StaticTopologyService {
            topology: Mutex::new(topology),
        }
    }

    pub fn update(&self, topology: ClusterTopology) {
        *self.topology.lock().expect("StaticTopologyService.update() mutex guard poison") = topology;
    }
}

impl TopologyService for StaticTopologyService {
    fn cluster_topology(&self) -> ClusterTopology {
        self.topology
            .lock()
            .expect("StaticTopologyService.cluster_topology() mutex guard poison")
            .clone()
    }
}
