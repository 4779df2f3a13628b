mod topology;
mod topology_service;

pub use topology::ClusterTopology;
pub use topology::CoreServerInfo;
pub use topology::CoreTopology;
pub use topology::ReadReplicaInfo;
pub use topology::ReadReplicaTopology;
pub use topology_service::StaticTopologyService;
pub use topology_service::TopologyService;
