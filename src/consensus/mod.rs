mod quorum;

pub use quorum::is_quorum;
pub use quorum::is_quorum_of;
pub use quorum::is_quorum_with_min;
pub use quorum::MIN_QUORUM;
