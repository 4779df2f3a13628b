mod reelection;

pub use reelection::Election;
pub use reelection::HeartbeatListener;
pub use reelection::HeartbeatReelectionListener;
