use crate::identity::MemberId;
use std::sync::Arc;

/// Election is the role-election collaborator owned by the wider cluster runtime.
pub trait Election: Send + Sync {
    fn demote(&self, member: &MemberId);

    fn perform_role_elections(&self);
}

/// HeartbeatListener is told whenever the heartbeat for a member stops or resumes.
pub trait HeartbeatListener: Send + Sync {
    fn failed(&self, member: &MemberId);

    fn alive(&self, member: &MemberId);
}

/// Demotes members whose heartbeat failed, and re-runs role elections once one comes back.
pub struct HeartbeatReelectionListener {
    logger: slog::Logger,
    election: Arc<dyn Election>,
}

impl HeartbeatReelectionListener {
    pub fn new(logger: slog::Logger, election: Arc<dyn Election>) -> Self {
        HeartbeatReelectionListener { logger, election }
    }
}

impl HeartbeatListener for HeartbeatReelectionListener {
    fn failed(&self, member: &MemberId) {
        slog::warn!(self.logger, "Instance {} is being demoted since it failed", member);
        self.election.demote(member);
    }

    fn alive(&self, _member: &MemberId) {
        self.election.perform_role_elections();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Eq, PartialEq)]
    enum Call {
        Demote(MemberId),
        PerformRoleElections,
    }

    #[derive(Default)]
    struct RecordingElection {
        calls: Mutex<Vec<Call>>,
    }

    impl Election for RecordingElection {
        fn demote(&self, member: &MemberId) {
            self.calls.lock().unwrap().push(Call::Demote(member.clone()));
        }

        fn perform_role_elections(&self) {
            self.calls.lock().unwrap().push(Call::PerformRoleElections);
        }
    }

    fn listener(election: Arc<RecordingElection>) -> HeartbeatReelectionListener {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        HeartbeatReelectionListener::new(logger, election)
    }

    #[test]
    fn failed_member_is_demoted() {
        let election = Arc::new(RecordingElection::default());
        let listener = listener(election.clone());

        listener.failed(&MemberId::new("core-2"));

        assert_eq!(*election.calls.lock().unwrap(), vec![Call::Demote(MemberId::new("core-2"))]);
    }

    #[test]
    fn recovered_member_triggers_elections() {
        let election = Arc::new(RecordingElection::default());
        let listener = listener(election.clone());

        listener.failed(&MemberId::new("core-2"));
        listener.alive(&MemberId::new("core-2"));

        assert_eq!(
            *election.calls.lock().unwrap(),
            vec![Call::Demote(MemberId::new("core-2")), Call::PerformRoleElections]
        );
    }
}
