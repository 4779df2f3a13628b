mod catchup;
mod config;
mod consensus;
mod discovery;
mod election;
mod identity;
mod logging;
mod messaging;
mod protocol;
mod server;
mod state_machine;
mod time;
mod wire;

pub use catchup::cancellation;
pub use catchup::CancellationCheck;
pub use catchup::Canceller;
pub use catchup::CatchupClient;
pub use catchup::CatchupClientError;
pub use catchup::CatchupFailure;
pub use catchup::CatchupRequest;
pub use catchup::CatchupResponse;
pub use catchup::ClientCodec;
pub use catchup::CodecError;
pub use catchup::CollectingTxListener;
pub use catchup::CommittedTransaction;
pub use catchup::CoreStateDownloader;
pub use catchup::DirectoryStoreFileStreams;
pub use catchup::DownloadError;
pub use catchup::DownloadOutcome;
pub use catchup::DownloadTarget;
pub use catchup::FileChunk;
pub use catchup::FileHeader;
pub use catchup::GetStoreFileRequest;
pub use catchup::InMemoryStoreFileStreams;
pub use catchup::InterruptListener;
pub use catchup::Interrupter;
pub use catchup::MaximumTotalTime;
pub use catchup::Or;
pub use catchup::PrepareStoreCopyRequest;
pub use catchup::PrepareStoreCopyResponse;
pub use catchup::PrepareStoreCopyStatus;
pub use catchup::RequestMessageType;
pub use catchup::ResponseFrame;
pub use catchup::ResponseMessageType;
pub use catchup::ServerCodec;
pub use catchup::StoreCopyClient;
pub use catchup::StoreCopyFailed;
pub use catchup::StoreCopyFinishedResponse;
pub use catchup::StoreCopyStatus;
pub use catchup::StoreFileStreams;
pub use catchup::TerminationCondition;
pub use catchup::TxPullRequest;
pub use catchup::TxPullResponse;
pub use catchup::TxPullResponseListener;
pub use catchup::TxStreamFinishedResponse;
pub use catchup::TxStreamStatus;
pub use config::CatchupOptions;
pub use config::CatchupOptionsValidated;
pub use consensus::is_quorum;
pub use consensus::is_quorum_of;
pub use consensus::is_quorum_with_min;
pub use consensus::MIN_QUORUM;
pub use discovery::ClusterTopology;
pub use discovery::CoreServerInfo;
pub use discovery::CoreTopology;
pub use discovery::ReadReplicaInfo;
pub use discovery::ReadReplicaTopology;
pub use discovery::StaticTopologyService;
pub use discovery::TopologyService;
pub use election::Election;
pub use election::HeartbeatListener;
pub use election::HeartbeatReelectionListener;
pub use identity::MemberId;
pub use identity::StoreId;
pub use logging::create_root_logger_for_file;
pub use logging::create_root_logger_for_stdout;
pub use messaging::AddressParseError;
pub use messaging::AdvertisedSocketAddress;
pub use messaging::AsyncStream;
pub use messaging::BoxedStream;
pub use messaging::ChannelSettings;
pub use messaging::Connector;
pub use messaging::FixedDelayStrategy;
pub use messaging::ListenAddress;
pub use messaging::MessageDelay;
pub use messaging::NetworkLatencyStrategy;
pub use messaging::NoLatency;
pub use messaging::PortIterator;
pub use messaging::RandomDropStrategy;
pub use messaging::ReconnectingChannel;
pub use messaging::ReconnectingChannels;
pub use messaging::TcpConnector;
pub use protocol::initiate_handshake;
pub use protocol::respond_to_handshake;
pub use protocol::ApplicationProtocol;
pub use protocol::HandshakeError;
pub use protocol::ModifierProtocol;
pub use protocol::PipelineWrapper;
pub use protocol::ProtocolSelection;
pub use protocol::ProtocolStack;
pub use protocol::SupportedProtocols;
pub use protocol::VoidPipelineWrapper;
pub use protocol::CATCHUP_PROTOCOL;
pub use server::shutdown_signal;
pub use server::CatchupServer;
pub use server::CatchupServerError;
pub use server::CatchupServerShutdownHandle;
pub use server::CatchupServerShutdownSignal;
pub use server::InMemoryLocalStore;
pub use server::LocalStore;
pub use server::StoreFile;
pub use server::BASE_TX_ID;
pub use state_machine::CommandIndex;
pub use state_machine::CoreCommand;
pub use state_machine::CoreCommandResult;
pub use state_machine::CoreSnapshot;
pub use state_machine::CoreSnapshotService;
pub use state_machine::CoreStateMachines;
pub use state_machine::DurableStateStorage;
pub use state_machine::InMemoryStateStorage;
pub use state_machine::LockToken;
pub use state_machine::LockTokenRequest;
pub use state_machine::LockTokenState;
pub use state_machine::LockTokenStateMachine;
pub use state_machine::PersistentState;
pub use state_machine::StateMachine;
pub use state_machine::StateStorage;
pub use time::Clock;
pub use time::RealClock;

// Learning 1: `create::{root_mod}` should not have any code. Just `mod` and `pub use` statements.
// Learning 2: All `mod` statements, anywhere, should not be `pub`. Only export `pub` via individual
//             use statements.
//
// This keeps the `crate::{root_mod}` root_mod only responsible for exporting types to the rest of
// crate, and allows me to organize my root_mod impl however I want.
