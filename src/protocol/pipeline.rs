use crate::messaging::BoxedStream;

/// PipelineWrapper is the hook for byte-stream stages, such as encryption, that sit between the
/// socket and the catchup protocol. It is applied to every connection, on both sides, before the
/// protocol handshake.
pub trait PipelineWrapper: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn wrap(&self, stream: BoxedStream) -> BoxedStream {
        stream
    }
}

/// Leaves the stream untouched.
#[derive(Copy, Clone, Debug, Default)]
pub struct VoidPipelineWrapper;

impl PipelineWrapper for VoidPipelineWrapper {
    fn name(&self) -> &str {
        "void"
    }
}
