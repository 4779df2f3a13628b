mod convert;
mod proto;

pub(crate) use convert::*;
pub(crate) use proto::*;
