//! RPC surface: the wire envelopes and the request dispatcher.

mod dispatcher;
mod envelope;

pub use dispatcher::FormDispatcher;
pub use envelope::{
    RpcError, RpcRequest, RpcResponse, APPLICATION_ERROR, INTERNAL_ERROR, INVALID_PARAMS,
    METHOD_NOT_FOUND,
};
