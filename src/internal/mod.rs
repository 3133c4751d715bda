//! Internal implementation details.

pub(crate) mod release_stack;

pub(crate) use release_stack::ReleaseStack;
