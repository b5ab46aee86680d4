//! Generated protocol buffer types for the `MatchFunction` service.

pub mod matchfunction {
    tonic::include_proto!("matchfunction");
}

/// Encoded file descriptor set, served through gRPC reflection when enabled.
pub const FILE_DESCRIPTOR_SET: &[u8] =
    tonic::include_file_descriptor_set!("matchfunction_descriptor");
