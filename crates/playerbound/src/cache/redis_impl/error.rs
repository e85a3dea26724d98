use playerbound_core::cache::CacheError;

/// Network-level failures become `ConnectionFailed`; everything else,
/// including type mismatches such as `INCR` on a non-counter, is an
/// `OperationFailed`.
pub fn map_redis_error(err: redis::RedisError) -> CacheError {
    let network = err.is_connection_refusal() || err.is_timeout() || err.is_connection_dropped();
    if network {
        CacheError::ConnectionFailed(err.to_string())
    } else {
        CacheError::OperationFailed(err.to_string())
    }
}
