pub struct WebSocketsServiceConfig {
    ///
    /// Capacity of the per-connection events buffer. Connections that
    /// fall this far behind the broadcast are closed.
    ///
    pub connection_buffer_size: usize,
}
