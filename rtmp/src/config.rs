/// The configuration options that govern the broker's connection setup
/// responses
#[derive(Clone)]
pub struct BrokerConfig {
    pub fms_version: String,
    pub capabilities: f64,
    pub chunk_size: u32,
    pub peer_bandwidth: u32,
    pub window_ack_size: u32,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            fms_version: "FMS/3,0,1,123".to_string(),
            capabilities: 31.0,
            chunk_size: 1480,
            peer_bandwidth: 5_000_000,
            window_ack_size: 5_000_000,
        }
    }
}
