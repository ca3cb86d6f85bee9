use reqwest::{Client, ClientBuilder};
use std::time::Duration;

const USER_AGENT: &str = concat!("space_hunter/", env!("CARGO_PKG_VERSION"));

/// Build the pooled client one search source keeps for the whole run.
pub fn create_api_client(timeout: Duration, max_idle_connections: usize) -> reqwest::Result<Client> {
    ClientBuilder::new()
        // Connection pooling - reuse connections across queries
        .pool_max_idle_per_host(max_idle_connections)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .tcp_nodelay(true)

        // Timeouts
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout))

        // Compression
        .gzip(true)
        .brotli(true)

        .use_rustls_tls()
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(USER_AGENT)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = create_api_client(Duration::from_secs(30), 16);
        assert!(client.is_ok());
    }
}
